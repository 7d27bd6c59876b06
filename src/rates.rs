use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Public endpoint queried once per session; base currency is fixed to the
/// storage currency.
const LATEST_RATE_URL: &str = "https://api.exchangerate-api.com/v4/latest/AUD";

/// How many business-day samples the historical chart wants.
pub const SAMPLES_WANTED: usize = 5;

/// Hard cap on calendar days walked backwards before giving up.
pub const MAX_ATTEMPTS: u32 = 60;

#[derive(Debug, Deserialize)]
struct LatestRates {
    rates: BTreeMap<String, Decimal>,
}

/// Fetches the current AUD->VND rate. One shot, no retries: on failure the
/// session simply runs without conversion.
pub fn fetch_latest_rate(client: &reqwest::blocking::Client) -> Result<Decimal> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb.set_message("Fetching exchange rate...");

    let result = request_latest_rate(client);
    pb.finish_and_clear();
    result
}

fn request_latest_rate(client: &reqwest::blocking::Client) -> Result<Decimal> {
    let resp = client
        .get(LATEST_RATE_URL)
        .send()
        .context("Failed to request latest exchange rate")?;

    if !resp.status().is_success() {
        return Err(anyhow!(
            "Exchange rate request failed: HTTP {}",
            resp.status()
        ));
    }

    let parsed: LatestRates = resp.json().context("Invalid exchange rate JSON")?;
    let rate = parsed
        .rates
        .get("VND")
        .copied()
        .ok_or_else(|| anyhow!("Exchange rate response has no VND entry"))?;

    if rate <= Decimal::ZERO {
        return Err(anyhow!("Exchange rate endpoint returned a non-positive rate"));
    }
    Ok(rate)
}

/// A single historical sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatePoint {
    pub date: NaiveDate,
    pub rate: Decimal,
}

/// Where per-day historical rates come from. The API client implements this;
/// tests substitute a fake.
pub trait HistoricalRateSource {
    fn rate_on(&self, from: &str, to: &str, date: NaiveDate) -> Result<Option<Decimal>>;
}

#[derive(Debug)]
pub struct BackfillOutcome {
    /// Collected samples, sorted ascending by date.
    pub points: Vec<RatePoint>,
    /// Calendar days stepped over, weekends included.
    pub attempts: u32,
}

impl BackfillOutcome {
    /// True when the walk hit the attempt cap before filling its quota; the
    /// caller surfaces a single "not enough historical data" warning.
    pub fn exhausted(&self) -> bool {
        self.attempts >= MAX_ATTEMPTS && self.points.len() < SAMPLES_WANTED
    }
}

/// Walks backward from `today`, one calendar day at a time, collecting up to
/// [`SAMPLES_WANTED`] business-day rates. Saturdays and Sundays are stepped
/// over but still count against the attempt cap. A failed or empty single-day
/// lookup is skipped, never fatal. Results come back sorted ascending.
pub fn backfill_history<S: HistoricalRateSource>(
    source: &S,
    from: &str,
    to: &str,
    today: NaiveDate,
) -> BackfillOutcome {
    let mut points: Vec<RatePoint> = Vec::with_capacity(SAMPLES_WANTED);
    let mut current = today;
    let mut attempts = 0u32;

    while points.len() < SAMPLES_WANTED && attempts < MAX_ATTEMPTS {
        current -= Duration::days(1);

        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            match source.rate_on(from, to, current) {
                Ok(Some(rate)) => points.push(RatePoint { date: current, rate }),
                Ok(None) => {}
                Err(err) => {
                    eprintln!("No rate for {current}, skipping: {err:#}");
                }
            }
        }

        attempts += 1;
    }

    points.sort_by_key(|p| p.date);
    BackfillOutcome { points, attempts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::str::FromStr;

    struct FakeSource<F>(RefCell<u32>, F);

    impl<F: Fn(NaiveDate) -> Result<Option<Decimal>>> HistoricalRateSource for FakeSource<F> {
        fn rate_on(&self, _from: &str, _to: &str, date: NaiveDate) -> Result<Option<Decimal>> {
            *self.0.borrow_mut() += 1;
            (self.1)(date)
        }
    }

    fn source<F: Fn(NaiveDate) -> Result<Option<Decimal>>>(f: F) -> FakeSource<F> {
        FakeSource(RefCell::new(0), f)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::from_str(s).unwrap()
    }

    #[test]
    fn collects_five_most_recent_business_days_sorted_ascending() {
        // 2025-06-18 is a Wednesday; walking back hits Tue 17, Mon 16,
        // skips Sun 15 / Sat 14, then Fri 13, Thu 12, Wed 11.
        let src = source(|d| Ok(Some(Decimal::from(d.day()))));
        let outcome = backfill_history(&src, "USD", "VND", date("2025-06-18"));

        let dates: Vec<NaiveDate> = outcome.points.iter().map(|p| p.date).collect();
        assert_eq!(
            dates,
            vec![
                date("2025-06-11"),
                date("2025-06-12"),
                date("2025-06-13"),
                date("2025-06-16"),
                date("2025-06-17"),
            ]
        );
        assert_eq!(outcome.attempts, 7);
        assert!(!outcome.exhausted());
    }

    #[test]
    fn every_day_failing_exhausts_after_exactly_sixty_attempts() {
        let src = source(|_| Err(anyhow!("backend down")));
        let outcome = backfill_history(&src, "USD", "VND", date("2025-06-18"));

        assert!(outcome.points.is_empty());
        assert_eq!(outcome.attempts, MAX_ATTEMPTS);
        assert!(outcome.exhausted());
    }

    #[test]
    fn null_rates_are_skipped_without_counting_as_samples() {
        // Every second business day reports no data.
        let src = source(|d| {
            if d.day() % 2 == 0 {
                Ok(None)
            } else {
                Ok(Some(Decimal::ONE))
            }
        });
        let outcome = backfill_history(&src, "USD", "VND", date("2025-06-18"));
        assert_eq!(outcome.points.len(), SAMPLES_WANTED);
        assert!(outcome.points.iter().all(|p| p.date.day() % 2 == 1));
    }

    #[test]
    fn weekends_are_never_queried_but_count_against_the_cap() {
        let src = source(|d| {
            assert!(!matches!(d.weekday(), Weekday::Sat | Weekday::Sun));
            Ok(None)
        });
        let outcome = backfill_history(&src, "USD", "VND", date("2025-06-18"));
        // 60 calendar days walked, weekdays only queried.
        assert_eq!(outcome.attempts, MAX_ATTEMPTS);
        let queried = *src.0.borrow();
        assert!(queried < MAX_ATTEMPTS);
        assert!(queried > 0);
        assert!(outcome.exhausted());
    }

    #[test]
    fn quota_fills_before_cap_on_a_clean_window() {
        let src = source(|_| Ok(Some(Decimal::TEN)));
        let outcome = backfill_history(&src, "AUD", "VND", date("2025-06-18"));
        assert_eq!(outcome.points.len(), SAMPLES_WANTED);
        assert!(outcome.attempts < 14);
        assert!(!outcome.exhausted());
        let mut sorted = outcome.points.clone();
        sorted.sort_by_key(|p| p.date);
        assert_eq!(sorted, outcome.points);
    }
}
