use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The two currencies the app renders. Amounts are stored in AUD everywhere;
/// VND is a display-time conversion only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "AUD")]
    Aud,
    #[serde(rename = "VND")]
    Vnd,
}

/// The unit amounts are persisted in on the backend.
pub const STORAGE_CURRENCY: Currency = Currency::Aud;

impl Default for Currency {
    fn default() -> Self {
        Currency::Vnd
    }
}

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Currency::Aud => "AUD",
            Currency::Vnd => "VND",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "AUD" => Some(Currency::Aud),
            "VND" => Some(Currency::Vnd),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Currency::Aud => Currency::Vnd,
            Currency::Vnd => Currency::Aud,
        }
    }
}

/// Per-session display state: the chosen display currency and the AUD->VND
/// rate fetched once at startup. `rate = None` means the fetch failed and
/// amounts render unconverted in AUD for the rest of the session.
#[derive(Debug, Clone)]
pub struct CurrencySession {
    pub display: Currency,
    pub rate: Option<Decimal>,
}

impl CurrencySession {
    pub fn new(display: Currency, rate: Option<Decimal>) -> Self {
        // A non-positive rate is as useless as a missing one.
        let rate = rate.filter(|r| *r > Decimal::ZERO);
        Self { display, rate }
    }

    /// Flips AUD <-> VND. Pure state change, no network.
    pub fn toggle(&mut self) {
        self.display = self.display.toggled();
    }

    pub fn format(&self, amount: Decimal) -> String {
        format_amount(amount, self.display, self.rate)
    }
}

/// Converts a stored (AUD) amount into the display currency's units.
pub fn to_display_units(amount: Decimal, display: Currency, rate: Option<Decimal>) -> Decimal {
    match (display, rate) {
        (Currency::Vnd, Some(rate)) if rate > Decimal::ZERO => amount * rate,
        _ => amount,
    }
}

/// Inverse of [`to_display_units`], used when user input arrives in the
/// display currency.
pub fn to_storage_units(amount: Decimal, display: Currency, rate: Option<Decimal>) -> Decimal {
    match (display, rate) {
        (Currency::Vnd, Some(rate)) if rate > Decimal::ZERO => amount / rate,
        _ => amount,
    }
}

/// Formats a stored amount for display. With no usable rate the amount stays
/// in AUD regardless of the requested display currency; this function never
/// fails.
pub fn format_amount(amount: Decimal, display: Currency, rate: Option<Decimal>) -> String {
    let usable_rate = rate.filter(|r| *r > Decimal::ZERO);
    match (display, usable_rate) {
        (Currency::Vnd, Some(rate)) => format_vnd(amount * rate),
        _ => format_aud(amount),
    }
}

fn format_aud(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let negative = rounded.is_sign_negative();
    let abs = rounded.abs();
    let raw = format!("{:.2}", abs);
    let (int_part, frac_part) = raw.split_once('.').unwrap_or((raw.as_str(), "00"));
    let grouped = group_thousands(int_part, ',');
    if negative {
        format!("-A${grouped}.{frac_part}")
    } else {
        format!("A${grouped}.{frac_part}")
    }
}

fn format_vnd(amount: Decimal) -> String {
    let rounded = amount.round_dp(0);
    let negative = rounded.is_sign_negative();
    let grouped = group_thousands(&rounded.abs().to_string(), '.');
    if negative {
        format!("-{grouped} ₫")
    } else {
        format!("{grouped} ₫")
    }
}

fn group_thousands(digits: &str, sep: char) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let len = digits.len();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn storage_currency_formats_identically_with_or_without_rate() {
        let amount = dec("100");
        let with_rate = format_amount(amount, Currency::Aud, Some(dec("16500")));
        let without_rate = format_amount(amount, Currency::Aud, None);
        assert_eq!(with_rate, without_rate);
        assert_eq!(with_rate, "A$100.00");
    }

    #[test]
    fn missing_rate_falls_back_to_storage_formatting() {
        assert_eq!(format_amount(dec("42.5"), Currency::Vnd, None), "A$42.50");
    }

    #[test]
    fn non_positive_rate_is_treated_as_missing() {
        assert_eq!(
            format_amount(dec("10"), Currency::Vnd, Some(Decimal::ZERO)),
            "A$10.00"
        );
        assert_eq!(
            format_amount(dec("10"), Currency::Vnd, Some(dec("-3"))),
            "A$10.00"
        );
    }

    #[test]
    fn vnd_display_multiplies_by_rate_and_groups_with_dots() {
        let out = format_amount(dec("2"), Currency::Vnd, Some(dec("16500")));
        assert_eq!(out, "33.000 ₫");
    }

    #[test]
    fn negative_amounts_keep_the_sign_outside_the_symbol() {
        assert_eq!(format_amount(dec("-1234.5"), Currency::Aud, None), "-A$1,234.50");
        assert_eq!(
            format_amount(dec("-2"), Currency::Vnd, Some(dec("16500"))),
            "-33.000 ₫"
        );
    }

    #[test]
    fn display_conversion_round_trips_within_tolerance() {
        let rates = ["0.5", "1", "16500", "17234.56"];
        let amount = dec("123.45");
        for raw in rates {
            let rate = Some(dec(raw));
            let there = to_display_units(amount, Currency::Vnd, rate);
            let back = to_storage_units(there, Currency::Vnd, rate);
            let drift = (back - amount).abs();
            assert!(drift < dec("0.000001"), "rate {raw}: drift {drift}");
        }
    }

    #[test]
    fn toggle_flips_between_exactly_two_currencies() {
        let mut session = CurrencySession::new(Currency::Vnd, Some(dec("16000")));
        session.toggle();
        assert_eq!(session.display, Currency::Aud);
        session.toggle();
        assert_eq!(session.display, Currency::Vnd);
    }

    #[test]
    fn session_drops_unusable_rates_on_construction() {
        let session = CurrencySession::new(Currency::Vnd, Some(Decimal::ZERO));
        assert!(session.rate.is_none());
        assert_eq!(session.format(dec("5")), "A$5.00");
    }
}
