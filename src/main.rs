mod api;
mod cli;
mod config;
mod currency;
mod dashboard;
mod domain;
mod notify;
mod rates;
mod rules;

use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, Local, NaiveDate};
use clap::Parser;
use rust_decimal::Decimal;
use std::io::{self, BufRead, Write};
use std::time::Duration;

use crate::api::{ApiClient, ApiError, NewBudget, NewBudgetRule, NewSavingGoal, NewTransaction};
use crate::cli::{
    BudgetCmd, ChallengeCmd, Cli, Command, ConvertArgs, CurrencyCmd, DashboardArgs, GoalCmd,
    LeaderboardArgs, PiggyCmd, RuleCmd, SettingsCmd, TxCmd,
};
use crate::config::{
    AppConfig, AppPaths, Session, app_paths, clear_session, load_or_init_config, load_session,
    load_settings_cache, now_utc, save_session, save_settings_cache, write_config,
};
use crate::currency::{Currency, CurrencySession, to_storage_units};
use crate::domain::{
    AdjustmentKind, BudgetPeriod, Mood, RuleEvent, TransactionKind, theme,
};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let paths = app_paths(cli.home.clone())?;
    let (mut cfg, cfg_path) = load_or_init_config(&paths)?;
    if let Some(url) = cli.api_url {
        // Per-invocation override, never persisted.
        cfg.api_url = url;
    }

    match cli.command {
        Command::Login(args) => handle_login(&paths, &cfg, args),
        Command::Register(args) => handle_register(&paths, &cfg, args),
        Command::Logout => {
            if clear_session(&paths)? {
                println!("Logged out.");
            } else {
                println!("No active session.");
            }
            Ok(())
        }
        Command::Status => handle_status(&paths, &cfg),
        Command::Currency(args) => handle_currency(args.cmd, &mut cfg, &cfg_path),
        Command::Convert(ref args) if args.rate.is_some() => handle_convert_offline(args),
        cmd => {
            let session = require_session(&paths)?;
            let client = ApiClient::new(&cfg.api_url, Some(session.user.token.clone()))?;

            let result = dispatch(cmd, &client, &paths, &cfg, &session);
            if let Err(err) = &result {
                if matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized)) {
                    let _ = clear_session(&paths);
                }
            }
            result
        }
    }
}

fn dispatch(
    cmd: Command,
    client: &ApiClient,
    paths: &AppPaths,
    cfg: &AppConfig,
    session: &Session,
) -> Result<()> {
    match cmd {
        Command::Dashboard(args) => handle_dashboard(client, cfg, args),
        Command::Tx(args) => handle_tx(client, cfg, args.cmd),
        Command::Budget(args) => handle_budget(client, cfg, args.cmd),
        Command::Rule(args) => handle_rule(client, args.cmd),
        Command::Goal(args) => handle_goal(client, cfg, args.cmd),
        Command::Piggy(args) => handle_piggy(client, cfg, args.cmd),
        Command::Challenge(args) => handle_challenge(client, args.cmd),
        Command::Leaderboard(args) => handle_leaderboard(client, session, args),
        Command::Convert(args) => handle_convert(client, args),
        Command::Settings(args) => handle_settings(client, paths, args.cmd),
        // Session-free commands are matched in run().
        _ => unreachable!("command dispatched without a session"),
    }
}

fn require_session(paths: &AppPaths) -> Result<Session> {
    load_session(paths)?.ok_or_else(|| anyhow!("Not logged in. Run: finley login <email>"))
}

fn handle_login(paths: &AppPaths, cfg: &AppConfig, args: cli::LoginArgs) -> Result<()> {
    let client = ApiClient::new(&cfg.api_url, None)?;
    let user = client.login(&args.email, &args.password)?;
    let name = user.name.clone().unwrap_or_else(|| args.email.clone());
    save_session(
        paths,
        &Session {
            user,
            logged_in_at: now_utc(),
        },
    )?;
    println!("Logged in as {name}");
    Ok(())
}

fn handle_register(paths: &AppPaths, cfg: &AppConfig, args: cli::RegisterArgs) -> Result<()> {
    let client = ApiClient::new(&cfg.api_url, None)?;
    let user = client.register(&args.name, &args.email, &args.password)?;
    save_session(
        paths,
        &Session {
            user,
            logged_in_at: now_utc(),
        },
    )?;
    println!("Registered and logged in as {}", args.name);
    Ok(())
}

fn handle_status(paths: &AppPaths, cfg: &AppConfig) -> Result<()> {
    match load_session(paths)? {
        Some(session) => {
            let who = session
                .user
                .name
                .or(session.user.email)
                .unwrap_or_else(|| "(unknown)".to_string());
            println!("Logged in as: {who}");
            println!("Since: {}", session.logged_in_at.to_rfc3339());
        }
        None => println!("Not logged in."),
    }
    println!("Backend: {}", cfg.api_url);
    println!("Display currency: {}", cfg.display_currency.code());

    let cache = load_settings_cache(paths);
    if cache.fetched_at.is_some() {
        println!("Points: {}", cache.snapshot.points);
        let class = theme(&cache.snapshot).class_name();
        if !class.is_empty() {
            println!("Theme: {class}");
        }
    }
    Ok(())
}

fn handle_currency(cmd: CurrencyCmd, cfg: &mut AppConfig, cfg_path: &std::path::Path) -> Result<()> {
    match cmd {
        CurrencyCmd::Toggle => {
            cfg.display_currency = cfg.display_currency.toggled();
            write_config(cfg_path, cfg)?;
            println!("Display currency is now {}", cfg.display_currency.code());
        }
        CurrencyCmd::Status => {
            println!("Display currency: {}", cfg.display_currency.code());
            if cfg.display_currency != currency::STORAGE_CURRENCY {
                println!(
                    "Amounts are stored in {} and converted for display.",
                    currency::STORAGE_CURRENCY.code()
                );
            }
        }
    }
    Ok(())
}

/// Builds the per-run display state. The AUD->VND rate is fetched only when
/// the display currency actually needs it; a failed fetch degrades to AUD
/// with a single warning.
fn currency_session(cfg: &AppConfig) -> CurrencySession {
    let rate = if cfg.display_currency == Currency::Vnd {
        match reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
        {
            Ok(http) => match rates::fetch_latest_rate(&http) {
                Ok(rate) => Some(rate),
                Err(err) => {
                    eprintln!("Exchange rate unavailable, showing AUD: {err:#}");
                    None
                }
            },
            Err(err) => {
                eprintln!("Exchange rate unavailable, showing AUD: {err:#}");
                None
            }
        }
    } else {
        None
    };
    CurrencySession::new(cfg.display_currency, rate)
}

fn handle_dashboard(client: &ApiClient, cfg: &AppConfig, args: DashboardArgs) -> Result<()> {
    let today = Local::now().date_naive();
    let month = args.month.unwrap_or(today.month());
    let year = args.year.unwrap_or(today.year());
    if !(1..=12).contains(&month) {
        return Err(anyhow!("Month must be between 1 and 12, got {month}"));
    }

    let summary = client.dashboard_summary(month, year)?;

    // Enrichment data is best-effort: a failed fetch degrades the view
    // instead of failing the command.
    let budgets = client.budgets().unwrap_or_else(|err| {
        eprintln!("Could not load budgets: {err:#}");
        Vec::new()
    });
    let all_rules = client.budget_rules().unwrap_or_else(|err| {
        eprintln!("Could not load budget rules: {err:#}");
        Vec::new()
    });
    let events = client.calendar_events().unwrap_or_else(|err| {
        eprintln!("Could not load calendar events: {err:#}");
        Vec::new()
    });
    let transactions = client.transactions(1, 50).unwrap_or_else(|err| {
        eprintln!("Could not load transactions: {err:#}");
        Vec::new()
    });
    let categories = client.categories().unwrap_or_else(|err| {
        eprintln!("Could not load categories: {err:#}");
        Vec::new()
    });

    let active = rules::active_rules(&all_rules, &events, today);
    let view = dashboard::build_dashboard(summary, &budgets, &active, transactions, &categories);
    let money = currency_session(cfg);

    println!("Summary for {year}-{month:02}");
    println!("  Income:  {}", money.format(view.income));
    println!("  Expense: {}", money.format(view.expense));
    if view.negative_balance {
        println!("  Balance: {} (negative!)", money.format(view.balance));
    } else {
        println!("  Balance: {}", money.format(view.balance));
    }

    if !view.category_expenses.is_empty() {
        println!();
        println!("Spending by category:");
        let rows: Vec<Vec<String>> = view
            .category_expenses
            .iter()
            .map(|(name, amount)| vec![name.clone(), money.format(*amount)])
            .collect();
        print_table(&["Category", "Spent"], &rows);
    }

    if !view.budgets.is_empty() {
        println!();
        println!("Budgets:");
        let rows: Vec<Vec<String>> = view
            .budgets
            .iter()
            .map(|row| {
                let limit = if row.harvest {
                    match row.harvested {
                        Some(total) => format!("harvested {}", money.format(total)),
                        None => "harvest".to_string(),
                    }
                } else if row.adjusted {
                    format!("{} *", money.format(row.limit))
                } else {
                    money.format(row.limit)
                };
                let used = match row.percent_used {
                    Some(pct) if row.over_limit => format!("{pct}% OVER"),
                    Some(pct) => format!("{pct}%"),
                    None => "-".to_string(),
                };
                vec![
                    row.category_name.clone(),
                    limit,
                    money.format(row.spent),
                    used,
                ]
            })
            .collect();
        print_table(&["Category", "Limit", "Spent", "Used"], &rows);
        if view.budgets.iter().any(|b| b.adjusted) {
            println!("* limit adjusted by an active budget rule");
        }
    }

    if !view.goals.is_empty() {
        println!();
        println!("Goals:");
        for goal in &view.goals {
            let pct = goal
                .progress_percentage
                .map(|p| format!("{}%", p.round_dp(1)))
                .unwrap_or_else(|| "-".to_string());
            println!("  {} ({pct})", goal.name);
        }
    }

    if !view.recent.is_empty() {
        println!();
        println!("Recent transactions:");
        let rows: Vec<Vec<String>> = view
            .recent
            .iter()
            .map(|item| {
                let tx = &item.transaction;
                let signed = match tx.kind {
                    TransactionKind::Income => tx.amount,
                    TransactionKind::Expense => -tx.amount,
                };
                vec![
                    tx.transaction_date.to_string(),
                    item.category_name.clone(),
                    money.format(signed),
                    if item.rule_applied { "*".to_string() } else { String::new() },
                ]
            })
            .collect();
        print_table(&["Date", "Category", "Amount", "Rule"], &rows);
    }

    Ok(())
}

fn handle_tx(client: &ApiClient, cfg: &AppConfig, cmd: TxCmd) -> Result<()> {
    match cmd {
        TxCmd::List { page, page_size } => {
            let txs = client.transactions(page, page_size)?;
            if txs.is_empty() {
                println!("No transactions.");
                return Ok(());
            }
            let money = currency_session(cfg);
            let rows: Vec<Vec<String>> = txs
                .iter()
                .map(|tx| {
                    vec![
                        tx.transaction_id.to_string(),
                        tx.transaction_date.to_string(),
                        match tx.kind {
                            TransactionKind::Income => "income".to_string(),
                            TransactionKind::Expense => "expense".to_string(),
                        },
                        money.format(tx.amount),
                        tx.description.clone().unwrap_or_default(),
                    ]
                })
                .collect();
            print_table(&["Id", "Date", "Type", "Amount", "Note"], &rows);
        }
        TxCmd::Add {
            kind,
            amount,
            category,
            date,
            note,
            as_display,
        } => {
            let kind = parse_kind(&kind)?;
            let mut amount = parse_decimal(amount, "amount")?;
            if amount <= Decimal::ZERO {
                return Err(anyhow!("Amount must be positive"));
            }
            if as_display {
                let money = currency_session(cfg);
                if money.display != currency::STORAGE_CURRENCY && money.rate.is_none() {
                    return Err(anyhow!(
                        "No exchange rate available to convert {} input",
                        money.display.code()
                    ));
                }
                amount = to_storage_units(amount, money.display, money.rate);
            }
            let date = match date {
                Some(raw) => parse_date(&raw)?,
                None => Local::now().date_naive(),
            };
            let created = client.create_transaction(&NewTransaction {
                category_id: category,
                kind,
                amount,
                transaction_date: date,
                description: note,
            })?;
            println!("Added transaction {}", created.transaction_id);
        }
        TxCmd::Edit {
            id,
            kind,
            amount,
            category,
            date,
            note,
        } => {
            let kind = parse_kind(&kind)?;
            let amount = parse_decimal(amount, "amount")?;
            if amount <= Decimal::ZERO {
                return Err(anyhow!("Amount must be positive"));
            }
            let date = parse_date(&date)?;
            let updated = client.update_transaction(
                id,
                &NewTransaction {
                    category_id: category,
                    kind,
                    amount,
                    transaction_date: date,
                    description: note,
                },
            )?;
            println!("Updated transaction {}", updated.transaction_id);
        }
        TxCmd::Rm { id } => {
            client.delete_transaction(id)?;
            println!("Deleted transaction {id}");
        }
    }
    Ok(())
}

fn handle_budget(client: &ApiClient, cfg: &AppConfig, cmd: BudgetCmd) -> Result<()> {
    match cmd {
        BudgetCmd::List => {
            let budgets = client.budgets()?;
            if budgets.is_empty() {
                println!("No budgets.");
                return Ok(());
            }
            let money = currency_session(cfg);
            let rows: Vec<Vec<String>> = budgets
                .iter()
                .map(|b| {
                    vec![
                        b.budget_id.to_string(),
                        b.category_id.to_string(),
                        period_name(b.period).to_string(),
                        if b.is_harvest() {
                            "-".to_string()
                        } else {
                            money.format(b.amount)
                        },
                        b.start_date.to_string(),
                    ]
                })
                .collect();
            print_table(&["Id", "Category", "Period", "Limit", "Start"], &rows);
        }
        BudgetCmd::Create {
            amount,
            category,
            period,
            start,
            end,
        } => {
            let period = parse_period(&period)?;
            // Harvest budgets have no limit; the amount is pinned to zero.
            let amount = if period == BudgetPeriod::PointsHarvest {
                Decimal::ZERO
            } else {
                let parsed = parse_decimal(amount, "amount")?;
                if parsed <= Decimal::ZERO {
                    return Err(anyhow!("Budget amount must be positive"));
                }
                parsed
            };
            let start = match start {
                Some(raw) => parse_date(&raw)?,
                None => Local::now().date_naive(),
            };
            let end = end.as_deref().map(parse_date).transpose()?;
            let created = client.create_budget(&NewBudget {
                category_id: category,
                amount,
                period,
                start_date: start,
                end_date: end,
            })?;
            println!("Created budget {}", created.budget_id);
        }
        BudgetCmd::Update {
            id,
            amount,
            category,
            period,
            start,
            end,
        } => {
            let period = parse_period(&period)?;
            let amount = if period == BudgetPeriod::PointsHarvest {
                Decimal::ZERO
            } else {
                let parsed = parse_decimal(amount, "amount")?;
                if parsed <= Decimal::ZERO {
                    return Err(anyhow!("Budget amount must be positive"));
                }
                parsed
            };
            let start = match start {
                Some(raw) => parse_date(&raw)?,
                None => Local::now().date_naive(),
            };
            let end = end.as_deref().map(parse_date).transpose()?;
            let updated = client.update_budget(
                id,
                &NewBudget {
                    category_id: category,
                    amount,
                    period,
                    start_date: start,
                    end_date: end,
                },
            )?;
            println!("Updated budget {}", updated.budget_id);
        }
        BudgetCmd::Rm { id } => {
            client.delete_budget(id)?;
            println!("Deleted budget {id}");
        }
    }
    Ok(())
}

fn handle_rule(client: &ApiClient, cmd: RuleCmd) -> Result<()> {
    match cmd {
        RuleCmd::List => {
            let all = client.budget_rules()?;
            if all.is_empty() {
                println!("No budget rules.");
                return Ok(());
            }
            let events = client.calendar_events().unwrap_or_else(|err| {
                eprintln!("Could not load calendar events: {err:#}");
                Vec::new()
            });
            let today = Local::now().date_naive();
            let active = rules::active_rules(&all, &events, today);
            let active_ids: Vec<i64> = active.iter().map(|r| r.rule_id).collect();

            let rows: Vec<Vec<String>> = all
                .iter()
                .map(|r| {
                    let window = match (r.start_date, r.end_date) {
                        (Some(s), Some(e)) => format!("{s}..{e}"),
                        _ => "-".to_string(),
                    };
                    let sign = if r.adjustment_value.is_sign_negative() { "" } else { "+" };
                    let delta = match r.adjustment_type {
                        AdjustmentKind::Percentage => format!("{sign}{}%", r.adjustment_value),
                        AdjustmentKind::FixedAmount => format!("{sign}{}", r.adjustment_value),
                    };
                    vec![
                        r.rule_id.to_string(),
                        r.category_id.to_string(),
                        event_name(r.event_type).to_string(),
                        delta,
                        window,
                        if active_ids.contains(&r.rule_id) {
                            "active".to_string()
                        } else {
                            String::new()
                        },
                    ]
                })
                .collect();
            print_table(&["Id", "Category", "Event", "Adjustment", "Window", ""], &rows);
        }
        RuleCmd::Create {
            category,
            event,
            adjustment,
            value,
            start,
            end,
        } => {
            let event = parse_event(&event)?;
            let adjustment = parse_adjustment(&adjustment)?;
            let value = parse_decimal(value, "value")?;

            let (start_date, end_date) = match event {
                RuleEvent::Custom => {
                    let start = start
                        .as_deref()
                        .ok_or_else(|| anyhow!("Custom rules require --start"))?;
                    let end = end
                        .as_deref()
                        .ok_or_else(|| anyhow!("Custom rules require --end"))?;
                    let start = parse_date(start)?;
                    let end = parse_date(end)?;
                    if end < start {
                        return Err(anyhow!("Rule end date is before its start date"));
                    }
                    (Some(start), Some(end))
                }
                _ => {
                    if start.is_some() || end.is_some() {
                        return Err(anyhow!(
                            "Only custom rules take --start/--end; {} rules follow calendar events",
                            event_name(event)
                        ));
                    }
                    (None, None)
                }
            };

            let created = client.create_budget_rule(&NewBudgetRule {
                category_id: category,
                event_type: event,
                adjustment_type: adjustment,
                adjustment_value: value,
                start_date,
                end_date,
            })?;
            println!("Created rule {}", created.rule_id);
        }
        RuleCmd::Rm { id } => {
            client.delete_budget_rule(id)?;
            println!("Deleted rule {id}");
        }
    }
    Ok(())
}

fn handle_goal(client: &ApiClient, cfg: &AppConfig, cmd: GoalCmd) -> Result<()> {
    match cmd {
        GoalCmd::List => {
            let goals = client.saving_goals()?;
            if goals.is_empty() {
                println!("No saving goals.");
                return Ok(());
            }
            let money = currency_session(cfg);
            let rows: Vec<Vec<String>> = goals
                .iter()
                .map(|g| {
                    vec![
                        g.goal_id.to_string(),
                        g.name.clone(),
                        money.format(g.current_amount.unwrap_or(Decimal::ZERO)),
                        money.format(g.target_amount),
                        g.progress_percentage
                            .map(|p| format!("{}%", p.round_dp(1)))
                            .unwrap_or_else(|| "-".to_string()),
                        g.deadline.map(|d| d.to_string()).unwrap_or_default(),
                    ]
                })
                .collect();
            print_table(&["Id", "Name", "Saved", "Target", "Progress", "Deadline"], &rows);
        }
        GoalCmd::Create { name, target, deadline } => {
            let target = parse_decimal(target, "target")?;
            if target <= Decimal::ZERO {
                return Err(anyhow!("Target amount must be positive"));
            }
            let deadline = deadline.as_deref().map(parse_date).transpose()?;
            let created = client.create_saving_goal(&NewSavingGoal {
                name,
                target_amount: target,
                deadline,
            })?;
            println!("Created goal {}", created.goal_id);
        }
        GoalCmd::Deposit { id, amount } => {
            let amount = parse_decimal(amount, "amount")?;
            if amount <= Decimal::ZERO {
                return Err(anyhow!("Deposit amount must be positive"));
            }
            let goal = client.deposit_to_goal(id, amount)?;
            let money = currency_session(cfg);
            println!(
                "Deposited. {} is now at {} of {}",
                goal.name,
                money.format(goal.current_amount.unwrap_or(Decimal::ZERO)),
                money.format(goal.target_amount),
            );
        }
        GoalCmd::Rm { id } => {
            client.delete_saving_goal(id)?;
            println!("Deleted goal {id}");
        }
    }
    Ok(())
}

fn handle_piggy(client: &ApiClient, cfg: &AppConfig, cmd: PiggyCmd) -> Result<()> {
    match cmd {
        PiggyCmd::Status => {
            let piggy = client.piggy_bank()?;
            let money = currency_session(cfg);
            println!("Piggy bank: {}", money.format(piggy.balance));
            if !piggy.decorations.is_empty() {
                println!("Decorations: {}", piggy.decorations.join(", "));
            }
        }
        PiggyCmd::Deposit { amount } => {
            let amount = parse_decimal(amount, "amount")?;
            if amount <= Decimal::ZERO {
                return Err(anyhow!("Deposit amount must be positive"));
            }
            let piggy = client.deposit_to_piggy(amount)?;
            let money = currency_session(cfg);
            println!("Piggy bank is now at {}", money.format(piggy.balance));
        }
    }
    Ok(())
}

fn handle_challenge(client: &ApiClient, cmd: ChallengeCmd) -> Result<()> {
    match cmd {
        ChallengeCmd::List => {
            let challenges = client.user_challenges()?;
            if challenges.is_empty() {
                println!("No challenges yet. Try: finley challenge draw");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = challenges
                .iter()
                .map(|uc| {
                    let (title, points) = match &uc.challenge {
                        Some(c) => (c.title.clone(), c.reward_points.to_string()),
                        None => ("(unknown)".to_string(), "-".to_string()),
                    };
                    vec![
                        uc.user_challenge_id.to_string(),
                        title,
                        points,
                        format!("{:?}", uc.status).to_lowercase(),
                    ]
                })
                .collect();
            print_table(&["Id", "Challenge", "Points", "Status"], &rows);
        }
        ChallengeCmd::Draw => {
            let challenge = client.random_challenge()?;
            println!(
                "{} ({} pts)",
                challenge.title, challenge.reward_points
            );
            if let Some(desc) = &challenge.description {
                println!("{desc}");
            }
            println!("Start it with: finley challenge start {}", challenge.challenge_id);
        }
        ChallengeCmd::Start { id } => {
            let uc = client.start_challenge(id)?;
            println!("Started challenge (entry {})", uc.user_challenge_id);
        }
        ChallengeCmd::Complete { id } => {
            let response = client.complete_challenge(id)?;
            match response.get("message").and_then(|m| m.as_str()) {
                Some(message) => println!("{message}"),
                None => println!("Challenge {id} completed."),
            }
        }
        ChallengeCmd::Rm { id } => {
            client.delete_challenge(id)?;
            println!("Deleted challenge entry {id}");
        }
        ChallengeCmd::Watch { interval, checks } => {
            watch_challenges(client, Duration::from_secs(interval.max(1)), checks)?;
        }
    }
    Ok(())
}

fn watch_challenges(client: &ApiClient, interval: Duration, checks: Option<u32>) -> Result<()> {
    // Prime once so a backend problem fails fast instead of inside the thread.
    let initial = client.user_challenges()?;
    println!(
        "{} pending challenge(s). Watching every {}s...",
        notify::pending_count(&initial),
        interval.as_secs()
    );

    let worker_client = client.clone();
    let watcher = notify::ChallengeWatcher::spawn(
        move || worker_client.user_challenges().map_err(Into::into),
        |pending| {
            println!("Pending challenges: {pending}");
        },
        interval,
        checks,
    );

    match checks {
        Some(_) => watcher.wait(),
        None => {
            println!("Press Enter to stop.");
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            watcher.stop();
        }
    }
    println!("Stopped watching.");
    Ok(())
}

fn handle_leaderboard(client: &ApiClient, session: &Session, args: LeaderboardArgs) -> Result<()> {
    match args.history {
        Some(user_id) => {
            let history = client.leaderboard_history(user_id)?;
            if history.is_empty() {
                println!("No history for user {user_id}.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = history
                .iter()
                .map(|e| vec![e.name.clone(), e.points.to_string()])
                .collect();
            print_table(&["Entry", "Points"], &rows);
        }
        None => {
            let standings = client.leaderboard()?;
            if standings.is_empty() {
                println!("Leaderboard is empty.");
                return Ok(());
            }
            let me = session.user.user_id;
            let rows: Vec<Vec<String>> = standings
                .iter()
                .enumerate()
                .map(|(i, e)| {
                    let marker = if me == Some(e.user_id) { "<- you" } else { "" };
                    vec![
                        (i + 1).to_string(),
                        e.name.clone(),
                        e.points.to_string(),
                        marker.to_string(),
                    ]
                })
                .collect();
            print_table(&["Rank", "Name", "Points", ""], &rows);
        }
    }
    Ok(())
}

fn handle_convert_offline(args: &ConvertArgs) -> Result<()> {
    if args.history || args.chart {
        return Err(anyhow!("--rate only applies to a direct conversion"));
    }
    let amount = parse_decimal(args.amount.clone(), "amount")?;
    let rate = parse_decimal(args.rate.clone().unwrap_or_default(), "rate")?;
    if rate <= Decimal::ZERO {
        return Err(anyhow!("Rate must be positive"));
    }
    let result = (amount * rate).round_dp(2);
    println!(
        "{} {} = {:.2} {} (rate {})",
        amount,
        args.from.to_uppercase(),
        result,
        args.to.to_uppercase(),
        rate
    );
    Ok(())
}

fn handle_convert(client: &ApiClient, args: ConvertArgs) -> Result<()> {
    if args.history {
        let history = client.conversion_history()?;
        if history.is_empty() {
            println!("No conversions yet.");
            return Ok(());
        }
        // Most recent five, like the converter page.
        let rows: Vec<Vec<String>> = history
            .iter()
            .take(5)
            .map(|c| {
                vec![
                    c.conversion_date.format("%Y-%m-%d %H:%M").to_string(),
                    format!("{} {}", c.amount, c.from_currency),
                    format!("{} {}", c.result, c.to_currency),
                ]
            })
            .collect();
        print_table(&["When", "From", "To"], &rows);
        return Ok(());
    }

    if args.chart {
        let today = Local::now().date_naive();
        let from = args.from.to_uppercase();
        let to = args.to.to_uppercase();
        let outcome = rates::backfill_history(client, &from, &to, today);
        if outcome.exhausted() {
            eprintln!("Not enough historical data for {from}->{to}.");
        }
        if outcome.points.is_empty() {
            println!("No rates to chart.");
            return Ok(());
        }
        let rows: Vec<Vec<String>> = outcome
            .points
            .iter()
            .map(|p| vec![p.date.to_string(), p.rate.to_string()])
            .collect();
        print_table(&["Date", &format!("{from}->{to}")], &rows);
        return Ok(());
    }

    let amount = parse_decimal(args.amount, "amount")?;
    let outcome = client.convert_currency(&args.from.to_uppercase(), &args.to.to_uppercase(), amount)?;
    println!(
        "{} {} = {} {}",
        outcome.amount, outcome.from, outcome.result, outcome.to
    );
    Ok(())
}

fn handle_settings(client: &ApiClient, paths: &AppPaths, cmd: SettingsCmd) -> Result<()> {
    match cmd {
        SettingsCmd::Show => {
            let snapshot = client.settings()?;
            save_settings_cache(
                paths,
                &config::SettingsCache {
                    snapshot: snapshot.clone(),
                    fetched_at: Some(now_utc()),
                },
            )?;

            println!("Points: {}", snapshot.points);
            if !snapshot.badges.is_empty() {
                println!("Badges: {}", snapshot.badges.join(", "));
            }
            println!(
                "Mood theme: {}",
                if snapshot.mood_based_theme { "on" } else { "off" }
            );
            let class = theme(&snapshot).class_name();
            if !class.is_empty() {
                println!("Theme: {class}");
            }
        }
        SettingsCmd::Theme { mood_based, mood } => {
            let current = client.settings()?;
            let mood = mood.as_deref().map(parse_mood).transpose()?;
            let update = api::SettingsUpdate {
                mood_based_theme: mood_based.unwrap_or(current.mood_based_theme),
                current_mood: mood.or(current.current_mood),
            };
            let snapshot = client.update_settings(&update)?;
            save_settings_cache(
                paths,
                &config::SettingsCache {
                    snapshot: snapshot.clone(),
                    fetched_at: Some(now_utc()),
                },
            )?;
            let class = theme(&snapshot).class_name();
            if class.is_empty() {
                println!("Theme: default");
            } else {
                println!("Theme: {class}");
            }
        }
        SettingsCmd::ConvertPoints { points } => {
            if points < 100 {
                return Err(anyhow!("At least 100 points are required"));
            }
            if points % 100 != 0 {
                return Err(anyhow!("Points must be a multiple of 100"));
            }
            let response = client.convert_points(points)?;
            match response.get("message").and_then(|m| m.as_str()) {
                Some(message) => println!("{message}"),
                None => println!("Converted {points} points."),
            }
        }
        SettingsCmd::Export => {
            let data = client.export_data()?;
            let json = serde_json::to_string_pretty(&data)?;
            let mut stdout = io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
        SettingsCmd::Category { add, kind } => match add {
            Some(name) => {
                let kind = parse_kind(&kind)?;
                let created = client.create_category(&name, kind)?;
                println!("Created category {} ({})", created.category_id, created.name);
            }
            None => {
                let categories = client.categories()?;
                if categories.is_empty() {
                    println!("No categories.");
                    return Ok(());
                }
                let rows: Vec<Vec<String>> = categories
                    .iter()
                    .map(|c| {
                        vec![
                            c.category_id.to_string(),
                            c.name.clone(),
                            match c.kind {
                                TransactionKind::Income => "income".to_string(),
                                TransactionKind::Expense => "expense".to_string(),
                            },
                        ]
                    })
                    .collect();
                print_table(&["Id", "Name", "Type"], &rows);
            }
        },
    }
    Ok(())
}

fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if headers.is_empty() {
        println!("(no columns)");
        return;
    }

    let cols = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();

    for row in rows {
        for (i, cell) in row.iter().take(cols).enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    fn print_row(cells: &[String], widths: &[usize]) {
        print!("|");
        for (i, w) in widths.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            print!(" {:width$} |", cell, width = *w);
        }
        println!();
    }

    fn print_sep(widths: &[usize]) {
        print!("|");
        for w in widths {
            print!("{}|", "-".repeat(w + 2));
        }
        println!();
    }

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    print_row(&header_cells, &widths);
    print_sep(&widths);
    for row in rows {
        print_row(row, &widths);
    }
}

fn parse_decimal(raw: String, field: &'static str) -> Result<Decimal> {
    raw.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal for {field}: {raw}"))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid date (expected YYYY-MM-DD): {raw}"))
}

fn parse_kind(raw: &str) -> Result<TransactionKind> {
    match raw.to_ascii_lowercase().as_str() {
        "income" => Ok(TransactionKind::Income),
        "expense" => Ok(TransactionKind::Expense),
        other => Err(anyhow!("Unknown type '{other}' (expected income or expense)")),
    }
}

fn parse_period(raw: &str) -> Result<BudgetPeriod> {
    match raw.to_ascii_lowercase().as_str() {
        "weekly" => Ok(BudgetPeriod::Weekly),
        "monthly" => Ok(BudgetPeriod::Monthly),
        "yearly" => Ok(BudgetPeriod::Yearly),
        "points_harvest" | "harvest" => Ok(BudgetPeriod::PointsHarvest),
        other => Err(anyhow!(
            "Unknown period '{other}' (expected weekly, monthly, yearly or points_harvest)"
        )),
    }
}

fn parse_event(raw: &str) -> Result<RuleEvent> {
    match raw.to_ascii_lowercase().as_str() {
        "exam_week" | "exam" => Ok(RuleEvent::ExamWeek),
        "summer_break" | "summer" => Ok(RuleEvent::SummerBreak),
        "custom" => Ok(RuleEvent::Custom),
        other => Err(anyhow!(
            "Unknown event '{other}' (expected exam_week, summer_break or custom)"
        )),
    }
}

fn parse_adjustment(raw: &str) -> Result<AdjustmentKind> {
    match raw.to_ascii_lowercase().as_str() {
        "percentage" | "percent" => Ok(AdjustmentKind::Percentage),
        "fixed_amount" | "fixed" => Ok(AdjustmentKind::FixedAmount),
        other => Err(anyhow!(
            "Unknown adjustment '{other}' (expected percentage or fixed_amount)"
        )),
    }
}

fn parse_mood(raw: &str) -> Result<Mood> {
    match raw.to_ascii_lowercase().as_str() {
        "happy" => Ok(Mood::Happy),
        "sad" => Ok(Mood::Sad),
        "productive" => Ok(Mood::Productive),
        "relaxed" => Ok(Mood::Relaxed),
        other => Err(anyhow!(
            "Unknown mood '{other}' (expected happy, sad, productive or relaxed)"
        )),
    }
}

fn period_name(period: BudgetPeriod) -> &'static str {
    match period {
        BudgetPeriod::Weekly => "weekly",
        BudgetPeriod::Monthly => "monthly",
        BudgetPeriod::Yearly => "yearly",
        BudgetPeriod::PointsHarvest => "harvest",
    }
}

fn event_name(event: RuleEvent) -> &'static str {
    match event {
        RuleEvent::ExamWeek => "exam_week",
        RuleEvent::SummerBreak => "summer_break",
        RuleEvent::Custom => "custom",
    }
}
