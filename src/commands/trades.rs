// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::required;
use crate::aggregate::{self, DateRange};
use crate::models::TradeEntry;
use crate::store;
use crate::utils::{
    fmt_money, fmt_percent, fmt_signed_money, maybe_print_json, parse_date,
    pretty_table, NOT_AVAILABLE,
};
use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(conn, sub)?,
        Some(("by-date", sub)) => by_date(conn, sub)?,
        Some(("by-stock", sub)) => by_stock(conn, sub)?,
        Some(("evaluate", sub)) => evaluate(conn, sub)?,
        Some(("export", sub)) => export(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn user_entries(conn: &Connection, email: &str) -> Result<Vec<TradeEntry>> {
    let email = email.trim().to_lowercase();
    let user = store::find_user(conn, &email)?
        .with_context(|| format!("Unknown user '{}'", email))?;
    store::load_trade_entries(conn, user.id)
}

fn load(conn: &Connection, sub: &clap::ArgMatches) -> Result<(Vec<TradeEntry>, DateRange)> {
    let from = parse_date(required(sub, "from")?)?;
    let to = parse_date(required(sub, "to")?)?;
    let range = DateRange::new(from, to)?;
    let entries = user_entries(conn, required(sub, "email")?)?;
    Ok((entries, range))
}

fn summary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (entries, range) = load(conn, sub)?;
    let s = aggregate::summarize(&entries, &range);
    if !maybe_print_json(sub.get_flag("json"), &s)? {
        let rows = vec![
            vec!["Trades".into(), s.total_trades.to_string()],
            vec!["Invested".into(), fmt_money(&s.total_invested)],
            vec!["Current value".into(), fmt_money(&s.total_current)],
            vec!["Profit".into(), fmt_signed_money(&s.profit)],
            vec!["Return".into(), fmt_percent(s.return_percentage)],
        ];
        println!("{}", pretty_table(&["Metric", "Value"], rows));
    }
    Ok(())
}

fn by_date(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (entries, range) = load(conn, sub)?;
    let series = aggregate::profit_by_date(&entries, &range);
    if !maybe_print_json(sub.get_flag("json"), &series)? {
        let rows = series
            .iter()
            .map(|p| vec![p.date.to_string(), fmt_signed_money(&p.profit)])
            .collect();
        println!("{}", pretty_table(&["Date", "Profit"], rows));
    }
    Ok(())
}

fn by_stock(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (entries, range) = load(conn, sub)?;
    let per_stock = aggregate::profit_by_date_per_stock(&entries, &range);
    if !maybe_print_json(sub.get_flag("json"), &per_stock)? {
        let rows = per_stock
            .iter()
            .flat_map(|(stock, series)| {
                series.iter().map(move |p| {
                    vec![stock.clone(), p.date.to_string(), fmt_signed_money(&p.profit)]
                })
            })
            .collect();
        println!("{}", pretty_table(&["Stock", "Date", "Profit"], rows));
    }
    Ok(())
}

fn stats_rows(stats: &[aggregate::TradeStats]) -> Vec<Vec<String>> {
    stats
        .iter()
        .map(|t| {
            vec![
                t.stock_name.clone(),
                t.invested_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| NOT_AVAILABLE.into()),
                fmt_signed_money(&t.profit),
                fmt_percent(t.return_percent),
            ]
        })
        .collect()
}

fn evaluate(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (entries, range) = load(conn, sub)?;
    let eval = aggregate::evaluate(&entries, &range)?;
    if maybe_print_json(sub.get_flag("json"), &eval)? {
        return Ok(());
    }
    let headers = ["Stock", "Date", "Profit", "Return"];
    println!(
        "{} trades, invested {}, now {}, return {}",
        eval.summary.total_trades,
        fmt_money(&eval.summary.total_invested),
        fmt_money(&eval.summary.total_current),
        fmt_percent(eval.summary.return_percentage)
    );
    println!("Top gainers\n{}", pretty_table(&headers, stats_rows(&eval.top_gainers)));
    println!("Top losers\n{}", pretty_table(&headers, stats_rows(&eval.top_losers)));
    match &eval.most_successful {
        Some(best) => println!(
            "Most successful: {} ({})",
            best.stock_name,
            fmt_percent(best.return_percent)
        ),
        None => println!("Most successful: {}", NOT_AVAILABLE),
    }
    Ok(())
}

fn export(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let entries = user_entries(conn, required(sub, "email")?)?;
    let fmt = required(sub, "format")?.to_lowercase();
    let out = required(sub, "out")?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "stock_name",
                "invested_date",
                "invested_amount",
                "current_value",
                "profit_or_loss",
            ])?;
            for e in &entries {
                wtr.write_record([
                    e.stock_name.clone(),
                    e.invested_date.map(|d| d.to_string()).unwrap_or_default(),
                    e.invested_amount.map(|d| d.to_string()).unwrap_or_default(),
                    e.current_value.map(|d| d.to_string()).unwrap_or_default(),
                    e.profit_or_loss().map(|d| d.to_string()).unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            std::fs::write(out, serde_json::to_string_pretty(&entries)?)
                .with_context(|| format!("Write {}", out))?;
        }
        other => return Err(anyhow!("Unknown format: {} (use csv|json)", other)),
    }
    println!("Exported {} trade entries to {}", entries.len(), out);
    Ok(())
}
