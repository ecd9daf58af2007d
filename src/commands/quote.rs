// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::required;
use crate::market::{normalize_symbol, QuoteProvider};
use crate::utils::{maybe_print_json, parse_date, pretty_table, NOT_AVAILABLE};
use anyhow::{bail, Result};

fn opt(v: Option<f64>) -> String {
    v.map(|x| format!("{:.2}", x))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub async fn handle(market: &dyn QuoteProvider, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("get", sub)) => get(market, sub).await?,
        Some(("history", sub)) => history(market, sub).await?,
        _ => {}
    }
    Ok(())
}

async fn get(market: &dyn QuoteProvider, sub: &clap::ArgMatches) -> Result<()> {
    let symbols: Vec<String> = sub
        .get_many::<String>("symbols")
        .map(|vals| vals.map(|s| normalize_symbol(s)).collect())
        .unwrap_or_default();
    let quotes = market.quotes(&symbols).await?;
    if !maybe_print_json(sub.get_flag("json"), &quotes)? {
        let rows = quotes
            .iter()
            .map(|q| {
                vec![
                    q.symbol.clone(),
                    q.display_name(),
                    opt(q.regular_market_price),
                    opt(q.regular_market_change),
                    opt(q.regular_market_change_percent),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Symbol", "Name", "Price", "Change", "Change %"], rows)
        );
    }
    let missing: Vec<&String> = symbols
        .iter()
        .filter(|s| !quotes.iter().any(|q| q.symbol.eq_ignore_ascii_case(s)))
        .collect();
    for s in missing {
        eprintln!("No quote for {}", s);
    }
    Ok(())
}

async fn history(market: &dyn QuoteProvider, sub: &clap::ArgMatches) -> Result<()> {
    let symbol = normalize_symbol(required(sub, "symbol")?);
    let from = parse_date(required(sub, "from")?)?;
    let to = parse_date(required(sub, "to")?)?;
    if from > to {
        bail!("--from {} is after --to {}", from, to);
    }
    let points = market.history(&symbol, from, to).await?;
    if points.is_empty() {
        bail!("No chart data found for symbol: {}", symbol);
    }
    if !maybe_print_json(sub.get_flag("json"), &points)? {
        let rows = points
            .iter()
            .map(|p| vec![p.date.to_string(), format!("{:.2}", p.price)])
            .collect();
        println!("{}", pretty_table(&["Date", "Close"], rows));
    }
    Ok(())
}
