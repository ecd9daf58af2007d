// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Date-range aggregation over a user's trade entries.
//!
//! Entries are taken in storage order (report, then entry). Entries without
//! an invested date never fall inside a range; unknown amounts count as zero.

use crate::models::TradeEntry;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;

pub const TOP_N: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("'from' date {from} is after 'to' date {to}")]
    InvertedRange { from: NaiveDate, to: NaiveDate },
    #[error("No trades found for the given period")]
    NoTrades,
}

/// Inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, AggregateError> {
        if from > to {
            return Err(AggregateError::InvertedRange { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

fn amount(v: Option<Decimal>) -> Decimal {
    v.unwrap_or(Decimal::ZERO)
}

/// `profit / invested * 100` rounded to 2 dp, `None` when nothing was invested.
pub fn percentage_return(profit: Decimal, invested: Decimal) -> Option<Decimal> {
    if invested.is_zero() {
        None
    } else {
        Some((profit / invested * Decimal::ONE_HUNDRED).round_dp(2))
    }
}

pub fn filter_range<'a>(entries: &'a [TradeEntry], range: &DateRange) -> Vec<&'a TradeEntry> {
    entries
        .iter()
        .filter(|e| e.invested_date.is_some_and(|d| range.contains(d)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_trades: usize,
    pub total_invested: Decimal,
    pub total_current: Decimal,
    pub profit: Decimal,
    pub return_percentage: Option<Decimal>,
}

pub fn summarize(entries: &[TradeEntry], range: &DateRange) -> Summary {
    let filtered = filter_range(entries, range);
    let total_invested: Decimal = filtered.iter().map(|e| amount(e.invested_amount)).sum();
    let total_current: Decimal = filtered.iter().map(|e| amount(e.current_value)).sum();
    let profit = total_current - total_invested;
    Summary {
        total_trades: filtered.len(),
        total_invested,
        total_current,
        profit,
        return_percentage: percentage_return(profit, total_invested),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyProfit {
    pub date: NaiveDate,
    pub profit: Decimal,
}

#[derive(Default, Clone, Copy)]
struct DayTotals {
    invested: Decimal,
    current: Decimal,
}

fn into_series(days: BTreeMap<NaiveDate, DayTotals>) -> Vec<DailyProfit> {
    days.into_iter()
        .map(|(date, t)| DailyProfit {
            date,
            profit: (t.current - t.invested).round_dp(2),
        })
        .collect()
}

/// Per-day `current - invested`, ascending by date.
pub fn profit_by_date(entries: &[TradeEntry], range: &DateRange) -> Vec<DailyProfit> {
    let mut days: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();
    for e in filter_range(entries, range) {
        let Some(date) = e.invested_date else { continue };
        let day = days.entry(date).or_default();
        day.invested += amount(e.invested_amount);
        day.current += amount(e.current_value);
    }
    into_series(days)
}

/// Stock name -> ascending per-day series.
pub fn profit_by_date_per_stock(
    entries: &[TradeEntry],
    range: &DateRange,
) -> BTreeMap<String, Vec<DailyProfit>> {
    let mut stocks: BTreeMap<String, BTreeMap<NaiveDate, DayTotals>> = BTreeMap::new();
    for e in filter_range(entries, range) {
        let Some(date) = e.invested_date else { continue };
        let day = stocks
            .entry(e.stock_name.clone())
            .or_default()
            .entry(date)
            .or_default();
        day.invested += amount(e.invested_amount);
        day.current += amount(e.current_value);
    }
    stocks
        .into_iter()
        .map(|(stock, days)| (stock, into_series(days)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeStats {
    pub stock_name: String,
    pub invested_date: Option<NaiveDate>,
    pub invested_amount: Decimal,
    pub current_value: Decimal,
    pub profit: Decimal,
    pub return_percent: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub summary: Summary,
    pub top_gainers: Vec<TradeStats>,
    pub top_losers: Vec<TradeStats>,
    pub most_successful: Option<TradeStats>,
    pub all_trades: Vec<TradeStats>,
}

fn by_profit_then_name(a: &TradeStats, b: &TradeStats, profit: Ordering) -> Ordering {
    profit.then_with(|| a.stock_name.cmp(&b.stock_name))
}

/// Totals plus rankings. Equal profits are ordered by stock name and then by
/// storage order; gainers and losers are ranked over the same set, so they
/// share entries when fewer than `2 * TOP_N` trades are in range.
pub fn evaluate(entries: &[TradeEntry], range: &DateRange) -> Result<Evaluation, AggregateError> {
    let filtered = filter_range(entries, range);
    if filtered.is_empty() {
        return Err(AggregateError::NoTrades);
    }

    let stats: Vec<TradeStats> = filtered
        .iter()
        .map(|e| {
            let invested = amount(e.invested_amount);
            let current = amount(e.current_value);
            let profit = current - invested;
            TradeStats {
                stock_name: e.stock_name.clone(),
                invested_date: e.invested_date,
                invested_amount: invested,
                current_value: current,
                profit,
                return_percent: percentage_return(profit, invested),
            }
        })
        .collect();

    let mut gainers = stats.clone();
    gainers.sort_by(|a, b| by_profit_then_name(a, b, b.profit.cmp(&a.profit)));
    gainers.truncate(TOP_N);

    let mut losers = stats.clone();
    losers.sort_by(|a, b| by_profit_then_name(a, b, a.profit.cmp(&b.profit)));
    losers.truncate(TOP_N);

    // max_by keeps the last maximum; iterate in reverse so the earliest wins.
    let most_successful = stats
        .iter()
        .rev()
        .filter(|s| s.return_percent.is_some())
        .max_by(|a, b| a.return_percent.cmp(&b.return_percent))
        .cloned();

    Ok(Evaluation {
        summary: summarize(entries, range),
        top_gainers: gainers,
        top_losers: losers,
        most_successful,
        all_trades: stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn trade(name: &str, date: &str, invested: i64, current: i64) -> TradeEntry {
        TradeEntry {
            stock_name: name.to_string(),
            invested_date: Some(d(date)),
            invested_amount: Some(Decimal::from(invested)),
            current_value: Some(Decimal::from(current)),
        }
    }

    fn range(from: &str, to: &str) -> DateRange {
        DateRange::new(d(from), d(to)).unwrap()
    }

    #[test]
    fn two_trade_example_totals() {
        let trades = vec![
            trade("A", "2025-01-01", 1000, 1200),
            trade("B", "2025-01-02", 500, 400),
        ];
        let s = summarize(&trades, &range("2025-01-01", "2025-01-02"));
        assert_eq!(s.total_trades, 2);
        assert_eq!(s.total_invested, Decimal::from(1500));
        assert_eq!(s.total_current, Decimal::from(1600));
        assert_eq!(s.profit, Decimal::from(100));
        assert_eq!(s.return_percentage, Some(Decimal::from_str("6.67").unwrap()));
    }

    #[test]
    fn range_is_inclusive_and_skips_undated_entries() {
        let mut undated = trade("X", "2025-01-01", 10, 20);
        undated.invested_date = None;
        let trades = vec![
            trade("A", "2024-12-31", 1, 1),
            trade("B", "2025-01-01", 100, 110),
            trade("C", "2025-01-31", 100, 90),
            trade("D", "2025-02-01", 1, 1),
            undated,
        ];
        let s = summarize(&trades, &range("2025-01-01", "2025-01-31"));
        assert_eq!(s.total_trades, 2);
        assert_eq!(s.total_invested, Decimal::from(200));
        assert_eq!(s.profit, Decimal::ZERO);
        assert_eq!(s.return_percentage, Some(Decimal::ZERO));
    }

    #[test]
    fn totals_equal_sum_of_filtered_amounts() {
        let mut partial = trade("P", "2025-03-02", 0, 75);
        partial.invested_amount = None;
        let trades = vec![
            trade("A", "2025-03-01", 250, 300),
            partial,
            trade("B", "2025-03-03", 125, 100),
        ];
        let r = range("2025-03-01", "2025-03-31");
        let s = summarize(&trades, &r);
        let filtered = filter_range(&trades, &r);
        let invested: Decimal = filtered
            .iter()
            .map(|e| e.invested_amount.unwrap_or_default())
            .sum();
        let current: Decimal = filtered
            .iter()
            .map(|e| e.current_value.unwrap_or_default())
            .sum();
        assert_eq!(s.total_invested, invested);
        assert_eq!(s.total_current, current);
    }

    #[test]
    fn zero_invested_return_is_not_applicable() {
        let trades = vec![trade("A", "2025-01-01", 0, 50)];
        let s = summarize(&trades, &range("2025-01-01", "2025-01-01"));
        assert_eq!(s.return_percentage, None);

        let empty = summarize(&[], &range("2025-01-01", "2025-01-01"));
        assert_eq!(empty.total_trades, 0);
        assert_eq!(empty.return_percentage, None);
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert_eq!(
            DateRange::new(d("2025-02-01"), d("2025-01-01")),
            Err(AggregateError::InvertedRange {
                from: d("2025-02-01"),
                to: d("2025-01-01")
            })
        );
    }

    #[test]
    fn profit_by_date_groups_and_sorts() {
        let trades = vec![
            trade("B", "2025-01-03", 100, 150),
            trade("A", "2025-01-01", 1000, 1200),
            trade("C", "2025-01-03", 200, 100),
        ];
        let series = profit_by_date(&trades, &range("2025-01-01", "2025-01-31"));
        assert_eq!(
            series,
            vec![
                DailyProfit {
                    date: d("2025-01-01"),
                    profit: Decimal::from(200)
                },
                DailyProfit {
                    date: d("2025-01-03"),
                    profit: Decimal::from(-50)
                },
            ]
        );
    }

    #[test]
    fn profit_by_stock_keeps_independent_series() {
        let trades = vec![
            trade("INFY", "2025-01-02", 100, 110),
            trade("INFY", "2025-01-01", 100, 90),
            trade("INFY", "2025-01-02", 50, 60),
            trade("TCS", "2025-01-01", 10, 30),
        ];
        let by_stock = profit_by_date_per_stock(&trades, &range("2025-01-01", "2025-01-02"));
        assert_eq!(by_stock.len(), 2);
        let infy = &by_stock["INFY"];
        assert_eq!(infy.len(), 2);
        assert_eq!(infy[0].date, d("2025-01-01"));
        assert_eq!(infy[0].profit, Decimal::from(-10));
        assert_eq!(infy[1].profit, Decimal::from(20));
        assert_eq!(by_stock["TCS"][0].profit, Decimal::from(20));
    }

    #[test]
    fn evaluation_with_no_trades_in_range() {
        let trades = vec![trade("A", "2024-01-01", 1, 2)];
        assert_eq!(
            evaluate(&trades, &range("2025-01-01", "2025-12-31")),
            Err(AggregateError::NoTrades)
        );
    }

    #[test]
    fn rankings_overlap_below_six_trades() {
        let trades = vec![
            trade("A", "2025-01-01", 100, 150),
            trade("B", "2025-01-01", 100, 80),
            trade("C", "2025-01-01", 100, 100),
            trade("D", "2025-01-01", 100, 120),
        ];
        let ev = evaluate(&trades, &range("2025-01-01", "2025-01-01")).unwrap();
        let gainers: Vec<&str> = ev.top_gainers.iter().map(|t| t.stock_name.as_str()).collect();
        let losers: Vec<&str> = ev.top_losers.iter().map(|t| t.stock_name.as_str()).collect();
        assert_eq!(gainers, vec!["A", "D", "C"]);
        assert_eq!(losers, vec!["B", "C", "D"]);
        assert!(gainers.iter().any(|g| losers.contains(g)));
        assert_eq!(ev.all_trades.len(), 4);
    }

    #[test]
    fn equal_profits_rank_by_stock_name() {
        let trades = vec![
            trade("ZEEL", "2025-01-01", 100, 110),
            trade("ACC", "2025-01-01", 200, 210),
            trade("MRF", "2025-01-01", 300, 310),
            trade("BEL", "2025-01-01", 400, 410),
        ];
        let ev = evaluate(&trades, &range("2025-01-01", "2025-01-01")).unwrap();
        let gainers: Vec<&str> = ev.top_gainers.iter().map(|t| t.stock_name.as_str()).collect();
        let losers: Vec<&str> = ev.top_losers.iter().map(|t| t.stock_name.as_str()).collect();
        assert_eq!(gainers, vec!["ACC", "BEL", "MRF"]);
        assert_eq!(losers, vec!["ACC", "BEL", "MRF"]);
        // Highest return is ZEEL (10%), despite sorting last by name.
        assert_eq!(ev.most_successful.unwrap().stock_name, "ZEEL");
    }

    #[test]
    fn most_successful_ignores_zero_invested_and_prefers_earliest_tie() {
        let trades = vec![
            trade("FREE", "2025-01-01", 0, 500),
            trade("FIRST", "2025-01-01", 100, 150),
            trade("SECOND", "2025-01-01", 200, 300),
        ];
        let ev = evaluate(&trades, &range("2025-01-01", "2025-01-01")).unwrap();
        assert_eq!(ev.all_trades[0].return_percent, None);
        assert_eq!(ev.most_successful.unwrap().stock_name, "FIRST");
        assert_eq!(ev.summary.total_invested, Decimal::from(300));
        assert_eq!(ev.summary.profit, Decimal::from(650));
    }
}
