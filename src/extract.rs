// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Turns free-form AI output into typed holdings.
//!
//! Two shapes come back from the model: a JSON array of trades (possibly
//! wrapped in a ```` ```json ```` fence) and an 8-section advisory report
//! whose last section is a markdown table of assets.

use crate::models::{ReportAsset, TradeEntry};
use crate::utils::{
    fmt_optional_money, fmt_signed_money, parse_currency, parse_loose_date, NOT_AVAILABLE,
};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("AI response did not contain a JSON array")]
    NoJson,
    #[error("AI response contained invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("AI response did not follow the report template")]
    NoSections,
}

static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```json(.*?)```").expect("valid regex"));
static JSON_ARRAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*\]").expect("valid regex"));

static SECTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^1\.\s*\*.*Summary.*Portfolio.*\*",
        r"(?i)^2\.\s*\*.*Goal.*Alignment.*Grade.*\*",
        r"(?i)^3\.\s*\*.*Goal.*Alignment.*Percentage.*\*",
        r"(?i)^4\.\s*\*.*Risk.*Meter.*\*",
        r"(?i)^5\.\s*\*.*Estimated.*5.*Year.*Return.*\*",
        r"(?i)^6\.\s*\*.*Where.*Strong.*\*",
        r"(?i)^7\.\s*\*.*Where.*Improve.*\*",
        r"(?i)^8\.\s*\*.*Asset.*Allocation.*Breakdown.*\*",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});
static ASSET_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^8\.\s*\*Asset\s*Allocation\s*Breakdown\*").expect("valid regex"));
static ANY_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d\.\s*\*").expect("valid regex"));

/// Body of the first ```` ```json ```` fence, else the widest `[...]` span.
pub fn extract_json_block(raw: &str) -> Option<&str> {
    if let Some(inner) = JSON_FENCE.captures(raw).and_then(|c| c.get(1)) {
        let trimmed = inner.as_str().trim();
        if !trimmed.is_empty() {
            return Some(trimmed);
        }
    }
    JSON_ARRAY.find(raw).map(|m| m.as_str())
}

/// Raw trade row as the model writes it. Accepts the display keys from the
/// extraction prompt and the canonical camelCase keys the API returns.
#[derive(Debug, Default, Deserialize)]
pub struct RawTradeRow {
    #[serde(rename = "stockName", alias = "Stock Name", alias = "name", default)]
    pub stock_name: Option<String>,
    #[serde(
        rename = "investedDate",
        alias = "Invested Date",
        alias = "date",
        default,
        deserialize_with = "de_loose_date"
    )]
    pub invested_date: Option<NaiveDate>,
    #[serde(
        rename = "investedAmount",
        alias = "Invested Amount",
        default,
        deserialize_with = "de_amount"
    )]
    pub invested_amount: Option<Decimal>,
    #[serde(
        rename = "currentValue",
        alias = "Current Value",
        default,
        deserialize_with = "de_amount"
    )]
    pub current_value: Option<Decimal>,
}

impl From<RawTradeRow> for TradeEntry {
    fn from(row: RawTradeRow) -> Self {
        let stock_name = row
            .stock_name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());
        TradeEntry {
            stock_name,
            invested_date: row.invested_date,
            invested_amount: row.invested_amount,
            current_value: row.current_value,
        }
    }
}

/// Display form of a trade, shown for review before it is saved. Its keys
/// match the extraction prompt so it can be posted back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayTrade {
    #[serde(rename = "Stock Name")]
    pub stock_name: String,
    #[serde(rename = "Invested Date")]
    pub invested_date: String,
    #[serde(rename = "Invested Amount")]
    pub invested_amount: String,
    #[serde(rename = "Current Value")]
    pub current_value: String,
    #[serde(rename = "Profit or Loss")]
    pub profit_or_loss: String,
}

impl From<&TradeEntry> for DisplayTrade {
    fn from(e: &TradeEntry) -> Self {
        DisplayTrade {
            stock_name: e.stock_name.clone(),
            invested_date: e
                .invested_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            invested_amount: fmt_optional_money(e.invested_amount),
            current_value: fmt_optional_money(e.current_value),
            profit_or_loss: e
                .profit_or_loss()
                .map(|p| fmt_signed_money(&p))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        }
    }
}

fn de_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    Ok(match v {
        Value::String(s) => parse_currency(&s),
        Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
        _ => None,
    })
}

fn de_loose_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    Ok(match v {
        Value::String(s) => parse_loose_date(&s),
        _ => None,
    })
}

/// Parse already-isolated JSON text into trade entries.
pub fn trades_from_json(json: &str) -> Result<Vec<TradeEntry>, ExtractError> {
    let rows: Vec<RawTradeRow> = serde_json::from_str(json)?;
    Ok(rows.into_iter().map(TradeEntry::from).collect())
}

/// Locate and parse the trade array in a model response.
pub fn parse_trade_rows(raw: &str) -> Result<Vec<TradeEntry>, ExtractError> {
    let json = extract_json_block(raw).ok_or(ExtractError::NoJson)?;
    trades_from_json(json)
}

#[derive(Debug, Deserialize)]
struct TickerRow {
    name: Option<String>,
    ticker: Option<String>,
}

/// `[{name, ticker}]` from the ticker-mapping prompt; rows missing either
/// field are dropped.
pub fn parse_ticker_map(raw: &str) -> Result<Vec<(String, String)>, ExtractError> {
    let json = extract_json_block(raw).ok_or(ExtractError::NoJson)?;
    let rows: Vec<TickerRow> = serde_json::from_str(json)?;
    Ok(rows
        .into_iter()
        .filter_map(|r| match (r.name, r.ticker) {
            (Some(n), Some(t)) if !n.is_empty() && !t.is_empty() => Some((n, t)),
            _ => None,
        })
        .collect())
}

/// Drop anything before section 1 and keep the report once the expected
/// headings start appearing in order.
pub fn clean_report(raw: &str) -> String {
    let normalized = raw.trim().replace("\r\n", "\n");
    let mut cleaned = Vec::new();
    let mut section_count = 0usize;
    let mut found_start = false;

    for line in normalized.split('\n') {
        let trimmed = line.trim();
        if !found_start && trimmed.is_empty() {
            continue;
        }
        let matched = SECTION_PATTERNS.iter().position(|p| p.is_match(trimmed));
        if matched.is_some() && matched == Some(section_count) {
            found_start = true;
            section_count += 1;
            cleaned.push(line);
        } else if found_start {
            cleaned.push(line);
        }
    }

    cleaned.join("\n")
}

/// Like [`clean_report`], but an output without any recognised heading is a
/// template violation.
pub fn clean_and_validate_report(raw: &str) -> Result<String, ExtractError> {
    let cleaned = clean_report(raw);
    if cleaned.trim().is_empty() {
        return Err(ExtractError::NoSections);
    }
    Ok(cleaned)
}

/// Lines of section 8 up to the next numbered heading.
pub fn extract_asset_breakdown(report: &str) -> String {
    let lines: Vec<&str> = report.split('\n').collect();
    let Some(start) = lines.iter().position(|l| ASSET_HEADING.is_match(l)) else {
        return String::new();
    };
    let end = lines[start + 1..]
        .iter()
        .position(|l| ANY_HEADING.is_match(l))
        .map(|offset| start + 1 + offset)
        .unwrap_or(lines.len());
    lines[start + 1..end].join("\n")
}

/// Rows of the 4-column holdings table; header and separator rows skipped.
pub fn parse_asset_table(section: &str) -> Vec<ReportAsset> {
    section
        .split('\n')
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && line.contains('|')
                && !line.to_lowercase().contains("asset name")
                && !line.contains("---")
        })
        .filter_map(|row| {
            let cells: Vec<&str> = row
                .split('|')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .collect();
            match cells.as_slice() {
                [name, kind, invested, current] => Some(ReportAsset {
                    name: name.to_string(),
                    kind: kind.to_string(),
                    invested: parse_currency(invested),
                    current: parse_currency(current),
                }),
                _ => None,
            }
        })
        .collect()
}
