// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rust_decimal::Decimal;
use std::time::Duration;

const UA: &str = concat!(
    "tradelens/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/alphavelocity/tradelens)"
);

pub const NOT_AVAILABLE: &str = "N/A";

pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    let c = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Dates coming back from the AI are loose: accept ISO dates, ISO datetimes
/// and `DD-MM-YYYY` / `DD/MM/YYYY`, anything else is unknown.
pub fn parse_loose_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case(NOT_AVAILABLE) {
        return None;
    }
    let head = s.get(..10).unwrap_or(s);
    ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(head, fmt).ok())
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Parse a display-formatted amount such as `₹1,234.56`, `Rs. 50` or `-₹10`.
/// `N/A`, `-` and blanks are unknown.
pub fn parse_currency(s: &str) -> Option<Decimal> {
    let mut cleaned = s.trim().replace("Rs.", "").replace("Rs", "").replace("INR", "");
    cleaned.retain(|c| !matches!(c, '₹' | '$' | ',' | ' ' | '\u{a0}'));
    if cleaned.is_empty() || cleaned == "-" || cleaned.eq_ignore_ascii_case(NOT_AVAILABLE) {
        return None;
    }
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    cleaned.parse::<Decimal>().ok()
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `₹1,234.56`; negative amounts render as `-₹1,234.56`.
pub fn fmt_money(d: &Decimal) -> String {
    let rounded = d.round_dp(2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let plain = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));
    format!("{}₹{}.{}", sign, group_thousands(int_part), frac_part)
}

/// Like [`fmt_money`] but always carries an explicit sign.
pub fn fmt_signed_money(d: &Decimal) -> String {
    if d.is_sign_negative() && !d.round_dp(2).is_zero() {
        fmt_money(d)
    } else {
        format!("+{}", fmt_money(&d.abs()))
    }
}

pub fn fmt_percent(p: Option<Decimal>) -> String {
    match p {
        Some(p) => format!("{:.2}%", p.round_dp(2)),
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn fmt_optional_money(d: Option<Decimal>) -> String {
    d.as_ref().map(fmt_money).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(json_flag: bool, v: &T) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    Ok(false)
}
