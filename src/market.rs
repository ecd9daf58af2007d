// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Market data: quotes, symbol search and daily history from Yahoo Finance,
//! plus the derived numbers the API serves (mood, movers, CAGR).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const NIFTY: &str = "^NSEI";
pub const SENSEX: &str = "^BSESN";

pub const NIFTY_TOP_50: [&str; 50] = [
    "ADANIPORTS.NS", "ASIANPAINT.NS", "AXISBANK.NS", "BAJAJ-AUTO.NS", "BAJFINANCE.NS",
    "BAJAJFINSV.NS", "BPCL.NS", "BHARTIARTL.NS", "INFRATEL.NS", "CIPLA.NS",
    "DRREDDY.NS", "EICHERMOT.NS", "GRASIM.NS", "HCLTECH.NS", "HDFC.NS",
    "HDFCBANK.NS", "HDFCLIFE.NS", "HEROMOTOCO.NS", "HINDALCO.NS", "HINDUNILVR.NS",
    "ICICIBANK.NS", "ITC.NS", "IOC.NS", "INDUSINDBK.NS", "INFY.NS",
    "JSWSTEEL.NS", "KOTAKBANK.NS", "LT.NS", "M&M.NS", "MARUTI.NS",
    "NESTLEIND.NS", "NTPC.NS", "ONGC.NS", "POWERGRID.NS", "RELIANCE.NS",
    "SBIN.NS", "SHREECEM.NS", "SUNPHARMA.NS", "TCS.NS", "TATAMOTORS.NS",
    "TATASTEEL.NS", "TECHM.NS", "TITAN.NS", "ULTRACEMCO.NS", "UPL.NS",
    "WIPRO.NS", "DIVISLAB.NS", "INDIGO.NS", "COALINDIA.NS", "GAIL.NS",
];

pub const MOVER_SYMBOLS: [&str; 15] = [
    "RELIANCE.NS", "TCS.NS", "INFY.NS", "HDFCBANK.NS", "ICICIBANK.NS",
    "SBIN.NS", "ITC.NS", "LT.NS", "AXISBANK.NS", "BAJFINANCE.NS",
    "WIPRO.NS", "MARUTI.NS", "HCLTECH.NS", "SUNPHARMA.NS", "ADANIENT.NS",
];

/// Gold, silver, crude, natural gas, copper, corn, soybeans, coffee, sugar, cotton.
pub const COMMODITY_SYMBOLS: [&str; 10] = [
    "GC=F", "SI=F", "CL=F", "NG=F", "HG=F", "ZC=F", "ZS=F", "KC=F", "SB=F", "CT=F",
];

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("market data request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("market data provider error: {0}")]
    Provider(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub currency: Option<String>,
    pub exchange: Option<String>,
    pub regular_market_price: Option<f64>,
    pub regular_market_change: Option<f64>,
    pub regular_market_change_percent: Option<f64>,
    pub regular_market_previous_close: Option<f64>,
    pub regular_market_open: Option<f64>,
    pub regular_market_day_high: Option<f64>,
    pub regular_market_day_low: Option<f64>,
    pub regular_market_volume: Option<u64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub market_cap: Option<f64>,
}

impl Quote {
    pub fn display_name(&self) -> String {
        self.short_name
            .clone()
            .or_else(|| self.long_name.clone())
            .unwrap_or_else(|| self.symbol.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub symbol: String,
    pub name: String,
    pub exchange: String,
    pub exch_disp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Quotes for the given symbols; unknown symbols are simply absent.
    async fn quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, MarketError>;
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, MarketError>;
    /// Daily closes, inclusive of both dates, ascending.
    async fn history(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, MarketError>;
}

pub struct YahooClient {
    http: reqwest::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooResponse {
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    quotes: Vec<SearchQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuote {
    symbol: Option<String>,
    shortname: Option<String>,
    longname: Option<String>,
    name: Option<String>,
    exchange: Option<String>,
    exch_disp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

fn matches_query(q: &SearchQuote, needle: &str) -> bool {
    [&q.symbol, &q.shortname, &q.longname, &q.name]
        .into_iter()
        .flatten()
        .any(|s| s.to_lowercase().contains(needle))
}

#[async_trait]
impl QuoteProvider for YahooClient {
    async fn quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, MarketError> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/v7/finance/quote", self.base_url);
        let resp = self
            .http
            .get(url)
            .query(&[("symbols", symbols.join(","))])
            .send()
            .await?
            .error_for_status()?;
        let yr: YahooResponse = resp.json().await?;
        Ok(yr.quote_response.result)
    }

    /// NSE/BSE listings whose symbol or name contains the query.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, MarketError> {
        let url = format!("{}/v1/finance/search", self.base_url);
        let resp = self
            .http
            .get(url)
            .query(&[("q", query)])
            .send()
            .await?
            .error_for_status()?;
        let sr: SearchResponse = resp.json().await?;
        let needle = query.to_lowercase();
        Ok(sr
            .quotes
            .into_iter()
            .filter(|q| matches!(q.exchange.as_deref(), Some("NSI") | Some("BSE")))
            .filter(|q| matches_query(q, &needle))
            .filter_map(|q| {
                let symbol = q.symbol?;
                Some(SearchHit {
                    name: q.shortname.or(q.longname).or(q.name).unwrap_or_default(),
                    exchange: q.exchange.unwrap_or_default(),
                    exch_disp: q.exch_disp.unwrap_or_default(),
                    symbol,
                })
            })
            .collect())
    }

    async fn history(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, MarketError> {
        let period1 = from.and_hms_opt(0, 0, 0).map(|t| t.and_utc().timestamp());
        let period2 = to
            .succ_opt()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|t| t.and_utc().timestamp());
        let (Some(period1), Some(period2)) = (period1, period2) else {
            return Err(MarketError::Provider(format!("invalid range {from}..{to}")));
        };
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let resp = self
            .http
            .get(url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
            ])
            .send()
            .await?;
        let status = resp.status();
        let chart: ChartResponse = resp.json().await?;
        if let Some(err) = chart.chart.error {
            // Yahoo reports unknown symbols as 404 with an error body.
            if status == reqwest::StatusCode::NOT_FOUND {
                return Ok(Vec::new());
            }
            return Err(MarketError::Provider(
                err.description.unwrap_or_else(|| status.to_string()),
            ));
        }
        let Some(result) = chart.chart.result.and_then(|r| r.into_iter().next()) else {
            return Ok(Vec::new());
        };
        let closes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();
        let mut points: Vec<PricePoint> = result
            .timestamp
            .iter()
            .zip(closes)
            .filter_map(|(ts, close)| {
                let date = DateTime::from_timestamp(*ts, 0)?.date_naive();
                Some(PricePoint {
                    date,
                    price: close?,
                })
            })
            .filter(|p| p.date >= from && p.date <= to)
            .collect();
        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}

/// Append the NSE suffix to bare tickers; indices (`^`) and futures (`=`)
/// are left as they are.
pub fn normalize_symbol(symbol: &str) -> String {
    let s = symbol.trim().to_uppercase();
    if s.contains('.') || s.starts_with('^') || s.contains('=') {
        s
    } else {
        format!("{}.NS", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mood {
    Bullish,
    Bearish,
    Neutral,
}

pub fn market_mood(nifty_change: Option<f64>, sensex_change: Option<f64>) -> Mood {
    match (nifty_change, sensex_change) {
        (Some(n), Some(s)) if n >= 0.0 && s >= 0.0 => Mood::Bullish,
        (Some(n), Some(s)) if n < 0.0 && s < 0.0 => Mood::Bearish,
        _ => Mood::Neutral,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mover {
    pub symbol: String,
    pub name: String,
    pub price: Option<f64>,
    pub change: Option<f64>,
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Movers {
    pub top_gainers: Vec<Mover>,
    pub top_losers: Vec<Mover>,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Top `n` gainers and losers by change percent; quotes without a change
/// percent are skipped.
pub fn top_movers(quotes: &[Quote], n: usize) -> Movers {
    let valid: Vec<Mover> = quotes
        .iter()
        .filter_map(|q| {
            let pct = q.regular_market_change_percent.filter(|p| p.is_finite())?;
            Some(Mover {
                symbol: q.symbol.clone(),
                name: q.display_name(),
                price: q.regular_market_price,
                change: q.regular_market_change,
                change_percent: round2(pct),
            })
        })
        .collect();

    let mut gainers = valid.clone();
    gainers.sort_by(|a, b| b.change_percent.total_cmp(&a.change_percent));
    gainers.truncate(n);

    let mut losers = valid;
    losers.sort_by(|a, b| a.change_percent.total_cmp(&b.change_percent));
    losers.truncate(n);

    Movers {
        top_gainers: gainers,
        top_losers: losers,
    }
}

/// Quotes ordered by change percent, highest first; missing values last.
pub fn rank_by_change(mut quotes: Vec<Quote>) -> Vec<Quote> {
    quotes.sort_by(|a, b| {
        let a = a.regular_market_change_percent.unwrap_or(f64::NEG_INFINITY);
        let b = b.regular_market_change_percent.unwrap_or(f64::NEG_INFINITY);
        b.total_cmp(&a)
    });
    quotes
}

/// Compound annual growth between the earliest and latest close, over the
/// time elapsed since `invested`. `None` when it cannot be computed.
pub fn cagr(history: &[PricePoint], invested: NaiveDate, today: NaiveDate) -> Option<f64> {
    if history.len() < 2 {
        return None;
    }
    let first = history.iter().min_by_key(|p| p.date)?;
    let last = history.iter().max_by_key(|p| p.date)?;
    if first.price <= 0.0 || last.price <= 0.0 {
        return None;
    }
    let years = (today - invested).num_days() as f64 / 365.25;
    if years <= 0.0 {
        return None;
    }
    let rate = (last.price / first.price).powf(1.0 / years) - 1.0;
    rate.is_finite().then_some(rate * 100.0)
}

pub fn fmt_cagr(rate: Option<f64>) -> String {
    match rate {
        Some(r) => format!("{:.2}%", r),
        None => crate::utils::NOT_AVAILABLE.to_string(),
    }
}
