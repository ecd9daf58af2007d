// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{ApiJson, ApiQuery, AppState};
use crate::ai::{ticker_mapping_prompt, GenerateRequest};
use crate::error::{ApiResult, AppError};
use crate::extract::parse_ticker_map;
use crate::market::{
    self, cagr, fmt_cagr, market_mood, normalize_symbol, rank_by_change, Mood, Movers, PricePoint,
    Quote, SearchHit, COMMODITY_SYMBOLS, MOVER_SYMBOLS, NIFTY, NIFTY_TOP_50, SENSEX,
};
use crate::utils::{parse_loose_date, NOT_AVAILABLE};
use axum::extract::State;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn owned(symbols: &[&str]) -> Vec<String> {
    symbols.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

pub async fn search_stock(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> ApiResult<Json<Vec<SearchHit>>> {
    let query = params.query.unwrap_or_default();
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::bad_request("Query is required"));
    }
    let hits = state
        .market
        .search(query)
        .await
        .map_err(|e| AppError::upstream("Failed to search stocks", e))?;
    Ok(Json(hits))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexQuote {
    pub price: Option<f64>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
}

impl From<Option<&Quote>> for IndexQuote {
    fn from(q: Option<&Quote>) -> Self {
        IndexQuote {
            price: q.and_then(|q| q.regular_market_price),
            change: q.and_then(|q| q.regular_market_change),
            change_percent: q.and_then(|q| q.regular_market_change_percent),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MarketOverview {
    pub nifty: IndexQuote,
    pub sensex: IndexQuote,
    pub mood: Mood,
}

pub async fn market_data(State(state): State<AppState>) -> ApiResult<Json<MarketOverview>> {
    let quotes = state
        .market
        .quotes(&owned(&[NIFTY, SENSEX]))
        .await
        .map_err(|e| AppError::upstream("Failed to fetch market data", e))?;
    let find = |symbol: &str| quotes.iter().find(|q| q.symbol == symbol);
    let (nifty, sensex) = (find(NIFTY), find(SENSEX));
    let mood = market_mood(
        nifty.and_then(|q| q.regular_market_change),
        sensex.and_then(|q| q.regular_market_change),
    );
    Ok(Json(MarketOverview {
        nifty: nifty.into(),
        sensex: sensex.into(),
        mood,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRow {
    pub symbol: String,
    pub name: String,
    pub price: Option<f64>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
}

impl From<&Quote> for QuoteRow {
    fn from(q: &Quote) -> Self {
        QuoteRow {
            symbol: q.symbol.clone(),
            name: q.display_name(),
            price: q.regular_market_price,
            change: q.regular_market_change,
            change_percent: q.regular_market_change_percent,
        }
    }
}

pub async fn nifty_top_companies(State(state): State<AppState>) -> ApiResult<Json<Vec<QuoteRow>>> {
    let quotes = state
        .market
        .quotes(&owned(&NIFTY_TOP_50))
        .await
        .map_err(|e| AppError::upstream("Failed to fetch top companies", e))?;
    Ok(Json(quotes.iter().map(QuoteRow::from).collect()))
}

#[derive(Debug, Default, Deserialize)]
pub struct SymbolParams {
    pub symbol: Option<String>,
}

pub async fn stock_details(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SymbolParams>,
) -> ApiResult<Json<Quote>> {
    let Some(raw) = params.symbol.filter(|s| !s.trim().is_empty()) else {
        return Err(AppError::bad_request("Symbol is required"));
    };
    let symbol = normalize_symbol(&raw);
    let quotes = state
        .market
        .quotes(&[symbol.clone()])
        .await
        .map_err(|e| AppError::upstream("Failed to fetch stock data", e))?;
    quotes
        .into_iter()
        .find(|q| q.symbol.eq_ignore_ascii_case(&symbol))
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Stock data not found for symbol: {}", symbol)))
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub symbol: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

pub async fn stock_history(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<HistoryParams>,
) -> ApiResult<Json<Vec<PricePoint>>> {
    let Some(raw) = params.symbol.filter(|s| !s.trim().is_empty()) else {
        return Err(AppError::bad_request("Symbol is required"));
    };
    let parse = |v: &Option<String>| {
        v.as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
    };
    let (Some(from), Some(to)) = (parse(&params.from), parse(&params.to)) else {
        return Err(AppError::bad_request(
            "Both from and to dates are required in YYYY-MM-DD format",
        ));
    };
    if from > to {
        return Err(AppError::bad_request("'from' date must not be after 'to' date"));
    }
    let symbol = normalize_symbol(&raw);
    let points = state
        .market
        .history(&symbol, from, to)
        .await
        .map_err(|e| AppError::upstream("Failed to fetch historical data", e))?;
    if points.is_empty() {
        return Err(AppError::not_found(format!(
            "No chart data found for symbol: {}",
            symbol
        )));
    }
    Ok(Json(points))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockInput {
    pub name: String,
    #[serde(alias = "date", default)]
    pub invested_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AnalyzeBody {
    pub stocks: Option<Vec<StockInput>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockReturn {
    pub name: String,
    pub ticker: String,
    pub invested_date: Option<String>,
    pub annual_return: String,
    #[serde(rename = "niftyCAGR")]
    pub nifty_cagr: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub returns: Vec<StockReturn>,
}

/// Ask the model for tickers; any failure just means falling back to the
/// NSE suffix rule.
async fn map_tickers(state: &AppState, names: &[String]) -> HashMap<String, String> {
    let raw = match state
        .ai
        .generate(GenerateRequest::text(ticker_mapping_prompt(names)))
        .await
    {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = %e, "ticker mapping unavailable");
            return HashMap::new();
        }
    };
    match parse_ticker_map(&raw) {
        Ok(pairs) => pairs.into_iter().collect(),
        Err(e) => {
            tracing::warn!(error = %e, "could not parse ticker mapping");
            HashMap::new()
        }
    }
}

async fn annual_return(
    state: &AppState,
    symbol: &str,
    invested: NaiveDate,
    today: NaiveDate,
) -> Option<f64> {
    match state.market.history(symbol, invested, today).await {
        Ok(history) => cagr(&history, invested, today),
        Err(e) => {
            tracing::warn!(%symbol, error = %e, "history unavailable");
            None
        }
    }
}

/// Annualised return of each holding since its invested date, next to the
/// NIFTY over the same period.
pub async fn analyze_returns(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AnalyzeBody>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let Some(stocks) = body.stocks.filter(|s| !s.is_empty()) else {
        return Err(AppError::bad_request("Invalid or missing stock data."));
    };

    let mut names: Vec<String> = stocks.iter().map(|s| s.name.clone()).collect();
    names.sort();
    names.dedup();
    let tickers = map_tickers(&state, &names).await;
    let today = Utc::now().date_naive();

    let mut returns = Vec::with_capacity(stocks.len());
    for stock in stocks {
        let ticker = tickers
            .get(&stock.name)
            .filter(|t| t.as_str() != NOT_AVAILABLE)
            .map(|t| normalize_symbol(t))
            .unwrap_or_else(|| normalize_symbol(&stock.name));
        let invested = stock.invested_date.as_deref().and_then(parse_loose_date);
        let (annual, nifty) = match invested {
            Some(date) => (
                annual_return(&state, &ticker, date, today).await,
                annual_return(&state, NIFTY, date, today).await,
            ),
            None => (None, None),
        };
        returns.push(StockReturn {
            name: stock.name,
            ticker,
            invested_date: stock.invested_date,
            annual_return: fmt_cagr(annual),
            nifty_cagr: fmt_cagr(nifty),
        });
    }
    Ok(Json(AnalyzeResponse { returns }))
}

pub async fn top_movers(State(state): State<AppState>) -> ApiResult<Json<Movers>> {
    let quotes = state
        .market
        .quotes(&owned(&MOVER_SYMBOLS))
        .await
        .map_err(|e| AppError::upstream("Failed to fetch top movers", e))?;
    Ok(Json(market::top_movers(&quotes, 5)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Commodities {
    pub top_commodities: Vec<QuoteRow>,
}

pub async fn top_commodities(State(state): State<AppState>) -> ApiResult<Json<Commodities>> {
    let quotes = state
        .market
        .quotes(&owned(&COMMODITY_SYMBOLS))
        .await
        .map_err(|e| AppError::upstream("Failed to fetch commodity data", e))?;
    Ok(Json(Commodities {
        top_commodities: rank_by_change(quotes).iter().map(QuoteRow::from).collect(),
    }))
}
