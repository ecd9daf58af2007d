// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{read_upload, ApiJson, AppState};
use crate::aggregate::{self, DailyProfit, DateRange, Evaluation};
use crate::ai::{trade_extraction_prompt, GenerateRequest};
use crate::error::{ApiResult, AppError};
use crate::extract::{parse_trade_rows, DisplayTrade, ExtractError, RawTradeRow};
use crate::models::TradeEntry;
use crate::store;
use crate::utils::{fmt_money, fmt_percent};
use axum::extract::{Multipart, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct TrackedTrades {
    pub stored: bool,
    pub text: String,
    pub extracted: Vec<DisplayTrade>,
}

/// Extract trades from screenshots for review; nothing is stored.
pub async fn track_trade(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<TrackedTrades>> {
    let upload = read_upload(multipart).await?;
    if upload.images.is_empty() {
        return Err(AppError::bad_request("No screenshots uploaded"));
    }

    let raw = state
        .ai
        .generate(GenerateRequest {
            prompt: trade_extraction_prompt().to_string(),
            images: upload.images,
            config: None,
        })
        .await
        .map_err(|e| AppError::upstream("Failed to analyze screenshot.", e))?;

    let entries = parse_trade_rows(&raw).map_err(|e| match e {
        ExtractError::NoJson => AppError::Parse("AI service did not return valid JSON".into()),
        other => AppError::Parse(format!("Invalid JSON received from AI service: {}", other)),
    })?;
    let extracted: Vec<DisplayTrade> = entries.iter().map(DisplayTrade::from).collect();
    let text = serde_json::to_string_pretty(&extracted).map_err(anyhow::Error::from)?;
    tracing::info!(rows = extracted.len(), "trades extracted");

    Ok(Json(TrackedTrades {
        stored: false,
        text,
        extracted,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SavePortfolioBody {
    pub email: Option<String>,
    pub trade_data: Option<Vec<RawTradeRow>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedReport {
    pub id: i64,
    pub report_name: String,
    pub trade_entries: Vec<TradeEntry>,
}

#[derive(Debug, Serialize)]
pub struct SavePortfolioResponse {
    pub message: String,
    pub report: SavedReport,
    pub skipped: usize,
}

pub async fn save_portfolio(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SavePortfolioBody>,
) -> ApiResult<Json<SavePortfolioResponse>> {
    let (Some(email), Some(rows)) = (body.email, body.trade_data) else {
        return Err(AppError::bad_request("Invalid payload"));
    };
    let email = email.trim().to_lowercase();
    let entries: Vec<TradeEntry> = rows.into_iter().map(TradeEntry::from).collect();
    let report_name = format!("Trade Report - {}", Utc::now().to_rfc3339());

    let saved = state.with_db(|conn| {
        let Some(user) = store::find_user(conn, &email)? else {
            return Ok(None);
        };
        store::append_trade_report(conn, user.id, &report_name, &entries).map(Some)
    })?;
    let saved = saved.ok_or_else(|| AppError::not_found("User not found"))?;
    if saved.skipped > 0 {
        tracing::info!(skipped = saved.skipped, "duplicate trade entries skipped");
    }

    Ok(Json(SavePortfolioResponse {
        message: "Portfolio saved successfully".into(),
        report: SavedReport {
            id: saved.report_id,
            report_name,
            trade_entries: entries,
        },
        skipped: saved.skipped,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RangeBody {
    pub email: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// The user's entries and a validated range, or the matching client error.
fn load_range(state: &AppState, body: &RangeBody) -> ApiResult<(Vec<TradeEntry>, DateRange)> {
    let (Some(email), Some(from), Some(to)) = (
        non_blank(&body.email),
        non_blank(&body.from),
        non_blank(&body.to),
    ) else {
        return Err(AppError::bad_request("Missing email, from, or to date"));
    };
    let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d");
    let (Ok(from), Ok(to)) = (parse(from), parse(to)) else {
        return Err(AppError::bad_request("Invalid from or to date format"));
    };
    let range = DateRange::new(from, to)?;
    let email = email.to_lowercase();

    let entries = state.with_db(|conn| {
        let Some(user) = store::find_user(conn, &email)? else {
            return Ok(None);
        };
        store::load_trade_entries(conn, user.id).map(Some)
    })?;
    let entries = entries.ok_or_else(|| AppError::not_found("User not found"))?;
    Ok((entries, range))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total_trades: usize,
    pub total_invested: String,
    pub total_current_value: String,
    pub profit: String,
    pub return_percentage: String,
}

pub async fn portfolio_summary(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RangeBody>,
) -> ApiResult<Json<SummaryResponse>> {
    let (entries, range) = load_range(&state, &body)?;
    let s = aggregate::summarize(&entries, &range);
    Ok(Json(SummaryResponse {
        from: range.from,
        to: range.to,
        total_trades: s.total_trades,
        total_invested: fmt_money(&s.total_invested),
        total_current_value: fmt_money(&s.total_current),
        profit: fmt_money(&s.profit),
        return_percentage: fmt_percent(s.return_percentage),
    }))
}

pub async fn profit_by_date(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RangeBody>,
) -> ApiResult<Json<Vec<DailyProfit>>> {
    let (entries, range) = load_range(&state, &body)?;
    Ok(Json(aggregate::profit_by_date(&entries, &range)))
}

pub async fn profit_by_date_per_stock(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RangeBody>,
) -> ApiResult<Json<BTreeMap<String, Vec<DailyProfit>>>> {
    let (entries, range) = load_range(&state, &body)?;
    Ok(Json(aggregate::profit_by_date_per_stock(&entries, &range)))
}

#[derive(Debug, Serialize)]
pub struct EvaluationResponse {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(flatten)]
    pub evaluation: Evaluation,
}

pub async fn portfolio_evaluation(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RangeBody>,
) -> ApiResult<Json<EvaluationResponse>> {
    let (entries, range) = load_range(&state, &body)?;
    let evaluation = aggregate::evaluate(&entries, &range)?;
    Ok(Json(EvaluationResponse {
        from: range.from,
        to: range.to,
        evaluation,
    }))
}
