// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{read_upload, AppState};
use crate::ai::{report_prompt, GenerateRequest, REPORT_CONFIG};
use crate::error::{ApiResult, AppError};
use crate::extract::{clean_and_validate_report, extract_asset_breakdown, parse_asset_table};
use crate::models::ReportAsset;
use crate::render::{render_pdf, report_filename};
use crate::store;
use anyhow::Context;
use axum::extract::{Multipart, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedReport {
    pub report: String,
    pub pdf_path: String,
    pub assets: Vec<ReportAsset>,
}

/// Screenshots plus a goal in, advisory report and PDF out.
pub async fn generate_report(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<GeneratedReport>> {
    let upload = read_upload(multipart).await?;
    let (Some(goal), Some(email)) = (upload.field("goal"), upload.field("email")) else {
        return Err(AppError::bad_request("Missing goal, screenshots, or email"));
    };
    if upload.images.is_empty() {
        return Err(AppError::bad_request("Missing goal, screenshots, or email"));
    }
    let (goal, email) = (goal.to_string(), email.to_lowercase());

    let user = state
        .with_db(|conn| store::find_user(conn, &email))?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let raw = state
        .ai
        .generate(GenerateRequest {
            prompt: report_prompt(&goal),
            images: upload.images,
            config: Some(REPORT_CONFIG),
        })
        .await
        .map_err(|e| AppError::upstream("Failed to generate report", e))?;
    let report = clean_and_validate_report(&raw)?;

    let assets = parse_asset_table(&extract_asset_breakdown(&report));
    if assets.is_empty() {
        tracing::warn!(user_id = user.id, "report has no asset allocation table");
    }

    let now = Utc::now();
    let filename = report_filename(&email, now.timestamp_millis());
    let pdf_file = state.reports_dir.join(&filename);
    let title = format!("Portfolio Report - {}", user.name);
    let pdf_report = report.clone();
    tokio::task::spawn_blocking(move || render_pdf(&pdf_report, &title, &pdf_file))
        .await
        .context("PDF rendering task failed")??;

    let public_path = format!("/reports/{}", filename);
    let name = format!("Portfolio Report - {}", now.format("%Y-%m-%d %H:%M"));
    let report_id = state.with_db(|conn| {
        store::insert_report(conn, user.id, &name, &report, &public_path, &assets)
    })?;
    tracing::info!(user_id = user.id, report_id, assets = assets.len(), "report generated");

    Ok(Json(GeneratedReport {
        report,
        pdf_path: public_path,
        assets,
    }))
}
