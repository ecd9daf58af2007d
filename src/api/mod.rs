// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! HTTP surface: router, shared state and upload handling.

pub mod articles;
pub mod market;
pub mod reports;
pub mod trades;
pub mod users;

use crate::ai::{GeminiClient, ImagePart, VisionModel};
use crate::config::Settings;
use crate::db;
use crate::error::{ApiResult, AppError};
use crate::market::{QuoteProvider, YahooClient};
use crate::utils::http_client;
use anyhow::{anyhow, Context, Result};
use axum::extract::{DefaultBodyLimit, FromRequest, FromRequestParts, Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use rusqlite::Connection;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub ai: Arc<dyn VisionModel>,
    pub market: Arc<dyn QuoteProvider>,
    pub reports_dir: PathBuf,
}

impl AppState {
    pub fn new(
        conn: Connection,
        ai: Arc<dyn VisionModel>,
        market: Arc<dyn QuoteProvider>,
        reports_dir: PathBuf,
    ) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            ai,
            market,
            reports_dir,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let conn = db::open_or_init(&settings.db_path)?;
        std::fs::create_dir_all(&settings.reports_dir).with_context(|| {
            format!("Create reports dir {}", settings.reports_dir.display())
        })?;
        let http = http_client(settings.http_timeout_secs)?;
        let ai = GeminiClient::new(
            http.clone(),
            &settings.gemini_base_url,
            &settings.gemini_model,
            settings.gemini_api_key.clone(),
        );
        let market = YahooClient::new(http, &settings.yahoo_base_url);
        Ok(Self::new(
            conn,
            Arc::new(ai),
            Arc::new(market),
            settings.reports_dir.clone(),
        ))
    }

    /// Run `f` against the database. The lock is released before this
    /// returns, so callers never hold it across an `.await`.
    pub fn with_db<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> ApiResult<T> {
        let mut conn = self
            .db
            .lock()
            .map_err(|_| anyhow!("database lock poisoned"))?;
        Ok(f(&mut *conn)?)
    }
}

/// JSON request body whose rejections are reported as `AppError`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string whose rejections are reported as `AppError`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Files and text fields of a multipart form.
#[derive(Debug, Default)]
pub struct Upload {
    pub images: Vec<ImagePart>,
    pub fields: HashMap<String, String>,
}

impl Upload {
    /// A text field, trimmed, or `None` when absent or blank.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

/// Collect `screenshots` parts as images and every other part as text.
pub async fn read_upload(mut multipart: Multipart) -> ApiResult<Upload> {
    let mut upload = Upload::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "screenshots" {
            let mime_type = field.content_type().unwrap_or("image/png").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::bad_request(format!("Invalid upload: {}", e)))?;
            if !data.is_empty() {
                upload.images.push(ImagePart {
                    mime_type,
                    data: data.to_vec(),
                });
            }
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::bad_request(format!("Invalid field '{}': {}", name, e)))?;
            upload.fields.insert(name, text);
        }
    }
    Ok(upload)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "geminiConfigured": state.ai.is_configured(),
    }))
}

pub fn router(state: AppState) -> Router {
    let reports = ServeDir::new(&state.reports_dir);
    Router::new()
        .route("/user/signup", post(users::signup))
        .route("/user/login", post(users::login))
        .route("/user/details", post(users::details))
        .route("/generate-report", post(reports::generate_report))
        .route("/api/track-trade", post(trades::track_trade))
        .route("/api/save-portfolio", post(trades::save_portfolio))
        .route("/api/portfolio-summary", post(trades::portfolio_summary))
        .route("/api/profit-by-date", post(trades::profit_by_date))
        .route(
            "/api/profit-by-date-per-stock",
            post(trades::profit_by_date_per_stock),
        )
        .route("/api/portfolio-evaluation", post(trades::portfolio_evaluation))
        .route("/search-stock", get(market::search_stock))
        .route("/market-data", get(market::market_data))
        .route("/nifty-top-companies", get(market::nifty_top_companies))
        .route("/stock-details", get(market::stock_details))
        .route("/stock-history", get(market::stock_history))
        .route("/analyze-returns", post(market::analyze_returns))
        .route("/api/top-movers", get(market::top_movers))
        .route("/api/top-commodities", get(market::top_commodities))
        .route("/articles", get(articles::list).post(articles::create))
        .route("/test-articles", get(articles::count))
        .route("/health", get(health))
        .nest_service("/reports", reports)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

pub async fn serve(settings: &Settings) -> Result<()> {
    let state = AppState::from_settings(settings)?;
    let addr = settings.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Bind {}", addr))?;
    tracing::info!(
        %addr,
        db = %settings.db_path.display(),
        gemini_configured = state.ai.is_configured(),
        "server listening"
    );
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    Ok(())
}
