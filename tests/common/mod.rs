// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use tradelens::ai::{AiError, GenerateRequest, VisionModel};
use tradelens::api::{self, AppState};
use tradelens::db;
use tradelens::market::{MarketError, PricePoint, Quote, QuoteProvider, SearchHit};

/// Replies with a fixed text, or fails like an unreachable service.
pub struct FakeModel {
    pub reply: Option<String>,
    pub requests: Mutex<Vec<GenerateRequest>>,
}

impl FakeModel {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VisionModel for FakeModel {
    async fn generate(&self, request: GenerateRequest) -> Result<String, AiError> {
        self.requests.lock().unwrap().push(request);
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => Err(AiError::Status {
                status: 503,
                body: "model overloaded".into(),
            }),
        }
    }
}

#[derive(Default)]
pub struct FakeMarket {
    pub quotes: Vec<Quote>,
    pub hits: Vec<SearchHit>,
    pub history: HashMap<String, Vec<PricePoint>>,
    pub down: bool,
}

#[async_trait]
impl QuoteProvider for FakeMarket {
    async fn quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, MarketError> {
        if self.down {
            return Err(MarketError::Provider("upstream unavailable".into()));
        }
        Ok(self
            .quotes
            .iter()
            .filter(|q| symbols.contains(&q.symbol))
            .cloned()
            .collect())
    }

    async fn search(&self, _query: &str) -> Result<Vec<SearchHit>, MarketError> {
        Ok(self.hits.clone())
    }

    async fn history(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, MarketError> {
        if self.down {
            return Err(MarketError::Provider("upstream unavailable".into()));
        }
        Ok(self
            .history
            .get(symbol)
            .map(|points| {
                points
                    .iter()
                    .filter(|p| p.date >= from && p.date <= to)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub fn quote(symbol: &str, price: f64, change: f64, pct: f64) -> Quote {
    Quote {
        symbol: symbol.to_string(),
        short_name: Some(symbol.trim_end_matches(".NS").to_string()),
        regular_market_price: Some(price),
        regular_market_change: Some(change),
        regular_market_change_percent: Some(pct),
        ..Default::default()
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn app(model: FakeModel, market: FakeMarket, reports_dir: &Path) -> Router {
    let conn = db::open_in_memory().unwrap();
    let state = AppState::new(conn, Arc::new(model), Arc::new(market), reports_dir.to_path_buf());
    api::router(state)
}

pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

const BOUNDARY: &str = "tradelens-test-boundary";

/// A multipart form with text fields and PNG `screenshots`.
pub fn post_multipart(uri: &str, fields: &[(&str, &str)], screenshots: &[&[u8]]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (i, data) in screenshots.iter().enumerate() {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"screenshots\"; filename=\"shot{i}.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    Request::post(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn signup(app: &Router, email: &str) {
    let (status, _) = send(
        app,
        post_json(
            "/user/signup",
            serde_json::json!({ "name": "Asha", "email": email, "password": "pw" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}
