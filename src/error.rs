// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregate::AggregateError;
use crate::ai::AiError;
use crate::extract::ExtractError;
use crate::market::MarketError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the HTTP API, each mapped to a status and JSON body.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// An AI or market-data call failed; `message` carries the upstream text.
    #[error("{error}: {message}")]
    Upstream { error: String, message: String },
    #[error("{0}")]
    Parse(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn upstream(error: impl Into<String>, source: impl std::fmt::Display) -> Self {
        Self::Upstream {
            error: error.into(),
            message: source.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upstream { .. } | Self::Parse(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Upstream { error, message } => json!({ "error": error, "message": message }),
            Self::Internal(e) => {
                tracing::error!(error = ?e, "internal error");
                json!({ "error": "Server error", "message": e.to_string() })
            }
            other => json!({ "error": other.to_string() }),
        };
        if status.is_server_error() {
            tracing::warn!(%status, error = %self, "request failed");
        }
        (status, Json(body)).into_response()
    }
}

impl From<AggregateError> for AppError {
    fn from(e: AggregateError) -> Self {
        match e {
            AggregateError::InvertedRange { .. } => Self::BadRequest(e.to_string()),
            AggregateError::NoTrades => Self::NotFound(e.to_string()),
        }
    }
}

impl From<ExtractError> for AppError {
    fn from(e: ExtractError) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<AiError> for AppError {
    fn from(e: AiError) -> Self {
        Self::upstream("AI service request failed", e)
    }
}

impl From<MarketError> for AppError {
    fn from(e: MarketError) -> Self {
        Self::upstream("Market data request failed", e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        Self::BadRequest(e.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(e: QueryRejection) -> Self {
        Self::BadRequest(e.body_text())
    }
}

pub type ApiResult<T> = Result<T, AppError>;
