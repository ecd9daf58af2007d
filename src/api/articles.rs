// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{ApiJson, AppState};
use crate::error::{ApiResult, AppError};
use crate::models::Article;
use crate::store;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewArticle {
    pub author: Option<String>,
    pub title: Option<String>,
    pub section: Option<String>,
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Article>>> {
    Ok(Json(state.with_db(|conn| store::list_articles(conn))?))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewArticle>,
) -> ApiResult<(StatusCode, Json<Article>)> {
    let field = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let (Some(author), Some(title), Some(section)) =
        (field(&body.author), field(&body.title), field(&body.section))
    else {
        return Err(AppError::bad_request("Author, title and section are required"));
    };
    let article = state.with_db(|conn| store::create_article(conn, &author, &title, &section))?;
    Ok((StatusCode::CREATED, Json(article)))
}

pub async fn count(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let count = state.with_db(|conn| store::count_articles(conn))?;
    Ok(Json(json!({ "count": count })))
}
