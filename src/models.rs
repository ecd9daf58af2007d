// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub report_data: Option<String>,
    pub report_pdf: Option<String>,
    pub created_at: String,
    pub assets: Vec<ReportAsset>,
    pub trade_entries: Vec<TradeEntry>,
}

/// One row of the holdings table in section 8 of an advisory report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportAsset {
    pub name: String,
    pub kind: String,
    pub invested: Option<Decimal>,
    pub current: Option<Decimal>,
}

/// A holding's invested/current pair for a given date; the unit of aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeEntry {
    pub stock_name: String,
    pub invested_date: Option<NaiveDate>,
    pub invested_amount: Option<Decimal>,
    pub current_value: Option<Decimal>,
}

impl TradeEntry {
    /// `current - invested`, or `None` when either side is unknown.
    pub fn profit_or_loss(&self) -> Option<Decimal> {
        match (self.invested_amount, self.current_value) {
            (Some(invested), Some(current)) => Some(current - invested),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: i64,
    pub author: String,
    pub title: String,
    pub section: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    #[serde(flatten)]
    pub user: User,
    pub reports: Vec<Report>,
}
