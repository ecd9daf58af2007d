// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Persistence for users, reports, trade entries and articles.

use crate::models::{Article, Report, ReportAsset, TradeEntry, User, UserDetails};
use anyhow::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;

fn decimal_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        s.parse::<Decimal>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

/// Canonical TEXT form of an amount, so `1000` and `1000.00` compare equal
/// under the trade-entry UNIQUE key.
fn decimal_text(d: Option<Decimal>) -> Option<String> {
    d.map(|d| d.normalize().to_string())
}

fn user_from_row(r: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: r.get(0)?,
        name: r.get(1)?,
        email: r.get(2)?,
        created_at: r.get(3)?,
    })
}

/// Insert a user; `None` when the email is already registered.
pub fn create_user(
    conn: &Connection,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<Option<User>> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO users(name, email, password_hash) VALUES (?1, ?2, ?3)",
        params![name, email, password_hash],
    )?;
    if changed == 0 {
        return Ok(None);
    }
    find_user(conn, email)
}

pub fn find_user(conn: &Connection, email: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, name, email, created_at FROM users WHERE email=?1",
            params![email],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

/// The user together with the stored password hash.
pub fn find_credentials(conn: &Connection, email: &str) -> Result<Option<(User, String)>> {
    let found = conn
        .query_row(
            "SELECT id, name, email, created_at, password_hash FROM users WHERE email=?1",
            params![email],
            |r| Ok((user_from_row(r)?, r.get::<_, String>(4)?)),
        )
        .optional()?;
    Ok(found)
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare("SELECT id, name, email, created_at FROM users ORDER BY id")?;
    let rows = stmt.query_map([], user_from_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

fn report_assets(conn: &Connection, report_id: i64) -> Result<Vec<ReportAsset>> {
    let mut stmt = conn.prepare(
        "SELECT name, kind, invested, current FROM report_assets WHERE report_id=?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![report_id], |r| {
        Ok(ReportAsset {
            name: r.get(0)?,
            kind: r.get(1)?,
            invested: decimal_col(r, 2)?,
            current: decimal_col(r, 3)?,
        })
    })?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

fn trade_entry_from_row(r: &Row<'_>) -> rusqlite::Result<TradeEntry> {
    Ok(TradeEntry {
        stock_name: r.get(0)?,
        invested_date: r.get(1)?,
        invested_amount: decimal_col(r, 2)?,
        current_value: decimal_col(r, 3)?,
    })
}

fn report_entries(conn: &Connection, report_id: i64) -> Result<Vec<TradeEntry>> {
    let mut stmt = conn.prepare(
        "SELECT stock_name, invested_date, invested_amount, current_value
         FROM trade_entries WHERE report_id=?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![report_id], trade_entry_from_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Reports for a user, oldest first, with their assets and trade entries.
pub fn list_reports(conn: &Connection, user_id: i64) -> Result<Vec<Report>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, report_data, report_pdf, created_at
         FROM reports WHERE user_id=?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![user_id], |r| {
        Ok(Report {
            id: r.get(0)?,
            user_id: r.get(1)?,
            name: r.get(2)?,
            report_data: r.get(3)?,
            report_pdf: r.get(4)?,
            created_at: r.get(5)?,
            assets: Vec::new(),
            trade_entries: Vec::new(),
        })
    })?;
    let mut reports = Vec::new();
    for r in rows {
        let mut report = r?;
        report.assets = report_assets(conn, report.id)?;
        report.trade_entries = report_entries(conn, report.id)?;
        reports.push(report);
    }
    Ok(reports)
}

pub fn user_details(conn: &Connection, email: &str) -> Result<Option<UserDetails>> {
    let Some(user) = find_user(conn, email)? else {
        return Ok(None);
    };
    let reports = list_reports(conn, user.id)?;
    Ok(Some(UserDetails { user, reports }))
}

/// Store an advisory report and its asset rows atomically.
pub fn insert_report(
    conn: &mut Connection,
    user_id: i64,
    name: &str,
    report_data: &str,
    report_pdf: &str,
    assets: &[ReportAsset],
) -> Result<i64> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO reports(user_id, name, report_data, report_pdf) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, name, report_data, report_pdf],
    )
    .context("Insert report")?;
    let report_id = tx.last_insert_rowid();
    {
        let mut stmt = tx.prepare(
            "INSERT INTO report_assets(report_id, name, kind, invested, current)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for a in assets {
            stmt.execute(params![
                report_id,
                a.name,
                a.kind,
                decimal_text(a.invested),
                decimal_text(a.current),
            ])?;
        }
    }
    tx.commit()?;
    Ok(report_id)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTrades {
    pub report_id: i64,
    pub inserted: usize,
    pub skipped: usize,
}

/// Append a trade report. Entries identical to one the user already has are
/// skipped; the report row is written even if every entry was a duplicate.
pub fn append_trade_report(
    conn: &mut Connection,
    user_id: i64,
    name: &str,
    entries: &[TradeEntry],
) -> Result<SavedTrades> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO reports(user_id, name) VALUES (?1, ?2)",
        params![user_id, name],
    )
    .context("Insert trade report")?;
    let report_id = tx.last_insert_rowid();
    let mut inserted = 0usize;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO trade_entries(
                report_id, user_id, stock_name, invested_date, invested_amount, current_value)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for e in entries {
            inserted += stmt.execute(params![
                report_id,
                user_id,
                e.stock_name,
                e.invested_date,
                decimal_text(e.invested_amount),
                decimal_text(e.current_value),
            ])?;
        }
    }
    tx.commit()?;
    Ok(SavedTrades {
        report_id,
        inserted,
        skipped: entries.len() - inserted,
    })
}

/// Every trade entry of a user in storage order (report, then entry).
pub fn load_trade_entries(conn: &Connection, user_id: i64) -> Result<Vec<TradeEntry>> {
    let mut stmt = conn.prepare(
        "SELECT stock_name, invested_date, invested_amount, current_value
         FROM trade_entries WHERE user_id=?1 ORDER BY report_id, id",
    )?;
    let rows = stmt.query_map(params![user_id], trade_entry_from_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

fn article_from_row(r: &Row<'_>) -> rusqlite::Result<Article> {
    Ok(Article {
        id: r.get(0)?,
        author: r.get(1)?,
        title: r.get(2)?,
        section: r.get(3)?,
        created_at: r.get(4)?,
    })
}

/// Newest first.
pub fn list_articles(conn: &Connection) -> Result<Vec<Article>> {
    let mut stmt = conn.prepare(
        "SELECT id, author, title, section, created_at FROM articles
         ORDER BY created_at DESC, id DESC",
    )?;
    let rows = stmt.query_map([], article_from_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn create_article(conn: &Connection, author: &str, title: &str, section: &str) -> Result<Article> {
    conn.execute(
        "INSERT INTO articles(author, title, section) VALUES (?1, ?2, ?3)",
        params![author, title, section],
    )?;
    let id = conn.last_insert_rowid();
    let article = conn.query_row(
        "SELECT id, author, title, section, created_at FROM articles WHERE id=?1",
        params![id],
        article_from_row,
    )?;
    Ok(article)
}

pub fn count_articles(conn: &Connection) -> Result<i64> {
    let n = conn.query_row("SELECT COUNT(*) FROM articles", [], |r| r.get(0))?;
    Ok(n)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncompleteEntry {
    pub email: String,
    pub stock_name: String,
    pub missing: Vec<&'static str>,
}

/// Trade entries that aggregation will treat as zero or skip entirely.
pub fn incomplete_entries(conn: &Connection) -> Result<Vec<IncompleteEntry>> {
    let mut stmt = conn.prepare(
        "SELECT u.email, t.stock_name, t.invested_date IS NULL, t.invested_amount IS NULL,
                t.current_value IS NULL
         FROM trade_entries t JOIN users u ON u.id=t.user_id
         WHERE t.invested_date IS NULL OR t.invested_amount IS NULL OR t.current_value IS NULL
         ORDER BY u.email, t.id",
    )?;
    let rows = stmt.query_map([], |r| {
        let flags = [
            (r.get::<_, bool>(2)?, "investedDate"),
            (r.get::<_, bool>(3)?, "investedAmount"),
            (r.get::<_, bool>(4)?, "currentValue"),
        ];
        Ok(IncompleteEntry {
            email: r.get(0)?,
            stock_name: r.get(1)?,
            missing: flags
                .into_iter()
                .filter_map(|(is_null, field)| is_null.then_some(field))
                .collect(),
        })
    })?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// `(report id, public path)` of reports whose PDF is not in `reports_dir`.
pub fn missing_pdfs(conn: &Connection, reports_dir: &Path) -> Result<Vec<(i64, String)>> {
    let mut stmt =
        conn.prepare("SELECT id, report_pdf FROM reports WHERE report_pdf IS NOT NULL ORDER BY id")?;
    let rows = stmt.query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?;
    let mut out = Vec::new();
    for r in rows {
        let (id, public) = r?;
        let file = public.rsplit('/').next().unwrap_or_default();
        if file.is_empty() || !reports_dir.join(file).is_file() {
            out.push((id, public));
        }
    }
    Ok(out)
}
