// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::required;
use crate::extract::clean_report;
use crate::render::render_pdf;
use crate::store;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("render", sub)) => render(sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn render(sub: &clap::ArgMatches) -> Result<()> {
    let input = required(sub, "input")?;
    let out = required(sub, "out")?;
    let title = required(sub, "title")?;
    let raw = std::fs::read_to_string(input).with_context(|| format!("Read {}", input))?;
    // Text without numbered headings is rendered as-is.
    let cleaned = clean_report(&raw);
    let text = if cleaned.trim().is_empty() { raw } else { cleaned };
    render_pdf(&text, title, Path::new(out))?;
    println!("Rendered {} to {}", input, out);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let email = required(sub, "email")?.trim().to_lowercase();
    let user = store::find_user(conn, &email)?
        .with_context(|| format!("Unknown user '{}'", email))?;
    let reports = store::list_reports(conn, user.id)?;
    if !maybe_print_json(sub.get_flag("json"), &reports)? {
        let rows = reports
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.name.clone(),
                    r.created_at.clone(),
                    r.assets.len().to_string(),
                    r.trade_entries.len().to_string(),
                    r.report_pdf.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Name", "Created", "Assets", "Trades", "PDF"], rows)
        );
    }
    Ok(())
}
