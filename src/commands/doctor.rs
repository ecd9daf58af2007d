// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;

pub fn handle(conn: &Connection, reports_dir: &Path) -> Result<()> {
    let mut rows = Vec::new();

    // 1) Entries aggregation will skip (no date) or count as zero
    for e in store::incomplete_entries(conn)? {
        rows.push(vec![
            "incomplete_trade".into(),
            format!("{} {} missing {}", e.email, e.stock_name, e.missing.join(", ")),
        ]);
    }

    // 2) Reports whose PDF is gone from the reports dir
    for (id, path) in store::missing_pdfs(conn, reports_dir)? {
        rows.push(vec!["missing_pdf".into(), format!("report {} {}", id, path)]);
    }

    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
