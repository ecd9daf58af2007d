// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rusqlite::Connection;
use serde_json::json;
use tempfile::tempdir;
use tradelens::models::TradeEntry;
use tradelens::{cli, commands::trades, db, store};

fn seeded_conn() -> Connection {
    let mut conn = db::open_in_memory().unwrap();
    let user = store::create_user(&conn, "Asha", "asha@example.com", "hash")
        .unwrap()
        .unwrap();
    let entries = vec![
        TradeEntry {
            stock_name: "INFY".into(),
            invested_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            invested_amount: Some(Decimal::new(100000, 2)),
            current_value: Some(Decimal::new(120000, 2)),
        },
        TradeEntry {
            stock_name: "PAYTM".into(),
            invested_date: None,
            invested_amount: None,
            current_value: Some(Decimal::new(5000, 0)),
        },
    ];
    store::append_trade_report(&mut conn, user.id, "Trade Report", &entries).unwrap();
    conn
}

fn run(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["tradelens", "trades", "export"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let (_, sub) = matches.subcommand().unwrap();
    trades::handle(conn, sub)
}

#[test]
fn export_trades_as_pretty_json() {
    let conn = seeded_conn();
    let dir = tempdir().unwrap();
    let out = dir.path().join("trades.json");
    let out_str = out.to_string_lossy().to_string();

    run(
        &conn,
        &["--email", "Asha@Example.com", "--format", "json", "--out", &out_str],
    )
    .unwrap();

    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.contains('\n'), "expected pretty-printed output");
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        value,
        json!([
            {
                "stockName": "INFY",
                "investedDate": "2025-01-01",
                "investedAmount": "1000",
                "currentValue": "1200"
            },
            {
                "stockName": "PAYTM",
                "investedDate": null,
                "investedAmount": null,
                "currentValue": "5000"
            }
        ])
    );
}

#[test]
fn export_trades_as_csv_leaves_unknowns_blank() {
    let conn = seeded_conn();
    let dir = tempdir().unwrap();
    let out = dir.path().join("trades.csv");
    let out_str = out.to_string_lossy().to_string();

    run(&conn, &["--email", "asha@example.com", "--out", &out_str]).unwrap();

    let mut rdr = csv::Reader::from_path(&out).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec![
            "stock_name",
            "invested_date",
            "invested_amount",
            "current_value",
            "profit_or_loss"
        ]
    );
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][2], "1000");
    assert_eq!(&rows[0][4], "200");
    assert_eq!(&rows[1][0], "PAYTM");
    assert_eq!(&rows[1][1], "");
    assert_eq!(&rows[1][4], "");
}

#[test]
fn export_rejects_unknown_users_and_formats() {
    let conn = seeded_conn();
    let dir = tempdir().unwrap();
    let out_str = dir.path().join("x").to_string_lossy().to_string();

    let err = run(&conn, &["--email", "ghost@example.com", "--out", &out_str]).unwrap_err();
    assert!(err.to_string().contains("Unknown user"));

    let parsed = cli::build_cli().try_get_matches_from([
        "tradelens",
        "trades",
        "export",
        "--email",
        "asha@example.com",
        "--format",
        "xml",
        "--out",
        &out_str,
    ]);
    assert!(parsed.is_err());
}
