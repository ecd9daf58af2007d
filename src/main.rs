// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use tradelens::config::Settings;
use tradelens::market::YahooClient;
use tradelens::utils::http_client;
use tradelens::{api, cli, commands, db};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tradelens=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let matches = cli::build_cli().get_matches();
    let mut settings = Settings::from_env()?;

    match matches.subcommand() {
        Some(("init", _)) => {
            db::open_or_init(&settings.db_path)?;
            std::fs::create_dir_all(&settings.reports_dir).with_context(|| {
                format!("Create reports dir {}", settings.reports_dir.display())
            })?;
            println!("Database initialized at {}", settings.db_path.display());
            println!("Reports directory: {}", settings.reports_dir.display());
        }
        Some(("serve", sub)) => {
            if let Some(port) = sub.get_one::<u16>("port") {
                settings.port = *port;
            }
            api::serve(&settings).await?;
        }
        Some(("user", sub)) => {
            let conn = db::open_or_init(&settings.db_path)?;
            commands::users::handle(&conn, sub)?;
        }
        Some(("trades", sub)) => {
            let conn = db::open_or_init(&settings.db_path)?;
            commands::trades::handle(&conn, sub)?;
        }
        Some(("report", sub)) => {
            let conn = db::open_or_init(&settings.db_path)?;
            commands::reports::handle(&conn, sub)?;
        }
        Some(("quote", sub)) => {
            let http = http_client(settings.http_timeout_secs)?;
            let market = YahooClient::new(http, &settings.yahoo_base_url);
            commands::quote::handle(&market, sub).await?;
        }
        Some(("doctor", _)) => {
            let conn = db::open_or_init(&settings.db_path)?;
            commands::doctor::handle(&conn, &settings.reports_dir)?;
        }
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
