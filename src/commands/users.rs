// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::required;
use crate::auth::hash_password;
use crate::store;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{bail, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = required(sub, "name")?.trim();
    let email = required(sub, "email")?.trim().to_lowercase();
    let password = required(sub, "password")?;
    let hash = hash_password(password)?;
    match store::create_user(conn, name, &email, &hash)? {
        Some(user) => println!("Added user {} <{}> (id {})", user.name, user.email, user.id),
        None => bail!("User '{}' already exists", email),
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let users = store::list_users(conn)?;
    if !maybe_print_json(sub.get_flag("json"), &users)? {
        let rows = users
            .iter()
            .map(|u| vec![u.id.to_string(), u.name.clone(), u.email.clone(), u.created_at.clone()])
            .collect();
        println!("{}", pretty_table(&["ID", "Name", "Email", "Created"], rows));
    }
    Ok(())
}
