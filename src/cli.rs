// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, command, value_parser};

fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print JSON instead of a table")
}

fn email_arg() -> Arg {
    Arg::new("email").long("email").required(true)
}

fn range_cmd(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(email_arg())
        .arg(Arg::new("from").long("from").required(true).help("YYYY-MM-DD"))
        .arg(Arg::new("to").long("to").required(true).help("YYYY-MM-DD"))
        .arg(json_flag())
}

pub fn build_cli() -> Command {
    command!()
        .name("tradelens")
        .about("Portfolio screenshots in, trade analytics and PDF reports out")
        .subcommand_required(false)
        .subcommand(Command::new("init").about("Create the database and reports directory"))
        .subcommand(
            Command::new("serve").about("Run the HTTP API").arg(
                Arg::new("port")
                    .long("port")
                    .value_parser(value_parser!(u16))
                    .help("Overrides PORT"),
            ),
        )
        .subcommand(
            Command::new("user")
                .about("Manage users")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(email_arg())
                        .arg(Arg::new("password").long("password").required(true)),
                )
                .subcommand(Command::new("list").arg(json_flag())),
        )
        .subcommand(
            Command::new("trades")
                .about("Analyse a user's saved trades")
                .subcommand(range_cmd("summary", "Totals and return over a date range"))
                .subcommand(range_cmd("by-date", "Profit per invested date"))
                .subcommand(range_cmd("by-stock", "Profit per stock per invested date"))
                .subcommand(range_cmd("evaluate", "Totals plus top gainers and losers"))
                .subcommand(
                    Command::new("export")
                        .about("Export trade entries")
                        .arg(email_arg())
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("csv")
                                .value_parser(["csv", "json"]),
                        )
                        .arg(Arg::new("out").long("out").required(true)),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Advisory reports")
                .subcommand(
                    Command::new("render")
                        .about("Render a report text file to PDF")
                        .arg(Arg::new("input").long("input").required(true))
                        .arg(Arg::new("out").long("out").required(true))
                        .arg(Arg::new("title").long("title").default_value("Portfolio Report")),
                )
                .subcommand(Command::new("list").arg(email_arg()).arg(json_flag())),
        )
        .subcommand(
            Command::new("quote")
                .about("Market data")
                .subcommand(
                    Command::new("get")
                        .arg(
                            Arg::new("symbols")
                                .required(true)
                                .num_args(1..)
                                .help("Bare NSE tickers get a .NS suffix"),
                        )
                        .arg(json_flag()),
                )
                .subcommand(
                    Command::new("history")
                        .arg(Arg::new("symbol").required(true))
                        .arg(Arg::new("from").long("from").required(true))
                        .arg(Arg::new("to").long("to").required(true))
                        .arg(json_flag()),
                ),
        )
        .subcommand(Command::new("doctor").about("Check stored data for gaps"))
}
