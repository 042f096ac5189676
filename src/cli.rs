// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

fn user_arg() -> Arg {
    Arg::new("user")
        .long("user")
        .short('u')
        .required(true)
        .help("User name")
}

fn password_arg() -> Arg {
    Arg::new("password")
        .long("password")
        .short('p')
        .env("MIZAN_PASSWORD")
        .hide_env_values(true)
        .required(true)
        .help("Account password")
}

fn json_args() -> [Arg; 2] {
    [
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON"),
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    ]
}

pub fn build_cli() -> Command {
    Command::new("mizan")
        .version(clap::crate_version!())
        .about("Personal income and expense ledger in Libyan dinars")
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging on stderr"),
        )
        .subcommand(Command::new("init").about("Create the data directory and database"))
        .subcommand(
            Command::new("register")
                .about("Create an account")
                .arg(user_arg())
                .arg(password_arg())
                .arg(
                    Arg::new("confirm")
                        .long("confirm")
                        .help("Repeat the password (defaults to --password)"),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Transactions")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .about("Record an income or expense")
                        .arg(user_arg())
                        .arg(password_arg())
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .short('t')
                                .required(true)
                                .value_parser(["income", "expense"]),
                        )
                        .arg(Arg::new("amount").long("amount").short('a').required(true))
                        .arg(Arg::new("desc").long("desc").short('d').required(true))
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .short('c')
                                .help("food|transport|bills|shopping|entertainment|health|other"),
                        ),
                )
                .subcommand(
                    Command::new("list")
                        .about("List transactions, newest first")
                        .arg(user_arg())
                        .arg(password_arg())
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        )
                        .args(json_args()),
                )
                .subcommand(
                    Command::new("clear")
                        .about("Delete every transaction and reset the balance")
                        .arg(user_arg())
                        .arg(password_arg())
                        .arg(
                            Arg::new("yes")
                                .long("yes")
                                .action(ArgAction::SetTrue)
                                .help("Confirm the reset"),
                        ),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Reports")
                .subcommand_required(true)
                .subcommand(
                    Command::new("summary")
                        .about("Balance, totals and spending by category")
                        .arg(user_arg())
                        .arg(password_arg())
                        .args(json_args()),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand_required(true)
                .subcommand(
                    Command::new("transactions")
                        .about("Write all transactions as CSV or JSON")
                        .arg(user_arg())
                        .arg(password_arg())
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("csv")
                                .help("csv|json"),
                        )
                        .arg(Arg::new("out").long("out").short('o').required(true)),
                ),
        )
        .subcommand(
            Command::new("doctor").about("Check stored balances against transaction logs"),
        )
        .subcommand(Command::new("shell").about("Interactive session on stdin"))
}
