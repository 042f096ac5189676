// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};

use mizan::config::{Backend, Config};
use mizan::session::{Session, SessionPolicy};
use mizan::{cli, commands, logging, store};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();
    logging::init(matches.get_flag("verbose"));

    let config = Config::load().context("Load configuration")?;
    let store = store::open(&config).context("Open persistence backend")?;
    let policy = SessionPolicy::from(&config);

    match matches.subcommand() {
        Some(("init", _)) => match &config.backend {
            Backend::Sqlite { path } => println!("Database initialized at {}", path.display()),
            other => println!("Using {} backend; nothing to initialize", other.kind()),
        },
        Some(("register", sub)) => commands::accounts::register(store.as_ref(), policy, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(store.as_ref(), policy, sub)?,
        Some(("report", sub)) => commands::reports::handle(store.as_ref(), policy, sub)?,
        Some(("export", sub)) => commands::exporter::handle(store.as_ref(), policy, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(store.as_ref())?,
        Some(("shell", _)) => {
            let mut session = Session::new(store.as_ref(), policy);
            let stdin = std::io::stdin();
            commands::shell::run(&mut session, stdin.lock(), std::io::stdout())?;
        }
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
