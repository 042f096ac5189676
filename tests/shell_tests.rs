// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use mizan::commands::shell;
use mizan::{LedgerStore, MemoryStore, Session, SessionPolicy};

fn policy() -> SessionPolicy {
    SessionPolicy {
        max_login_attempts: 5,
        hash_iterations: 8,
    }
}

fn run_script(store: &MemoryStore, script: &str) -> String {
    let mut session = Session::new(store, policy());
    let mut out = Vec::new();
    shell::run(&mut session, script.as_bytes(), &mut out).unwrap();
    assert!(session.account().is_none());
    String::from_utf8(out).unwrap()
}

#[test]
fn scripted_session_records_and_summarizes() {
    let store = MemoryStore::new();
    let out = run_script(
        &store,
        "register ali abc123 abc123\n\
         add income 500,000 monthly salary\n\
         add expense food 150000 groceries\n\
         add expense الطعام 20000.5 bread\n\
         add expense rent 10 nope\n\
         list 2\n\
         summary\n\
         quit\n\
         add income 1 never read\n",
    );
    assert!(out.contains("registered and logged in as ali"));
    assert!(out.contains("added income 500,000.00 د.ل"));
    assert!(out.contains("added expense 150,000.00 د.ل (الطعام)"));
    assert!(out.contains("error: invalid input"));
    assert!(out.contains("balance: 329,999.50 د.ل"));
    assert!(out.contains("expenses: 170,000.50 د.ل"));
    assert!(out.contains("net: 329,999.50 د.ل"));
    assert!(out.contains("  الطعام: 170,000.50 د.ل"));

    let listed: Vec<&str> = out.lines().filter(|l| l.contains("  food  ")).collect();
    assert_eq!(listed.len(), 2);
    assert!(listed[0].ends_with("bread"));

    let account = store.find_account("ali").unwrap().unwrap();
    let stored = store.load(&account.user_id).unwrap();
    assert_eq!(stored.transactions.len(), 3);
    assert_eq!(stored.balance, "329999.50".parse::<rust_decimal::Decimal>().unwrap());
}

#[test]
fn shell_locks_out_after_five_failures() {
    let store = MemoryStore::new();
    run_script(&store, "register sara pass12 pass12\n");

    let out = run_script(
        &store,
        "login sara bad111\n\
         login sara bad222\n\
         login sara bad333\n\
         login sara bad444\n\
         login sara bad555\n\
         login sara pass12\n",
    );
    assert!(out.contains("wrong user name or password, 4 attempts left"));
    assert!(out.contains("wrong user name or password, 1 attempts left"));
    assert_eq!(out.matches("error: too many failed login attempts").count(), 2);
    assert!(!out.contains("welcome sara"));

    // A fresh session starts with a fresh counter.
    let out = run_script(&store, "login sara pass12\n");
    assert!(out.contains("welcome sara"));
}

#[test]
fn commands_before_login_report_errors_and_continue() {
    let store = MemoryStore::new();
    let out = run_script(
        &store,
        "list\n\
         add income 5 tip\n\
         frobnicate\n\
         register ali abc123 abc123\n\
         clear\n\
         refresh\n\
         logout\n",
    );
    assert_eq!(out.matches("error: no user is logged in").count(), 2);
    assert!(out.contains("unrecognized command; type 'help'"));
    assert!(out.contains("all transactions cleared"));
    assert!(out.contains("up to date"));
    assert!(out.contains("logged out"));
}
