// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use mizan::auth::hash_password;
use mizan::{
    LedgerError, LedgerStore, RemoteStore, Session, SessionPolicy, StoreError, SyncStatus,
    Transaction, TransactionKind,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};

fn policy() -> SessionPolicy {
    SessionPolicy {
        max_login_attempts: 5,
        hash_iterations: 8,
    }
}

#[derive(Debug, Clone)]
struct Request {
    method: String,
    target: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl Request {
    fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or("")
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

type Log = Arc<Mutex<Vec<Request>>>;

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut first = lines.next()?.split_whitespace();
    let method = first.next()?.to_string();
    let target = first.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    let len = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + len {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..header_end + len]).to_string();
    Some(Request {
        method,
        target,
        headers,
        body,
    })
}

/// Minimal PostgREST stand-in on a local port. Every request is recorded and
/// answered by `route`, one connection per request.
fn serve<F>(route: F) -> (String, Log)
where
    F: Fn(&Request) -> (u16, String) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&log);
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let Some(req) = read_request(&mut stream) else {
                continue;
            };
            let (status, body) = route(&req);
            seen.lock().unwrap().push(req);
            let resp = format!(
                "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(resp.as_bytes());
            let _ = stream.flush();
        }
    });
    (format!("http://{}", addr), log)
}

fn account_json(user_id: &str, user_name: &str, password: &str) -> Value {
    json!({
        "user_id": user_id,
        "user_name": user_name,
        "password_hash": hash_password(password, 8),
        "balance": "0",
        "created_at": "2025-01-01T00:00:00Z",
    })
}

#[test]
fn duplicate_user_name_maps_to_conflict() {
    let (url, log) = serve(|req| match (req.method.as_str(), req.path()) {
        // ignore-duplicates answers with an empty representation
        ("POST", "/rest/v1/accounts") => (201, "[]".into()),
        _ => (404, "{}".into()),
    });
    let store = RemoteStore::new(&url, Some("anon-key")).unwrap();
    let mut s = Session::new(&store, policy());

    let err = s.register("ali", "abc123", "abc123").unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(ref name) if name == "ali"));
    assert!(s.account().is_none());

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 1);
    let req = &log[0];
    assert!(req.target.contains("on_conflict=user_name"));
    assert!(req.header("prefer").unwrap().contains("ignore-duplicates"));
    assert_eq!(req.header("apikey"), Some("anon-key"));
    assert_eq!(req.header("authorization"), Some("Bearer anon-key"));
    let sent: Value = serde_json::from_str(&req.body).unwrap();
    assert_eq!(sent[0]["user_name"], "ali");
}

#[test]
fn first_login_before_any_save_gets_empty_ledger() {
    let account = account_json("u1", "ali", "abc123");
    let (url, _log) = serve(move |req| match (req.method.as_str(), req.path()) {
        ("GET", "/rest/v1/accounts") if req.target.contains("user_name=eq.ali") => {
            (200, json!([account]).to_string())
        }
        ("GET", "/rest/v1/accounts") if req.target.contains("user_id=eq.u1") => {
            (200, json!([{ "user_id": "u1" }]).to_string())
        }
        ("GET", "/rest/v1/accounts") | ("GET", "/rest/v1/ledgers") => (200, "[]".into()),
        _ => (404, "{}".into()),
    });
    let store = RemoteStore::new(&url, None).unwrap();
    let mut s = Session::new(&store, policy());

    assert_eq!(s.login("ali", "abc123").unwrap().user_id, "u1");
    let ledger = s.ledger().unwrap();
    assert!(ledger.is_empty());
    assert_eq!(ledger.balance(), Decimal::ZERO);

    // No ledger row and no account row: the user does not exist.
    assert!(matches!(store.load("ghost"), Err(StoreError::NotFound(id)) if id == "ghost"));
}

#[test]
fn stored_ledger_row_is_read_back() {
    let t = Transaction::new(TransactionKind::Income, "1250.50".parse().unwrap(), "salary", None)
        .unwrap();
    let row = json!([{
        "user_id": "u1",
        "balance": "1250.50",
        "transactions": [t],
        "updated_at": "2025-01-02T00:00:00Z",
    }]);
    let (url, _log) = serve(move |req| match (req.method.as_str(), req.path()) {
        ("GET", "/rest/v1/ledgers") => (200, row.to_string()),
        _ => (404, "{}".into()),
    });
    let store = RemoteStore::new(&url, None).unwrap();

    let stored = store.load("u1").unwrap();
    assert_eq!(stored.balance, "1250.50".parse::<Decimal>().unwrap());
    assert_eq!(stored.transactions, vec![t]);
}

#[test]
fn server_error_on_save_keeps_ledger_unsynced_until_refresh() {
    let account = account_json("u1", "ali", "abc123");
    let down = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&down);
    let (url, log) = serve(move |req| match (req.method.as_str(), req.path()) {
        ("GET", "/rest/v1/accounts") if req.target.contains("user_name=eq.ali") => {
            (200, json!([account]).to_string())
        }
        ("GET", "/rest/v1/accounts") => (200, json!([{ "user_id": "u1" }]).to_string()),
        ("GET", "/rest/v1/ledgers") => (200, "[]".into()),
        ("POST", "/rest/v1/ledgers") if flag.load(Ordering::SeqCst) => {
            (503, "upstream unavailable".into())
        }
        ("POST", "/rest/v1/ledgers") => (201, String::new()),
        ("PATCH", "/rest/v1/accounts") => (204, String::new()),
        _ => (404, "{}".into()),
    });
    let store = RemoteStore::new(&url, Some("k")).unwrap();
    let mut s = Session::new(&store, policy());
    s.login("ali", "abc123").unwrap();

    let r = s
        .add_transaction(TransactionKind::Income, "300".parse().unwrap(), "pay", None)
        .unwrap();
    match &r.sync {
        SyncStatus::Unsynced(reason) => {
            assert!(reason.contains("503"));
            assert!(reason.contains("upstream unavailable"));
        }
        other => panic!("expected unsynced, got {:?}", other),
    }
    assert!(s.is_dirty());
    assert_eq!(s.ledger().unwrap().len(), 1);
    assert_eq!(s.ledger().unwrap().balance(), "300".parse::<Decimal>().unwrap());

    down.store(false, Ordering::SeqCst);
    assert_eq!(s.refresh().unwrap(), SyncStatus::Saved);
    assert!(!s.is_dirty());

    let log = log.lock().unwrap();
    let upserts: Vec<&Request> = log
        .iter()
        .filter(|r| r.method == "POST" && r.path() == "/rest/v1/ledgers")
        .collect();
    assert_eq!(upserts.len(), 2);
    let last = upserts[1];
    assert!(last.target.contains("on_conflict=user_id"));
    assert!(last.header("prefer").unwrap().contains("merge-duplicates"));
    let sent: Value = serde_json::from_str(&last.body).unwrap();
    assert_eq!(sent[0]["user_id"], "u1");
    assert_eq!(sent[0]["balance"], "300");
    assert_eq!(sent[0]["transactions"][0]["description"], "pay");

    let mirror = log
        .iter()
        .find(|r| r.method == "PATCH")
        .expect("balance mirror");
    assert!(mirror.target.contains("user_id=eq.u1"));
}
