//! Session store behavior against an in-memory store.

mod common;

use common::{Fail, FlakyStore};
use kvkit::{KvClient, SessionStore, DEFAULT_SESSION_TTL};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DashboardSession {
    user_id: String,
    role: Role,
    preferences: BTreeMap<String, String>,
    last_invoice: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Role {
    Admin,
    Client,
}

fn session() -> DashboardSession {
    let mut preferences = BTreeMap::new();
    preferences.insert("theme".to_string(), "dark".to_string());
    DashboardSession {
        user_id: "user-123".to_string(),
        role: Role::Admin,
        preferences,
        last_invoice: Some(1042),
    }
}

#[tokio::test]
async fn test_set_then_get_round_trips() {
    let sessions = KvClient::in_memory().sessions::<DashboardSession>();
    sessions.set("user-123", &session()).await.unwrap();
    assert_eq!(sessions.get("user-123").await.unwrap(), Some(session()));
}

#[tokio::test]
async fn test_unknown_principal_is_absent() {
    let sessions = KvClient::in_memory().sessions::<DashboardSession>();
    assert_eq!(sessions.get("nobody").await.unwrap(), None);
}

#[tokio::test]
async fn test_delete_then_get_is_absent_and_delete_is_idempotent() {
    let sessions = KvClient::in_memory().sessions::<DashboardSession>();
    sessions.set("user-123", &session()).await.unwrap();

    assert_ok!(sessions.delete("user-123").await);
    assert_eq!(sessions.get("user-123").await.unwrap(), None);
    assert_ok!(sessions.delete("user-123").await);
    assert_ok!(sessions.delete("never-existed").await);
}

#[tokio::test]
async fn test_last_writer_wins() {
    let sessions = KvClient::in_memory().sessions::<DashboardSession>();
    sessions.set("user-123", &session()).await.unwrap();
    let client_view = DashboardSession {
        role: Role::Client,
        last_invoice: None,
        ..session()
    };
    sessions.set("user-123", &client_view).await.unwrap();
    assert_eq!(sessions.get("user-123").await.unwrap(), Some(client_view));
}

#[tokio::test(start_paused = true)]
async fn test_default_lifetime_is_one_day() {
    let sessions = KvClient::in_memory().sessions::<DashboardSession>();
    assert_eq!(sessions.default_ttl(), DEFAULT_SESSION_TTL);
    sessions.set("user-123", &session()).await.unwrap();

    tokio::time::advance(DEFAULT_SESSION_TTL - Duration::from_secs(1)).await;
    assert!(sessions.get("user-123").await.unwrap().is_some());

    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(sessions.get("user-123").await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_principals_are_isolated() {
    let sessions = KvClient::in_memory().sessions::<DashboardSession>();
    sessions
        .set_with_ttl("short", &session(), Duration::from_secs(5))
        .await
        .unwrap();
    sessions.set("long", &session()).await.unwrap();

    tokio::time::advance(Duration::from_secs(5)).await;
    assert!(sessions.get("short").await.unwrap().is_none());
    assert!(sessions.get("long").await.unwrap().is_some());
}

#[tokio::test]
async fn test_store_failures_surface() {
    let store = Arc::new(FlakyStore::new());
    let sessions: SessionStore<DashboardSession> = SessionStore::new(store.clone());

    store.fail(Fail::Set);
    assert!(assert_err!(sessions.set("user-123", &session()).await).is_store_unavailable());

    store.fail(Fail::Get);
    assert!(assert_err!(sessions.get("user-123").await).is_store_unavailable());

    store.fail(Fail::Delete);
    assert!(assert_err!(sessions.delete("user-123").await).is_store_unavailable());
}
