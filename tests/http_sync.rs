//! End-to-end sync against a local HTTP server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use budgeto_lib::budget::ledger::BudgetLedger;
use budgeto_lib::budget::{BudgetEntry, BudgetEntryType};
use budgeto_lib::db::Database;
use budgeto_lib::storage;
use budgeto_lib::storage::queue::{self, SyncOpType, SyncOperation};
use budgeto_lib::sync::http::HttpTransport;
use budgeto_lib::sync::{SyncService, SyncTransport};

#[derive(Clone, Default)]
struct ServerState {
    received: Arc<Mutex<Vec<SyncOperation>>>,
    entries: Arc<Mutex<Vec<BudgetEntry>>>,
    reject_after: Option<usize>,
    snapshot_broken: bool,
}

async fn handle_sync(
    State(state): State<ServerState>,
    Json(op): Json<SyncOperation>,
) -> StatusCode {
    let mut received = state.received.lock().unwrap();
    if state.reject_after.is_some_and(|limit| received.len() >= limit) {
        return StatusCode::SERVICE_UNAVAILABLE;
    }

    let mut entries = state.entries.lock().unwrap();
    let payload = &op.payload;
    match op.op_type {
        SyncOpType::Add => entries.push(BudgetEntry {
            id: payload.entry_id.clone(),
            amount: payload.amount.unwrap_or_default(),
            description: payload.description.clone().unwrap_or_default(),
            entry_type: payload.entry_type.unwrap_or(BudgetEntryType::Expense),
            created_at: payload.created_at.clone().unwrap_or_default(),
        }),
        SyncOpType::Update => {
            if let Some(entry) = entries.iter_mut().find(|e| e.id == payload.entry_id) {
                entry.amount = payload.amount.unwrap_or(entry.amount);
                if let Some(description) = &payload.description {
                    entry.description = description.clone();
                }
            }
        }
        SyncOpType::Delete => entries.retain(|e| e.id != payload.entry_id),
    }
    received.push(op);
    StatusCode::OK
}

async fn handle_entries(
    State(state): State<ServerState>,
) -> Result<Json<Vec<BudgetEntry>>, StatusCode> {
    if state.snapshot_broken {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    Ok(Json(state.entries.lock().unwrap().clone()))
}

async fn spawn_server(state: ServerState) -> String {
    let app = Router::new()
        .route("/api/sync", post(handle_sync))
        .route("/api/entries", get(handle_entries))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api", addr)
}

fn server_entry(id: &str, amount: f64) -> BudgetEntry {
    BudgetEntry {
        id: id.into(),
        amount,
        description: "from another device".into(),
        entry_type: BudgetEntryType::Income,
        created_at: "2026-01-01T00:00:00.000Z".into(),
    }
}

fn transport(base: &str) -> HttpTransport {
    HttpTransport::new(base, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn offline_changes_replay_then_snapshot_wins() {
    let state = ServerState::default();
    state.entries.lock().unwrap().push(server_entry("remote-1", 500.0));
    let base = spawn_server(state.clone()).await;

    let db = Arc::new(Database::open_in_memory().unwrap());
    let mut ledger = BudgetLedger::new(db.clone());
    ledger.load(None).unwrap();
    let rent = ledger.add_entry(BudgetEntryType::Expense, 900.0, "rent").unwrap();
    let coffee = ledger.add_entry(BudgetEntryType::Expense, 4.0, "coffee").unwrap();
    ledger.update_entry(&rent.id, 950.0, "rent (new lease)").unwrap();
    ledger.delete_entry(&coffee.id).unwrap();

    let service = SyncService::new(Some(transport(&base)));
    let report = service.start_sync(&db).await.unwrap();
    assert_eq!(report.replayed, 4);
    assert_eq!(report.remaining, 0);
    assert!(report.snapshot_applied);

    let received = state.received.lock().unwrap().clone();
    let types: Vec<_> = received.iter().map(|op| op.op_type).collect();
    assert_eq!(
        types,
        vec![SyncOpType::Add, SyncOpType::Add, SyncOpType::Update, SyncOpType::Delete]
    );

    ledger.reload().unwrap();
    let ids: Vec<_> = ledger.entries().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"remote-1"));
    assert_eq!(ledger.find(&rent.id).unwrap().amount, 950.0);
    assert!(ledger.find(&coffee.id).is_none());
    assert_eq!(ledger.total_income(), 500.0);
}

#[tokio::test]
async fn server_rejection_leaves_rest_queued() {
    let state = ServerState {
        reject_after: Some(1),
        ..Default::default()
    };
    let base = spawn_server(state.clone()).await;

    let db = Database::open_in_memory().unwrap();
    for amount in [1.0, 2.0, 3.0] {
        storage::add_entry(&db, &BudgetEntry::new(BudgetEntryType::Income, amount, "")).unwrap();
    }

    let service = SyncService::new(Some(transport(&base)));
    let report = service.replay_queue(&db).await.unwrap();
    assert_eq!(report.replayed, 1);
    assert_eq!(report.remaining, 2);
    assert!(report.stopped_early);
    assert!(report.snapshot_applied);

    assert_eq!(queue::queue_len(&db).unwrap(), 2);
    // Snapshot wins: only the delivered entry survives locally.
    assert_eq!(storage::get_all_entries(&db).unwrap().len(), 1);
}

#[tokio::test]
async fn probe_reports_live_server() {
    let base = spawn_server(ServerState::default()).await;
    assert!(transport(&base).probe().await);
    assert!(transport(&base).fetch_snapshot().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_snapshot_keeps_local_entries() {
    let state = ServerState {
        snapshot_broken: true,
        ..Default::default()
    };
    let base = spawn_server(state.clone()).await;

    let db = Database::open_in_memory().unwrap();
    let local = BudgetEntry::new(BudgetEntryType::Expense, 12.0, "lunch");
    storage::add_entry(&db, &local).unwrap();

    let http = transport(&base);
    assert!(http.fetch_snapshot().await.is_err());
    assert!(!http.probe().await);

    let service = SyncService::new(Some(http));
    let report = service.replay_queue(&db).await.unwrap();
    assert_eq!(report.replayed, 1);
    assert_eq!(report.remaining, 0);
    assert!(!report.snapshot_applied);

    assert_eq!(state.received.lock().unwrap().len(), 1);
    assert_eq!(storage::get_all_entries(&db).unwrap(), vec![local]);
}
