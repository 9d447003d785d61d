#![allow(dead_code)] // Test helpers appear unused when compiled independently

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, post},
};
use hue_bridge::{Bridges, Discover, Error};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Discoverer returning a fixed set of bridges and counting its calls.
pub struct ScriptedDiscoverer {
    bridges: Bridges,
    calls: Arc<AtomicUsize>,
}

impl ScriptedDiscoverer {
    pub fn new(bridges: Bridges) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            ScriptedDiscoverer {
                bridges,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl Discover for ScriptedDiscoverer {
    async fn discover(&self) -> Result<Bridges, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.bridges.clone())
    }
}

/// What the mock bridge saw and how it should answer.
#[derive(Default)]
pub struct BridgeState {
    pub link_pressed: AtomicBool,
    pub refuse_unregister: AtomicBool,
    pub registrations: AtomicUsize,
    pub registration_bodies: Mutex<Vec<Value>>,
    pub unregistered: Mutex<Vec<(String, String)>>,
}

impl BridgeState {
    pub fn pressed() -> Arc<Self> {
        let state = BridgeState::default();
        state.link_pressed.store(true, Ordering::SeqCst);
        Arc::new(state)
    }

    pub fn not_pressed() -> Arc<Self> {
        Arc::new(BridgeState::default())
    }

    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }
}

pub struct MockBridge {
    pub uri: String,
    handle: JoinHandle<()>,
}

impl Drop for MockBridge {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn register(State(state): State<Arc<BridgeState>>, Json(body): Json<Value>) -> Json<Value> {
    state.registrations.fetch_add(1, Ordering::SeqCst);
    state.registration_bodies.lock().unwrap().push(body);

    if state.link_pressed.load(Ordering::SeqCst) {
        Json(json!([{"success": {"username": "abc123"}}]))
    } else {
        Json(json!([{"error": {
            "type": 101,
            "address": "",
            "description": "link button not pressed"
        }}]))
    }
}

async fn unregister(
    State(state): State<Arc<BridgeState>>,
    Path((user, app)): Path<(String, String)>,
) -> Json<Value> {
    state
        .unregistered
        .lock()
        .unwrap()
        .push((user.clone(), app.clone()));

    if state.refuse_unregister.load(Ordering::SeqCst) {
        Json(json!([{"error": {
            "type": 1,
            "address": format!("/config/whitelist/{app}"),
            "description": "unauthorized user"
        }}]))
    } else {
        Json(json!([{"success": format!("/config/whitelist/{app} deleted")}]))
    }
}

/// Serve a minimal bridge API on a random loopback port.
pub async fn spawn_bridge(state: Arc<BridgeState>) -> MockBridge {
    let app = Router::new()
        .route("/api", post(register))
        .route("/api/:user/config/whitelist/:app", delete(unregister))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBridge {
        uri: format!("http://{addr}/api"),
        handle,
    }
}
