mod helpers;

use std::sync::atomic::Ordering;

use helpers::{BridgeState, ScriptedDiscoverer, spawn_bridge};
use hue_bridge::{ApplicationRecord, BridgeRecord, Bridges, ConfigStore, Error, Registrar};
use serde_json::json;

fn store() -> (tempfile::TempDir, ConfigStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::new(dir.path());
    (dir, store)
}

#[tokio::test]
async fn register_resolve_remove() {
    let state = BridgeState::pressed();
    let bridge = spawn_bridge(state.clone()).await;
    let (_dir, store) = store();
    let (discoverer, discoveries) =
        ScriptedDiscoverer::new(Bridges::from_iter([("U1", bridge.uri.as_str())]));
    let registrar = Registrar::new(store.clone(), discoverer).unwrap();

    let handle = registrar.register_default().await.unwrap();
    assert_eq!(handle.application_id(), "abc123");
    assert_eq!(handle.base_uri(), bridge.uri);

    assert_eq!(
        store.find_bridge("U1").unwrap(),
        Some(BridgeRecord::new("U1", &bridge.uri))
    );
    assert_eq!(
        store.default_application().unwrap(),
        ApplicationRecord::new("U1", "abc123")
    );
    assert_eq!(
        *state.registration_bodies.lock().unwrap(),
        vec![json!({"devicetype": "hue-lib"})]
    );

    // Fast path: cached bridge, no further discovery.
    let resolved = registrar.resolve_default().await.unwrap();
    assert_eq!(resolved.application_id(), "abc123");
    assert_eq!(resolved.base_uri(), bridge.uri);
    assert_eq!(discoveries.load(Ordering::SeqCst), 1);

    let removal = registrar.remove_default().await.unwrap();
    assert!(removal.is_clean());
    assert_eq!(removal.application_id, "abc123");
    assert_eq!(
        *state.unregistered.lock().unwrap(),
        vec![("abc123".to_string(), "abc123".to_string())]
    );

    assert!(matches!(
        registrar.resolve_default().await,
        Err(Error::NotConfigured)
    ));
    // Bridge records are a cache and survive removal.
    assert!(store.find_bridge("U1").unwrap().is_some());
}

#[tokio::test]
async fn second_registration_is_rejected_without_network_io() {
    let state = BridgeState::pressed();
    let bridge = spawn_bridge(state.clone()).await;
    let (_dir, store) = store();
    let (discoverer, discoveries) =
        ScriptedDiscoverer::new(Bridges::from_iter([("U1", bridge.uri.as_str())]));
    let registrar = Registrar::new(store, discoverer).unwrap();

    registrar.register_default().await.unwrap();
    let second = registrar.register_default().await;

    assert!(matches!(second, Err(Error::AlreadyRegistered)));
    assert_eq!(discoveries.load(Ordering::SeqCst), 1);
    assert_eq!(state.registrations(), 1);
}

#[tokio::test]
async fn resolve_without_registration_is_not_configured() {
    let (_dir, store) = store();
    let (discoverer, discoveries) = ScriptedDiscoverer::new(Bridges::new());
    let registrar = Registrar::new(store, discoverer).unwrap();

    assert!(matches!(
        registrar.resolve_default().await,
        Err(Error::NotConfigured)
    ));
    assert!(matches!(
        registrar.remove_default().await,
        Err(Error::NotConfigured)
    ));
    assert_eq!(discoveries.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_discovery_is_no_bridge_found() {
    let (_dir, store) = store();
    let (discoverer, _) = ScriptedDiscoverer::new(Bridges::new());
    let registrar = Registrar::new(store.clone(), discoverer).unwrap();

    assert!(matches!(
        registrar.register_default().await,
        Err(Error::NoBridgeFound)
    ));
    assert_eq!(store.find_default_application().unwrap(), None);
}

#[tokio::test]
async fn link_button_not_pressed() {
    let state = BridgeState::not_pressed();
    let bridge = spawn_bridge(state.clone()).await;
    let (_dir, store) = store();
    let (discoverer, _) =
        ScriptedDiscoverer::new(Bridges::from_iter([("U1", bridge.uri.as_str())]));
    let registrar = Registrar::new(store.clone(), discoverer).unwrap();

    match registrar.register_default().await {
        Err(Error::Api(err)) => {
            assert!(err.is_link_button_not_pressed());
            assert_eq!(err.description, "link button not pressed");
        }
        other => panic!("expected link button error, got {:?}", other),
    }
    assert_eq!(store.find_default_application().unwrap(), None);
    // Discovered bridges are cached even when registration fails.
    assert!(store.find_bridge("U1").unwrap().is_some());

    // Pressing the button and retrying succeeds.
    state.link_pressed.store(true, Ordering::SeqCst);
    registrar.register_default().await.unwrap();
    assert_eq!(state.registrations(), 2);
}

#[tokio::test]
async fn first_bridge_wins_and_all_are_cached() {
    let state = BridgeState::pressed();
    let bridge = spawn_bridge(state.clone()).await;
    let (_dir, store) = store();
    let (discoverer, _) = ScriptedDiscoverer::new(Bridges::from_iter([
        ("U1", bridge.uri.as_str()),
        ("U2", "http://10.0.0.6/api"),
    ]));
    let registrar = Registrar::new(store.clone(), discoverer)
        .unwrap()
        .device_type("hue-bridge-tests");

    registrar.register_default().await.unwrap();

    assert_eq!(store.default_application().unwrap().bridge_id, "U1");
    assert_eq!(store.bridges().unwrap().len(), 2);
    assert_eq!(
        *state.registration_bodies.lock().unwrap(),
        vec![json!({"devicetype": "hue-bridge-tests"})]
    );
}

#[tokio::test]
async fn remove_deletes_locally_when_bridge_refuses() {
    let state = BridgeState::pressed();
    state.refuse_unregister.store(true, Ordering::SeqCst);
    let bridge = spawn_bridge(state.clone()).await;
    let (_dir, store) = store();
    let (discoverer, _) =
        ScriptedDiscoverer::new(Bridges::from_iter([("U1", bridge.uri.as_str())]));
    let registrar = Registrar::new(store.clone(), discoverer).unwrap();

    registrar.register_default().await.unwrap();
    let removal = registrar.remove_default().await.unwrap();

    assert!(!removal.is_clean());
    assert!(matches!(removal.unregister_error, Some(Error::Api(_))));
    assert_eq!(state.unregistered.lock().unwrap().len(), 1);
    assert!(matches!(
        registrar.resolve_default().await,
        Err(Error::NotConfigured)
    ));
}

#[tokio::test]
async fn remove_deletes_locally_when_bridge_unreachable() {
    let (_dir, store) = store();
    store
        .write_bridge(&BridgeRecord::new("U1", "http://127.0.0.1:1/api"))
        .unwrap();
    store
        .write_application(&ApplicationRecord::new("U1", "abc123"))
        .unwrap();
    let (discoverer, _) = ScriptedDiscoverer::new(Bridges::new());
    let registrar = Registrar::new(store.clone(), discoverer).unwrap();

    let removal = registrar.remove_default().await.unwrap();

    assert!(removal.unregister_error.as_ref().is_some_and(Error::is_transport));
    assert_eq!(store.find_default_application().unwrap(), None);
}

#[tokio::test]
async fn resolve_rediscovers_uncached_bridge() {
    let (_dir, store) = store();
    store
        .write_application(&ApplicationRecord::new("U9", "key"))
        .unwrap();
    let (discoverer, discoveries) = ScriptedDiscoverer::new(Bridges::from_iter([
        ("U1", "http://10.0.0.5/api"),
        ("U9", "http://10.0.0.9/api"),
    ]));
    let registrar = Registrar::new(store.clone(), discoverer).unwrap();

    let bridge = registrar.resolve_default().await.unwrap();
    assert_eq!(bridge.base_uri(), "http://10.0.0.9/api");
    assert_eq!(bridge.application_id(), "key");
    assert_eq!(discoveries.load(Ordering::SeqCst), 1);
    assert_eq!(
        store.find_bridge("U9").unwrap(),
        Some(BridgeRecord::new("U9", "http://10.0.0.9/api"))
    );

    // Now cached: no second discovery.
    registrar.resolve_default().await.unwrap();
    assert_eq!(discoveries.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn resolve_fails_when_bridge_is_gone() {
    let (_dir, store) = store();
    store
        .write_application(&ApplicationRecord::new("U9", "key"))
        .unwrap();
    let (discoverer, _) =
        ScriptedDiscoverer::new(Bridges::from_iter([("U1", "http://10.0.0.5/api")]));
    let registrar = Registrar::new(store.clone(), discoverer).unwrap();

    match registrar.resolve_default().await {
        Err(Error::BridgeNotFound(id)) => assert_eq!(id, "U9"),
        other => panic!("expected BridgeNotFound, got {:?}", other),
    }
    // The record is not healed or dropped.
    assert!(store.find_default_application().unwrap().is_some());
}
