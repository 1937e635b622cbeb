//! Engine-level observer notification discipline: `Once` vs `Always`,
//! and late attachment to an engine that already reached a terminal state.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{base_config, dt, FixtureLicenseBuilder, ScriptedLicenseParser, ScriptedPassphrase};
use lcp_license::{Input, ObserverPolicy, ValidationEngine};

fn license_config(raw: &'static [u8]) -> lcp_license::EngineConfig {
    let license = FixtureLicenseBuilder::new(raw, "http://readium.org/lcp/basic-profile")
        .window(dt("2024-01-01T00:00:00Z"), dt("2030-01-01T00:00:00Z"))
        .build();
    let mut config = base_config();
    config.license_parser = Arc::new(ScriptedLicenseParser::new(vec![(raw, license)]));
    config.passphrases = Arc::new(ScriptedPassphrase(Some("hunter2".to_string())));
    config
}

#[tokio::test]
async fn always_observer_hears_every_run_on_a_reused_engine() {
    let engine = ValidationEngine::new(license_config(b"run-a"));
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    engine
        .observe(
            ObserverPolicy::Always,
            Box::new(move |_, _| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .await;

    engine
        .validate(Input::License(b"run-a".to_vec()), Box::new(|_, _| {}))
        .await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn once_observer_is_pruned_after_first_notification() {
    let engine = ValidationEngine::new(license_config(b"run-b"));
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    engine
        .observe(
            ObserverPolicy::Once,
            Box::new(move |_, _| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .await;

    engine
        .validate(Input::License(b"run-b".to_vec()), Box::new(|_, _| {}))
        .await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn observers_are_notified_in_registration_order() {
    let engine = ValidationEngine::new(license_config(b"run-c"));
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));

    for tag in ["first", "second", "third"] {
        let order = order.clone();
        engine
            .observe(
                ObserverPolicy::Once,
                Box::new(move |_, _| {
                    order.lock().unwrap().push(tag);
                }),
            )
            .await;
    }

    engine
        .validate(Input::License(b"run-c".to_vec()), Box::new(|_, _| {}))
        .await;

    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
}
