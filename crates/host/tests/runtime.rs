//! The process-wide engine slot. Kept in its own test binary so nothing else
//! races for the singleton.

mod common;

use std::sync::Arc;

use common::demo;
use reactor_engine::Engine;
use reactor_host::producer::Notification;
use reactor_host::runtime;

#[test]
fn engine_installs_once_and_frames_drain_it() {
    assert!(runtime::engine().is_none());

    let s = demo();
    let engine = Arc::new(Engine::new(
        Arc::clone(&s.host),
        s.engine.config().clone(),
        reactor_host::executors::standard(&s.world),
    ));
    let installed = runtime::install(Arc::clone(&engine)).unwrap();
    assert!(Arc::ptr_eq(installed, &engine));
    assert!(runtime::engine().is_some());

    let again = Arc::new(Engine::new(
        Arc::clone(&s.host),
        s.engine.config().clone(),
        reactor_host::executors::standard(&s.world),
    ));
    assert!(runtime::install(again).is_err());

    // The installed engine starts with no rules; give it the demo set.
    let rules = reactor_engine::loader::parse_document("demo.json", common::DEMO_RULES, s.host.as_ref()).unwrap();
    installed.install(rules.rules);

    let chest = s.object("chest");
    s.producer
        .deliver(installed, Notification::Activated { target: chest, actor: None });
    assert_eq!(installed.pending_len(), 2);

    runtime::frame(installed, &s.producer, 1);
    assert_eq!(installed.pending_len(), 0);
    assert_eq!(installed.metrics().tasks_run, 2);
}
