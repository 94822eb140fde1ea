#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use reactor_engine::loader::parse_document;
use reactor_engine::{Engine, EngineConfig};
use reactor_host::executors;
use reactor_host::producer::Producer;
use reactor_host::sim::{Scenario, SimHost, SimWorld};

pub const DEMO_RULES: &str = include_str!("../../assets/demo_rules.json");

pub struct Setup {
    pub world: Arc<SimWorld>,
    pub host: Arc<SimHost>,
    pub engine: Engine<SimHost>,
    pub producer: Producer,
}

impl Setup {
    pub fn object(&self, name: &str) -> reactor_engine::form::RefId {
        self.world.find(name).unwrap()
    }
}

/// The built-in scenario with the bundled demo rules, debouncing off.
pub fn demo() -> Setup {
    let config = EngineConfig {
        hit_debounce_ms: 0,
        seed: Some(11),
        ..EngineConfig::default()
    };
    let scenario = Scenario::builtin().unwrap();
    let world = SimWorld::from_scenario(&scenario).unwrap();
    let host = SimHost::new(Arc::clone(&world));
    let engine = Engine::new(Arc::clone(&host), config, executors::standard(&world));
    let rules = parse_document("demo_rules.json", DEMO_RULES, host.as_ref()).unwrap();
    assert_eq!(rules.skipped, 0);
    engine.install(rules.rules);
    let producer = Producer::new(Arc::clone(&host), Duration::from_secs(5));
    world.take_journal();
    Setup {
        world,
        host,
        engine,
        producer,
    }
}
