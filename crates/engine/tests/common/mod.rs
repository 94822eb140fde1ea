//! A tiny in-memory host shared by the engine integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use reactor_engine::dispatch::{EffectCall, ExecutorRegistry};
use reactor_engine::error::ExecError;
use reactor_engine::form::{BaseForm, FormId, FormType, RefId};
use reactor_engine::rules::EffectKind;
use reactor_engine::{EngineConfig, FormLookup, Host, ObjectRef};

#[derive(Debug, Clone)]
struct Entity {
    base: Option<BaseForm>,
    keywords: Vec<FormId>,
}

#[derive(Default)]
pub struct MockWorld {
    documents: RwLock<Vec<String>>,
    forms: RwLock<HashMap<(String, u32), BaseForm>>,
    entities: RwLock<HashMap<RefId, Entity>>,
    next_ref: Mutex<u32>,
}

impl MockWorld {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a base form; ids are `(document index << 24) | local_id`.
    pub fn add_form(&self, document: &str, local_id: u32, form_type: FormType) -> BaseForm {
        let mut docs = self.documents.write().unwrap();
        let index = match docs.iter().position(|d| d.eq_ignore_ascii_case(document)) {
            Some(i) => i,
            None => {
                docs.push(document.to_string());
                docs.len() - 1
            }
        };
        let form = BaseForm::new(FormId(((index as u32) << 24) | local_id), form_type);
        self.forms
            .write()
            .unwrap()
            .insert((document.to_ascii_lowercase(), local_id), form);
        form
    }

    pub fn place(self: &Arc<Self>, base: BaseForm, keywords: &[FormId]) -> MockRef {
        let id = {
            let mut next = self.next_ref.lock().unwrap();
            *next += 1;
            RefId(0xFF00_0000 | *next)
        };
        self.entities.write().unwrap().insert(
            id,
            Entity {
                base: Some(base),
                keywords: keywords.to_vec(),
            },
        );
        MockRef {
            id,
            world: Arc::clone(self),
        }
    }

    pub fn destroy(&self, id: RefId) {
        self.entities.write().unwrap().remove(&id);
    }

    /// Keep the entity but make its descriptor unavailable.
    pub fn unload_base(&self, id: RefId) {
        if let Some(e) = self.entities.write().unwrap().get_mut(&id) {
            e.base = None;
        }
    }
}

#[derive(Clone)]
pub struct MockRef {
    pub id: RefId,
    world: Arc<MockWorld>,
}

impl std::fmt::Debug for MockRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockRef({})", self.id)
    }
}

impl ObjectRef for MockRef {
    fn ref_id(&self) -> RefId {
        self.id
    }

    fn base(&self) -> Option<BaseForm> {
        self.world.entities.read().unwrap().get(&self.id)?.base
    }

    fn has_keyword(&self, keyword: FormId) -> bool {
        self.world
            .entities
            .read()
            .unwrap()
            .get(&self.id)
            .is_some_and(|e| e.keywords.contains(&keyword))
    }
}

pub struct MockHost {
    pub world: Arc<MockWorld>,
}

impl MockHost {
    pub fn new(world: &Arc<MockWorld>) -> Arc<Self> {
        Arc::new(Self {
            world: Arc::clone(world),
        })
    }
}

impl FormLookup for MockHost {
    fn lookup_form(&self, document: &str, local_id: u32) -> Option<BaseForm> {
        self.world
            .forms
            .read()
            .unwrap()
            .get(&(document.to_ascii_lowercase(), local_id))
            .copied()
    }
}

impl Host for MockHost {
    type Ref = MockRef;

    fn lookup_ref(&self, id: RefId) -> Option<MockRef> {
        if !self.world.entities.read().unwrap().contains_key(&id) {
            return None;
        }
        Some(MockRef {
            id,
            world: Arc::clone(&self.world),
        })
    }
}

/// Every executor call, in order: (kind, target, actor).
pub type CallLog = Arc<Mutex<Vec<(EffectKind, RefId, Option<RefId>)>>>;

/// A registry where every kind just records the call.
pub fn recording_executors() -> (ExecutorRegistry<MockRef>, CallLog) {
    let log: CallLog = Arc::new(Mutex::new(Vec::new()));
    let mut registry = ExecutorRegistry::new();
    for kind in EffectKind::ALL {
        let log = Arc::clone(&log);
        registry.register(kind, move |call: &EffectCall<'_, MockRef>| -> Result<(), ExecError> {
            log.lock().unwrap().push((
                call.effect.kind,
                call.ctx.target.ref_id(),
                call.ctx.actor.as_ref().map(|a| a.ref_id()),
            ));
            Ok(())
        });
    }
    (registry, log)
}

/// Deterministic config with debouncing off.
pub fn test_config() -> EngineConfig {
    EngineConfig {
        hit_debounce_ms: 0,
        seed: Some(7),
        ..EngineConfig::default()
    }
}

/// A small standard world: one document with a handful of forms.
pub struct Fixture {
    pub world: Arc<MockWorld>,
    pub host: Arc<MockHost>,
    pub chest: BaseForm,
    pub lever: BaseForm,
    pub rock: BaseForm,
    pub sword: BaseForm,
    pub axe: BaseForm,
    pub arrow: BaseForm,
    pub npc: BaseForm,
    pub sound: BaseForm,
    pub gold: BaseForm,
    pub keyword_metal: BaseForm,
    pub keyword_wood: BaseForm,
}

pub fn fixture() -> Fixture {
    let world = MockWorld::new();
    let host = MockHost::new(&world);
    Fixture {
        chest: world.add_form("Test.esp", 0x800, FormType::Container),
        lever: world.add_form("Test.esp", 0x801, FormType::Activator),
        rock: world.add_form("Test.esp", 0x802, FormType::Static),
        sword: world.add_form("Test.esp", 0x803, FormType::Weapon),
        axe: world.add_form("Test.esp", 0x804, FormType::Weapon),
        arrow: world.add_form("Test.esp", 0x805, FormType::Projectile),
        npc: world.add_form("Test.esp", 0x806, FormType::Npc),
        sound: world.add_form("Test.esp", 0x807, FormType::Sound),
        gold: world.add_form("Test.esp", 0x808, FormType::Misc),
        keyword_metal: world.add_form("Test.esp", 0x809, FormType::Keyword),
        keyword_wood: world.add_form("Test.esp", 0x80A, FormType::Keyword),
        world,
        host,
    }
}
