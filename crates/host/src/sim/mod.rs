//! In-memory simulation the reference host runs the engine against.
//!
//! The world is a flat registry: a plugin load order, base forms keyed by
//! [`FormId`], and placed objects keyed by [`RefId`]. Every mutation an
//! effect performs is appended to a journal so the console and the tests can
//! see what happened.

pub mod scenario;

use std::fmt;
use std::sync::atomic::{AtomicU16, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use anyhow::{Context, Result, bail, ensure};
use dashmap::DashMap;
use indexmap::IndexMap;
use reactor_engine::form::{BaseForm, FormId, FormType, RefId, SymbolicId};
use reactor_engine::{FormLookup, Host, ObjectRef};

pub use scenario::Scenario;

/// World-space coordinates.
pub type Position = [f32; 3];

/// Base form of the hidden marker objects use as an effect origin.
pub const MARKER_BASE: FormId = FormId(0x0000_003B);

/// Placed references get ids above this, like runtime-created references.
const FIRST_REF: u32 = 0xFF00_0000;

/// Highest plugin index; the top byte of a form id is the load-order slot.
const MAX_PLUGINS: usize = 0xFE;

// ── Records ──────────────────────────────────────────────────────────────

/// One entry of a leveled list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeveledEntry {
    pub level: u16,
    pub form: FormId,
}

#[derive(Debug, Clone)]
struct FormRecord {
    base: BaseForm,
    name: String,
    keywords: Vec<FormId>,
    leveled: Vec<LeveledEntry>,
}

#[derive(Debug, Clone)]
struct Placed {
    base: FormId,
    name: Option<String>,
    position: Position,
}

/// Something that happened to the world, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    Spawned { id: RefId, base: FormId, at: Position },
    Disposed { id: RefId },
    Moved { id: RefId, to: Position },
    SoundPlayed { sound: FormId, at: Position },
    SpellCast { spell: FormId, origin: RefId, target: RefId },
    ImpactPlayed { impact: FormId, at: Position },
}

// ── World ────────────────────────────────────────────────────────────────

pub struct SimWorld {
    /// Lowercased plugin name → display name, in load order.
    plugins: RwLock<IndexMap<String, String>>,
    forms: DashMap<FormId, FormRecord>,
    objects: DashMap<RefId, Placed>,
    next_ref: AtomicU32,
    player_level: AtomicU16,
    journal: Mutex<Vec<WorldEvent>>,
    marker: Mutex<Option<RefId>>,
}

impl SimWorld {
    pub fn new() -> Self {
        Self {
            plugins: RwLock::new(IndexMap::new()),
            forms: DashMap::new(),
            objects: DashMap::new(),
            next_ref: AtomicU32::new(FIRST_REF + 1),
            player_level: AtomicU16::new(1),
            journal: Mutex::new(Vec::new()),
            marker: Mutex::new(None),
        }
    }

    /// Build a world from a scenario description.
    pub fn from_scenario(scenario: &Scenario) -> Result<Arc<Self>> {
        let world = Self::new();
        for plugin in &scenario.plugins {
            world.add_plugin(plugin)?;
        }
        world.set_player_level(scenario.player_level);

        for spec in &scenario.forms {
            let id = world.parse_form_id(&spec.id)?;
            let form_type = FormType::from_tag(&spec.form_type)
                .with_context(|| format!("form {}: unknown type {:?}", spec.id, spec.form_type))?;
            let keywords = spec
                .keywords
                .iter()
                .map(|k| world.parse_form_id(k))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("form {}: keywords", spec.id))?;
            let leveled = spec
                .entries
                .iter()
                .map(|e| {
                    Ok(LeveledEntry {
                        level: e.level,
                        form: world.parse_form_id(&e.form_id)?,
                    })
                })
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("form {}: leveled entries", spec.id))?;

            world.insert_form(BaseForm::new(id, form_type), spec.name.clone().unwrap_or_default(), keywords, leveled);
        }

        for (name, spec) in &scenario.objects {
            let base = world.parse_form_id(&spec.base)?;
            world
                .place(base, spec.position, Some(name.as_str()))
                .with_context(|| format!("object {name}: base {} is not a known form", spec.base))?;
        }

        tracing::info!(
            "World ready: {} plugins, {} forms, {} objects",
            world.plugin_count(),
            world.forms.len(),
            world.objects.len()
        );
        Ok(Arc::new(world))
    }

    // ── Load order and forms ─────────────────────────────────────────────

    /// Append a plugin to the load order. Returns its index.
    pub fn add_plugin(&self, name: &str) -> Result<u8> {
        let mut plugins = self.plugins.write().unwrap_or_else(PoisonError::into_inner);
        let key = name.to_ascii_lowercase();
        if let Some(index) = plugins.get_index_of(&key) {
            bail!("plugin {name} listed twice (slot {index:02X})");
        }
        ensure!(plugins.len() < MAX_PLUGINS, "load order is full, cannot add {name}");
        let (index, _) = plugins.insert_full(key, name.to_string());
        Ok(index as u8)
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// The runtime id of `local_id` in the named plugin.
    pub fn form_id(&self, plugin: &str, local_id: u32) -> Option<FormId> {
        let plugins = self.plugins.read().unwrap_or_else(PoisonError::into_inner);
        let index = plugins.get_index_of(&plugin.to_ascii_lowercase())?;
        Some(FormId(((index as u32) << 24) | (local_id & 0x00FF_FFFF)))
    }

    fn parse_form_id(&self, raw: &str) -> Result<FormId> {
        let id = SymbolicId::parse(raw)?;
        self.form_id(&id.document, id.local_id)
            .with_context(|| format!("{raw}: plugin {} is not in the load order", id.document))
    }

    pub fn insert_form(&self, base: BaseForm, name: String, keywords: Vec<FormId>, leveled: Vec<LeveledEntry>) {
        self.forms.insert(
            base.id,
            FormRecord {
                base,
                name,
                keywords,
                leveled,
            },
        );
    }

    pub fn form(&self, id: FormId) -> Option<BaseForm> {
        self.forms.get(&id).map(|r| r.base)
    }

    pub fn form_name(&self, id: FormId) -> Option<String> {
        self.forms.get(&id).map(|r| r.name.clone())
    }

    /// Drop a base form. Objects placed from it stay but lose their
    /// descriptor.
    pub fn unload_form(&self, id: FormId) -> bool {
        self.forms.remove(&id).is_some()
    }

    pub fn set_player_level(&self, level: u16) {
        self.player_level.store(level, Ordering::Relaxed);
    }

    /// Pick the entry of a leveled list for the current player level: the
    /// highest-level entry not above it.
    pub fn resolve_leveled(&self, list: FormId) -> Option<FormId> {
        let level = self.player_level.load(Ordering::Relaxed);
        let record = self.forms.get(&list)?;
        record
            .leveled
            .iter()
            .filter(|e| e.level <= level)
            .max_by_key(|e| e.level)
            .map(|e| e.form)
    }

    // ── Objects ──────────────────────────────────────────────────────────

    /// Place a new object. Fails if `base` is not a known form.
    pub fn place(&self, base: FormId, position: Position, name: Option<&str>) -> Option<RefId> {
        if !self.forms.contains_key(&base) {
            return None;
        }
        let id = RefId(self.next_ref.fetch_add(1, Ordering::Relaxed));
        self.objects.insert(
            id,
            Placed {
                base,
                name: name.map(str::to_string),
                position,
            },
        );
        self.record(WorldEvent::Spawned { id, base, at: position });
        Some(id)
    }

    pub fn dispose(&self, id: RefId) -> bool {
        let removed = self.objects.remove(&id).is_some();
        if removed {
            self.record(WorldEvent::Disposed { id });
        }
        removed
    }

    pub fn exists(&self, id: RefId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn position(&self, id: RefId) -> Option<Position> {
        self.objects.get(&id).map(|o| o.position)
    }

    pub fn base_of(&self, id: RefId) -> Option<BaseForm> {
        let base = self.objects.get(&id)?.base;
        self.form(base)
    }

    pub fn move_by(&self, id: RefId, delta: Position) -> Option<Position> {
        let to = {
            let mut object = self.objects.get_mut(&id)?;
            for (axis, d) in object.position.iter_mut().zip(delta) {
                *axis += d;
            }
            object.position
        };
        self.record(WorldEvent::Moved { id, to });
        Some(to)
    }

    pub fn move_to(&self, id: RefId, to: Position) -> bool {
        let Some(mut object) = self.objects.get_mut(&id) else {
            return false;
        };
        object.position = to;
        drop(object);
        self.record(WorldEvent::Moved { id, to });
        true
    }

    /// Find an object by scenario name (case-insensitive) or hex ref id.
    pub fn find(&self, token: &str) -> Option<RefId> {
        let named = self.objects.iter().find_map(|entry| {
            entry
                .name
                .as_deref()
                .filter(|n| n.eq_ignore_ascii_case(token))
                .map(|_| *entry.key())
        });
        if named.is_some() {
            return named;
        }
        let hex = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        let id = RefId(u32::from_str_radix(hex, 16).ok()?);
        self.exists(id).then_some(id)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Human-readable label for logs and the console.
    pub fn describe(&self, id: RefId) -> String {
        let Some(object) = self.objects.get(&id) else {
            return format!("{id} (gone)");
        };
        let base = self.form_name(object.base).unwrap_or_default();
        match &object.name {
            Some(name) => format!("{name} [{id}] {base}"),
            None => format!("[{id}] {base}"),
        }
    }

    /// The hidden origin object for spells and sounds, created on first use
    /// and recreated if something disposed it.
    pub fn marker(&self) -> RefId {
        let mut marker = self.marker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(id) = *marker {
            if self.exists(id) {
                return id;
            }
        }

        if !self.forms.contains_key(&MARKER_BASE) {
            self.insert_form(
                BaseForm::new(MARKER_BASE, FormType::Static),
                "XMarker".into(),
                Vec::new(),
                Vec::new(),
            );
        }
        let id = RefId(self.next_ref.fetch_add(1, Ordering::Relaxed));
        self.objects.insert(
            id,
            Placed {
                base: MARKER_BASE,
                name: None,
                position: [0.0; 3],
            },
        );
        tracing::debug!("Created effect marker {}", id);
        *marker = Some(id);
        id
    }

    // ── Journal ──────────────────────────────────────────────────────────

    pub fn record(&self, event: WorldEvent) {
        self.lock_journal().push(event);
    }

    pub fn journal(&self) -> Vec<WorldEvent> {
        self.lock_journal().clone()
    }

    pub fn take_journal(&self) -> Vec<WorldEvent> {
        std::mem::take(&mut *self.lock_journal())
    }

    fn lock_journal(&self) -> MutexGuard<'_, Vec<WorldEvent>> {
        self.journal.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

// ── Engine seam ──────────────────────────────────────────────────────────

/// Live handle to a placed object. Valid only while the object exists.
#[derive(Clone)]
pub struct SimRef {
    id: RefId,
    world: Arc<SimWorld>,
}

impl SimRef {
    pub fn world(&self) -> &SimWorld {
        &self.world
    }

    pub fn position(&self) -> Option<Position> {
        self.world.position(self.id)
    }
}

impl fmt::Debug for SimRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SimRef({})", self.id)
    }
}

impl ObjectRef for SimRef {
    fn ref_id(&self) -> RefId {
        self.id
    }

    fn base(&self) -> Option<BaseForm> {
        self.world.base_of(self.id)
    }

    fn has_keyword(&self, keyword: FormId) -> bool {
        let Some(base) = self.world.objects.get(&self.id).map(|o| o.base) else {
            return false;
        };
        self.world
            .forms
            .get(&base)
            .is_some_and(|r| r.keywords.contains(&keyword))
    }
}

/// The [`Host`] the engine sees.
pub struct SimHost {
    world: Arc<SimWorld>,
}

impl SimHost {
    pub fn new(world: Arc<SimWorld>) -> Arc<Self> {
        Arc::new(Self { world })
    }

    pub fn world(&self) -> &Arc<SimWorld> {
        &self.world
    }
}

impl FormLookup for SimHost {
    fn lookup_form(&self, document: &str, local_id: u32) -> Option<BaseForm> {
        let id = self.world.form_id(document, local_id)?;
        self.world.form(id)
    }
}

impl Host for SimHost {
    type Ref = SimRef;

    fn lookup_ref(&self, id: RefId) -> Option<SimRef> {
        self.world.exists(id).then(|| SimRef {
            id,
            world: Arc::clone(&self.world),
        })
    }
}
