//! Event producers: raw notifications from the simulation, normalized and
//! handed to [`Engine::trigger`].
//!
//! Grab and release pass straight through. A released object is remembered
//! for a short window; if it collides with something inside that window the
//! collision is reported as a thrown hit on whatever it struck.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use reactor_engine::Engine;
use reactor_engine::form::{FormId, FormType, RefId};
use reactor_engine::rules::{AttackType, EventRecord, HitAttributes, RuleContext, WeaponType};
use reactor_engine::{Host, ObjectRef};

use crate::sim::{SimHost, SimRef};

/// A raw notification as the simulation reports it. Only stable ids.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Activated {
        target: RefId,
        actor: Option<RefId>,
    },
    Hit {
        target: RefId,
        aggressor: Option<RefId>,
        weapon: Option<FormId>,
        projectile: Option<FormId>,
        weapon_type: Option<WeaponType>,
        attack: Option<AttackType>,
    },
    Grabbed {
        target: RefId,
        actor: Option<RefId>,
    },
    Released {
        target: RefId,
        actor: Option<RefId>,
    },
    /// A physics contact between two objects.
    Collided {
        object: RefId,
        target: RefId,
    },
}

// ── Release window ───────────────────────────────────────────────────────

/// Recently released objects, each remembered for `window`.
pub struct ReleaseWindow {
    released: DashMap<RefId, Instant>,
    window: Duration,
}

impl ReleaseWindow {
    pub fn new(window: Duration) -> Self {
        Self {
            released: DashMap::new(),
            window,
        }
    }

    pub fn mark(&self, id: RefId, now: Instant) {
        self.released.insert(id, now);
    }

    pub fn forget(&self, id: RefId) {
        self.released.remove(&id);
    }

    /// Whether `id` was released no longer than `window` ago.
    pub fn contains(&self, id: RefId, now: Instant) -> bool {
        self.released
            .get(&id)
            .is_some_and(|at| now.saturating_duration_since(*at) <= self.window)
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.released.len();
        self.released
            .retain(|_, at| now.saturating_duration_since(*at) <= self.window);
        before - self.released.len()
    }

    pub fn len(&self) -> usize {
        self.released.len()
    }

    pub fn is_empty(&self) -> bool {
        self.released.is_empty()
    }
}

// ── Producer ─────────────────────────────────────────────────────────────

/// Turns notifications into engine triggers.
pub struct Producer {
    host: Arc<SimHost>,
    window: ReleaseWindow,
}

impl Producer {
    pub fn new(host: Arc<SimHost>, release_window: Duration) -> Self {
        Self {
            host,
            window: ReleaseWindow::new(release_window),
        }
    }

    pub fn release_window(&self) -> &ReleaseWindow {
        &self.window
    }

    /// Deliver one notification. Returns how many effects were enqueued.
    pub fn deliver(&self, engine: &Engine<SimHost>, notification: Notification) -> usize {
        self.deliver_at(engine, notification, Instant::now())
    }

    pub fn deliver_at(&self, engine: &Engine<SimHost>, notification: Notification, now: Instant) -> usize {
        let Some(record) = self.normalize(notification, now) else {
            return 0;
        };
        let Some(ctx) = RuleContext::from_record(record) else {
            tracing::debug!("Notification target has no base form, ignoring");
            return 0;
        };
        engine.trigger(&ctx)
    }

    /// Resolve ids into live handles and update the release window.
    fn normalize(&self, notification: Notification, now: Instant) -> Option<EventRecord<SimRef>> {
        let lookup = |id: RefId| self.host.lookup_ref(id);
        let optional = |id: Option<RefId>| id.and_then(lookup);

        let record = match notification {
            Notification::Activated { target, actor } => EventRecord::Activated {
                actor: optional(actor),
                target: lookup(target)?,
            },
            Notification::Hit {
                target,
                aggressor,
                weapon,
                projectile,
                weapon_type,
                attack,
            } => EventRecord::Hit {
                aggressor: optional(aggressor),
                target: lookup(target)?,
                attributes: HitAttributes {
                    weapon,
                    projectile,
                    weapon_type,
                    attack,
                },
            },
            Notification::Grabbed { target, actor } => {
                self.window.forget(target);
                EventRecord::Grabbed {
                    actor: optional(actor),
                    target: lookup(target)?,
                }
            }
            Notification::Released { target, actor } => {
                self.window.mark(target, now);
                EventRecord::Released {
                    actor: optional(actor),
                    target: lookup(target)?,
                }
            }
            Notification::Collided { object, target } => {
                if !self.window.contains(object, now) {
                    return None;
                }
                let thrown = lookup(object)?;
                tracing::debug!("Thrown {} struck {}", object, target);
                EventRecord::Hit {
                    aggressor: None,
                    target: lookup(target)?,
                    attributes: thrown_hit(&thrown),
                }
            }
        };
        Some(record)
    }
}

/// Hit attributes for a released object striking something. A thrown weapon
/// counts as that weapon.
fn thrown_hit(object: &SimRef) -> HitAttributes {
    let weapon = object
        .base()
        .filter(|b| b.form_type == FormType::Weapon)
        .map(|b| b.id);
    HitAttributes {
        weapon,
        projectile: None,
        weapon_type: None,
        attack: Some(AttackType::Thrown),
    }
}
