use crate::form::BaseForm;
use crate::host::ObjectRef;

use super::event::EventKind;
use super::hit::HitAttributes;

/// A raw event notification as delivered by a host producer.
#[derive(Debug, Clone)]
pub enum EventRecord<R> {
    Activated {
        actor: Option<R>,
        target: R,
    },
    Hit {
        aggressor: Option<R>,
        target: R,
        attributes: HitAttributes,
    },
    Grabbed {
        actor: Option<R>,
        target: R,
    },
    Released {
        actor: Option<R>,
        target: R,
    },
}

/// The engine's normalized view of one event notification.
///
/// Lives for a single [`Engine::trigger`](crate::Engine::trigger) call. The
/// handles inside must never be stored past it.
#[derive(Debug, Clone)]
pub struct RuleContext<R> {
    pub event: EventKind,
    pub actor: Option<R>,
    pub target: R,
    pub base: BaseForm,
    /// `Some` exactly when this is a hit interaction.
    pub hit: Option<HitAttributes>,
}

impl<R: ObjectRef> RuleContext<R> {
    /// Build a context for `target`. Returns `None` when the target's base
    /// descriptor is unavailable; there is nothing to match against then.
    pub fn new(event: EventKind, actor: Option<R>, target: R) -> Option<Self> {
        let base = target.base()?;
        Some(Self {
            event,
            actor,
            target,
            base,
            hit: None,
        })
    }

    pub fn hit(aggressor: Option<R>, target: R, attributes: HitAttributes) -> Option<Self> {
        let mut ctx = Self::new(EventKind::Hit, aggressor, target)?;
        ctx.hit = Some(attributes);
        Some(ctx)
    }

    pub fn from_record(record: EventRecord<R>) -> Option<Self> {
        match record {
            EventRecord::Activated { actor, target } => Self::new(EventKind::Activate, actor, target),
            EventRecord::Hit {
                aggressor,
                target,
                attributes,
            } => Self::hit(aggressor, target, attributes),
            EventRecord::Grabbed { actor, target } => Self::new(EventKind::Grab, actor, target),
            EventRecord::Released { actor, target } => Self::new(EventKind::Release, actor, target),
        }
    }

    pub fn is_hit(&self) -> bool {
        self.hit.is_some()
    }
}
