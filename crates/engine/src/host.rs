//! What the engine needs from a simulation.
//!
//! The engine never owns simulation state. It borrows live handles for the
//! duration of one call and otherwise only stores [`RefId`]s and [`FormId`]s,
//! re-resolving them through [`Host::lookup_ref`] right before use.

use crate::form::{BaseForm, FormId, RefId};

/// A live, possibly-invalidated handle to a placed entity.
pub trait ObjectRef: Clone + Send + Sync + 'static {
    /// The stable identifier this handle can be re-resolved from.
    fn ref_id(&self) -> RefId;

    /// The entity's base descriptor, or `None` once it is unavailable
    /// (entity deleted, base unloaded).
    fn base(&self) -> Option<BaseForm>;

    /// Whether the entity (or its base) carries `keyword`.
    fn has_keyword(&self, keyword: FormId) -> bool;
}

/// Load-time resolution of symbolic identifiers.
pub trait FormLookup {
    /// Find local id `local_id` inside the named document of the load order.
    fn lookup_form(&self, document: &str, local_id: u32) -> Option<BaseForm>;
}

/// A simulation the engine can run against.
pub trait Host: FormLookup + Send + Sync + 'static {
    type Ref: ObjectRef;

    /// Re-resolve a stable identifier into a live handle.
    fn lookup_ref(&self, id: RefId) -> Option<Self::Ref>;
}
