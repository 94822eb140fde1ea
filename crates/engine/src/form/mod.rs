pub mod ident;
pub mod kind;

pub use ident::SymbolicId;
pub use kind::FormType;

use std::fmt;

/// Stable identifier of a base object (the descriptor a placed entity is an
/// instance of). Assigned by the host; survives for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FormId(pub u32);

impl FormId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

/// Stable identifier of a placed entity.
///
/// This is what crosses the deferred-task boundary instead of a live handle.
/// Looking it up after the entity has been destroyed simply fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RefId(pub u32);

impl RefId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for RefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

/// The category/base descriptor of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BaseForm {
    pub id: FormId,
    pub form_type: FormType,
}

impl BaseForm {
    pub const fn new(id: FormId, form_type: FormType) -> Self {
        Self { id, form_type }
    }
}
