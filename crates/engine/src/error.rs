use std::path::PathBuf;

use thiserror::Error;

use crate::form::{FormType, SymbolicId};

/// A whole document could not be used. The loader logs these and moves on to
/// the next document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {document}: {source}")]
    Json {
        document: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{document}: top level must be an array of rules")]
    NotAnArray { document: String },
}

/// A single symbolic reference could not be turned into a form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("malformed identifier {0:?}")]
    Malformed(String),

    #[error("{0} not found in load order")]
    UnknownForm(SymbolicId),

    #[error("{id} is a {actual}, expected one of {expected:?}")]
    WrongCategory {
        id: SymbolicId,
        actual: FormType,
        expected: Vec<FormType>,
    },
}

/// Raised by an effect executor. Local to the effect: it is logged and never
/// aborts sibling effects or the task queue.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("{0:?} needs a form but none was resolved")]
    MissingForm(crate::rules::EffectKind),

    #[error("no valid spawn point near {0}")]
    NoSpawnPoint(crate::form::RefId),

    #[error("{0:?} is not supported by this host")]
    Unsupported(crate::rules::EffectKind),

    #[error("host: {0}")]
    Host(String),
}
