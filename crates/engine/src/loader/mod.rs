//! Rule documents → validated [`Rule`]s.
//!
//! A rules root is scanned recursively for `*.json` documents. Paths are
//! sorted so load order is deterministic; documents are parsed in parallel
//! and concatenated in that order. Nothing here aborts a load: broken
//! documents, rules and references are logged and skipped.

pub mod document;
pub mod resolve;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde_json::Value;

use crate::error::LoadError;
use crate::host::FormLookup;
use crate::rules::Rule;

use document::RuleParser;

pub use resolve::resolve;

/// Counters describing one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub documents: usize,
    pub skipped_documents: usize,
    pub rules: usize,
    pub skipped_rules: usize,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub rules: Vec<Rule>,
    pub stats: LoadStats,
}

/// The rules of one document plus how many entries were rejected.
#[derive(Debug, Default)]
pub struct DocumentRules {
    pub rules: Vec<Rule>,
    pub skipped: usize,
}

/// Load every document under `root`.
pub fn load_dir<L: FormLookup + Sync + ?Sized>(root: &Path, lookup: &L) -> LoadReport {
    let start = Instant::now();

    let files = match collect_documents(root) {
        Ok(files) => files,
        Err(e) => {
            tracing::warn!("Rules directory {} unreadable: {}", root.display(), e);
            return LoadReport::default();
        }
    };

    let parsed: Vec<Result<DocumentRules, LoadError>> = files
        .par_iter()
        .map(|path| {
            let name = path.strip_prefix(root).unwrap_or(path.as_path()).display().to_string();
            load_file(path, &name, lookup)
        })
        .collect();

    let mut report = LoadReport::default();
    for result in parsed {
        report.stats.documents += 1;
        match result {
            Ok(doc) => {
                report.stats.skipped_rules += doc.skipped;
                report.rules.extend(doc.rules);
            }
            Err(e) => {
                tracing::error!("Skipping rule document: {}", e);
                report.stats.skipped_documents += 1;
            }
        }
    }
    report.stats.rules = report.rules.len();

    tracing::info!(
        "Loaded {} rules from {} documents under {} ({} rules and {} documents skipped, {:.2?})",
        report.stats.rules,
        report.stats.documents,
        root.display(),
        report.stats.skipped_rules,
        report.stats.skipped_documents,
        start.elapsed(),
    );
    report
}

/// Read and parse a single document file.
pub fn load_file<L: FormLookup + ?Sized>(path: &Path, name: &str, lookup: &L) -> Result<DocumentRules, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(name, &text, lookup)
}

/// Parse document text. Fails only if the document as a whole is unusable.
pub fn parse_document<L: FormLookup + ?Sized>(name: &str, text: &str, lookup: &L) -> Result<DocumentRules, LoadError> {
    let value: Value = serde_json::from_str(text).map_err(|source| LoadError::Json {
        document: name.to_string(),
        source,
    })?;
    let Value::Array(entries) = value else {
        return Err(LoadError::NotAnArray {
            document: name.to_string(),
        });
    };

    let parser = RuleParser::new(lookup, name);
    let mut doc = DocumentRules::default();
    for (index, entry) in entries.iter().enumerate() {
        match parser.parse_rule(index, entry) {
            Some(rule) => doc.rules.push(rule),
            None => doc.skipped += 1,
        }
    }

    tracing::debug!("{}: {} rules, {} skipped", name, doc.rules.len(), doc.skipped);
    Ok(doc)
}

/// All `*.json` files below `root`, sorted. Unreadable subdirectories are
/// skipped with a warning; only an unreadable root is an error. Symlinked
/// directories are not followed, symlinked files are.
fn collect_documents(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    let mut first = true;

    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if first => return Err(e),
            Err(e) => {
                tracing::warn!("Skipping unreadable directory {}: {}", dir.display(), e);
                continue;
            }
        };
        first = false;

        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(kind) = entry.file_type() else {
                continue;
            };
            if kind.is_dir() {
                pending.push(path);
            } else if kind.is_symlink() && path.is_dir() {
                // Linked directories can point back into the tree.
                tracing::warn!("Skipping symlinked directory {}", path.display());
            } else if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
            {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}
