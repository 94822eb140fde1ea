//! Scenario files: the load order, base forms and placed objects a
//! [`SimWorld`](super::SimWorld) starts with.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;

use super::Position;

const BUILTIN: &str = include_str!("../../assets/default_scenario.json");

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Plugin names in load order.
    pub plugins: Vec<String>,
    #[serde(default = "default_player_level")]
    pub player_level: u16,
    #[serde(default)]
    pub forms: Vec<FormSpec>,
    /// Placed objects by name, placed in file order.
    #[serde(default)]
    pub objects: IndexMap<String, ObjectSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSpec {
    /// Symbolic id, `"Plugin.esp:0x800"`.
    pub id: String,
    #[serde(rename = "type")]
    pub form_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Leveled list contents.
    #[serde(default)]
    pub entries: Vec<EntrySpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntrySpec {
    pub level: u16,
    #[serde(rename = "formID")]
    pub form_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectSpec {
    pub base: String,
    #[serde(default)]
    pub position: Position,
}

fn default_player_level() -> u16 {
    1
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading scenario {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing scenario {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// The small world shipped with the binary.
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN).context("parsing built-in scenario")
    }
}
