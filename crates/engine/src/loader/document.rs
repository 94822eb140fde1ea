//! Permissive parsing of single rule entries.
//!
//! Every sub-field is parsed on its own. A bad entry costs only itself: a bad
//! keyword drops the keyword, a bad effect drops the effect. A rule is dropped
//! as a whole when it has no events, no surviving effects, or a filter field
//! whose entries all failed.

use std::time::Duration;

use serde_json::{Map, Value};

use crate::form::{BaseForm, FormType};
use crate::host::FormLookup;
use crate::rules::{
    AttackType, Effect, EffectKind, EventKind, Filter, FormRequirement, ItemCount, Rule, WeaponType,
};

use super::resolve::resolve;

/// How long a `Nudge` keeps pushing when the document gives no duration.
const DEFAULT_NUDGE: Duration = Duration::from_secs(1);

/// Largest `count` accepted for an effect or an item entry. Larger values
/// fall back to 1.
pub const MAX_COUNT: u32 = 1000;

pub(crate) struct RuleParser<'a, L: ?Sized> {
    lookup: &'a L,
    document: &'a str,
}

impl<'a, L: FormLookup + ?Sized> RuleParser<'a, L> {
    pub(crate) fn new(lookup: &'a L, document: &'a str) -> Self {
        Self { lookup, document }
    }

    pub(crate) fn parse_rule(&self, index: usize, value: &Value) -> Option<Rule> {
        let Some(obj) = value.as_object() else {
            tracing::error!("{} rule #{}: expected an object, skipping", self.document, index);
            return None;
        };

        let events = self.parse_events(index, obj.get("event"))?;

        let filter = match obj.get("filter") {
            None => Filter::default(),
            Some(Value::Object(fields)) => self.parse_filter(index, fields)?,
            Some(_) => {
                tracing::warn!("{} rule #{}: filter is not an object, ignoring it", self.document, index);
                Filter::default()
            }
        };

        let rule_chance = obj
            .get("chance")
            .and_then(|v| self.parse_chance(index, "chance", v))
            .unwrap_or(100.0);

        let effects = self.parse_effects(index, obj.get("effect"), rule_chance);
        if effects.is_empty() {
            tracing::error!("{} rule #{}: no usable effects, skipping", self.document, index);
            return None;
        }

        if filter.has_hit_predicates() {
            if !events.contains(&EventKind::Hit) {
                tracing::warn!(
                    "{} rule #{}: weapon/projectile/attack filters only apply to Hit events and will be ignored",
                    self.document,
                    index
                );
            } else if events.len() > 1 {
                tracing::warn!(
                    "{} rule #{}: weapon/projectile/attack filters only narrow Hit; other events match without them",
                    self.document,
                    index
                );
            }
        }

        Some(Rule::new(events, filter, effects).with_source(self.document))
    }

    // ── Events ───────────────────────────────────────────────────────────

    fn parse_events(&self, index: usize, value: Option<&Value>) -> Option<Vec<EventKind>> {
        let Some(value) = value else {
            tracing::error!("{} rule #{}: missing \"event\", skipping", self.document, index);
            return None;
        };

        let mut events = Vec::new();
        for tag in self.strings(index, "event", value) {
            match EventKind::from_tag(tag) {
                Some(kind) if !events.contains(&kind) => events.push(kind),
                Some(_) => {}
                None => tracing::warn!("{} rule #{}: unknown event {:?}", self.document, index, tag),
            }
        }

        if events.is_empty() {
            tracing::error!("{} rule #{}: no recognized event, skipping", self.document, index);
            return None;
        }
        Some(events)
    }

    // ── Filter ───────────────────────────────────────────────────────────

    /// `None` when a predicate the author wrote lost every entry: an empty
    /// set would match everything instead of nothing.
    fn parse_filter(&self, index: usize, fields: &Map<String, Value>) -> Option<Filter> {
        let mut filter = Filter::default();

        if let Some(v) = fields.get("formTypes") {
            let tags = self.strings(index, "formTypes", v);
            for tag in &tags {
                match FormType::from_tag(tag) {
                    Some(t) => {
                        filter.form_types.insert(t);
                    }
                    None => tracing::warn!("{} rule #{}: unknown form type {:?}", self.document, index, tag),
                }
            }
            self.require_some(index, "formTypes", tags.len(), filter.form_types.len())?;
        }

        if let Some(v) = fields.get("formIDs") {
            let (written, forms) = self.resolve_all(index, "formIDs", v, &[]);
            filter.form_ids = forms.into_iter().map(|f| f.id).collect();
            self.require_some(index, "formIDs", written, filter.form_ids.len())?;
        }

        if let Some(v) = fields.get("keywords") {
            let (written, forms) = self.resolve_all(index, "keywords", v, &[FormType::Keyword]);
            for form in forms {
                if !filter.keywords.contains(&form.id) {
                    filter.keywords.push(form.id);
                }
            }
            self.require_some(index, "keywords", written, filter.keywords.len())?;
        }

        if let Some(v) = fields.get("chance") {
            if let Some(chance) = self.parse_chance(index, "filter.chance", v) {
                filter.chance = chance;
            }
        }

        if let Some(v) = fields.get("interactions") {
            if let Some(n) = self.parse_count(index, "filter.interactions", v, u32::MAX) {
                filter.interactions = n;
            }
        }

        if let Some(v) = fields.get("weaponsTypes").or_else(|| fields.get("weaponTypes")) {
            let tags = self.strings(index, "weaponsTypes", v);
            for tag in &tags {
                match WeaponType::from_tag(tag) {
                    Some(t) => {
                        filter.weapon_types.insert(t);
                    }
                    None => tracing::warn!("{} rule #{}: unknown weapon type {:?}", self.document, index, tag),
                }
            }
            self.require_some(index, "weaponsTypes", tags.len(), filter.weapon_types.len())?;
        }

        if let Some(v) = fields.get("weapons") {
            let (written, forms) = self.resolve_all(index, "weapons", v, &[FormType::Weapon]);
            filter.weapons = forms.into_iter().map(|f| f.id).collect();
            self.require_some(index, "weapons", written, filter.weapons.len())?;
        }

        if let Some(v) = fields.get("projectiles") {
            let (written, forms) = self.resolve_all(index, "projectiles", v, &[FormType::Projectile]);
            filter.projectiles = forms.into_iter().map(|f| f.id).collect();
            self.require_some(index, "projectiles", written, filter.projectiles.len())?;
        }

        if let Some(v) = fields.get("attacks") {
            let tags = self.strings(index, "attacks", v);
            for tag in &tags {
                match AttackType::from_tag(tag) {
                    Some(t) => {
                        filter.attacks.insert(t);
                    }
                    None => tracing::warn!("{} rule #{}: unknown attack type {:?}", self.document, index, tag),
                }
            }
            self.require_some(index, "attacks", tags.len(), filter.attacks.len())?;
        }

        Some(filter)
    }

    fn require_some(&self, index: usize, field: &str, written: usize, kept: usize) -> Option<()> {
        if written > 0 && kept == 0 {
            tracing::error!(
                "{} rule #{}: none of the {} {} entries are usable, skipping",
                self.document,
                index,
                written,
                field
            );
            return None;
        }
        Some(())
    }

    // ── Effects ──────────────────────────────────────────────────────────

    fn parse_effects(&self, index: usize, value: Option<&Value>, default_chance: f32) -> Vec<Effect> {
        let entries: Vec<&Value> = match value {
            None => {
                tracing::error!("{} rule #{}: missing \"effect\"", self.document, index);
                return Vec::new();
            }
            Some(Value::Array(items)) => items.iter().collect(),
            Some(single) => vec![single],
        };

        entries
            .into_iter()
            .enumerate()
            .filter_map(|(n, v)| self.parse_effect(index, n, v, default_chance))
            .collect()
    }

    fn parse_effect(&self, index: usize, n: usize, value: &Value, default_chance: f32) -> Option<Effect> {
        let Some(obj) = value.as_object() else {
            tracing::warn!("{} rule #{} effect #{}: not an object, dropping", self.document, index, n);
            return None;
        };
        let Some(tag) = obj.get("type").and_then(Value::as_str) else {
            tracing::warn!("{} rule #{} effect #{}: missing \"type\", dropping", self.document, index, n);
            return None;
        };
        let Some(kind) = EffectKind::from_tag(tag) else {
            tracing::warn!("{} rule #{} effect #{}: unknown type {:?}, dropping", self.document, index, n, tag);
            return None;
        };

        let mut effect = Effect::new(kind);
        effect.chance = obj
            .get("chance")
            .and_then(|v| self.parse_chance(index, "effect.chance", v))
            .unwrap_or(default_chance);

        if let Some(v) = obj.get("count") {
            match self.parse_count(index, "effect.count", v, MAX_COUNT) {
                Some(0) => tracing::warn!(
                    "{} rule #{} effect #{}: count 0 makes no sense, using 1",
                    self.document,
                    index,
                    n
                ),
                Some(count) => effect.count = count,
                None => {}
            }
        }

        match kind.requirement() {
            FormRequirement::Nothing => {}
            FormRequirement::Single(expected) => {
                let Some(raw) = obj.get("formID").and_then(Value::as_str) else {
                    tracing::warn!(
                        "{} rule #{} effect #{}: {} needs a formID, dropping",
                        self.document,
                        index,
                        n,
                        kind.as_str()
                    );
                    return None;
                };
                match resolve(self.lookup, raw, expected) {
                    Ok(form) => effect.form = Some(form.id),
                    Err(e) => {
                        tracing::warn!("{} rule #{} effect #{}: {}, dropping", self.document, index, n, e);
                        return None;
                    }
                }
            }
            FormRequirement::Items(expected) => {
                effect.items = self.parse_items(index, n, obj.get("items"), expected);
                if effect.items.is_empty() {
                    tracing::warn!(
                        "{} rule #{} effect #{}: {} has no usable items, dropping",
                        self.document,
                        index,
                        n,
                        kind.as_str()
                    );
                    return None;
                }
            }
        }

        if kind == EffectKind::Nudge {
            effect.duration = DEFAULT_NUDGE;
        }
        if let Some(v) = obj.get("duration") {
            match v.as_f64() {
                Some(secs) if secs.is_finite() && secs >= 0.0 => {
                    effect.duration = Duration::from_secs_f64(secs);
                }
                _ => tracing::warn!(
                    "{} rule #{} effect #{}: invalid duration {}, using default",
                    self.document,
                    index,
                    n,
                    v
                ),
            }
        }

        Some(effect)
    }

    fn parse_items(&self, index: usize, n: usize, value: Option<&Value>, expected: &[FormType]) -> Vec<ItemCount> {
        let Some(Value::Array(entries)) = value else {
            if value.is_some() {
                tracing::warn!("{} rule #{} effect #{}: items must be a list", self.document, index, n);
            }
            return Vec::new();
        };

        let mut items = Vec::new();
        for entry in entries {
            let Some(raw) = entry.get("formID").and_then(Value::as_str) else {
                tracing::warn!("{} rule #{} effect #{}: item without formID, skipping", self.document, index, n);
                continue;
            };
            let form = match resolve(self.lookup, raw, expected) {
                Ok(form) => form,
                Err(e) => {
                    tracing::warn!("{} rule #{} effect #{}: dropping item: {}", self.document, index, n, e);
                    continue;
                }
            };
            let count = entry
                .get("count")
                .and_then(|v| self.parse_count(index, "items.count", v, MAX_COUNT))
                .filter(|c| *c > 0)
                .unwrap_or(1);
            items.push(ItemCount { form: form.id, count });
        }
        items
    }

    // ── Field helpers ────────────────────────────────────────────────────

    /// A single string or a list of strings. Non-string entries are dropped.
    fn strings<'v>(&self, index: usize, field: &str, value: &'v Value) -> Vec<&'v str> {
        match value {
            Value::String(s) => vec![s.as_str()],
            Value::Array(items) => items
                .iter()
                .filter_map(|item| {
                    let s = item.as_str();
                    if s.is_none() {
                        tracing::warn!(
                            "{} rule #{}: ignoring non-string {} in {}",
                            self.document,
                            index,
                            item,
                            field
                        );
                    }
                    s
                })
                .collect(),
            other => {
                tracing::warn!(
                    "{} rule #{}: {} must be a string or a list of strings, got {}",
                    self.document,
                    index,
                    field,
                    other
                );
                Vec::new()
            }
        }
    }

    /// How many entries were written, and the ones that resolved.
    fn resolve_all(&self, index: usize, field: &str, value: &Value, expected: &[FormType]) -> (usize, Vec<BaseForm>) {
        let raw = self.strings(index, field, value);
        let written = raw.len();
        let forms = raw
            .into_iter()
            .filter_map(|raw| match resolve(self.lookup, raw, expected) {
                Ok(form) => Some(form),
                Err(e) => {
                    tracing::warn!("{} rule #{}: dropping {} entry: {}", self.document, index, field, e);
                    None
                }
            })
            .collect();
        (written, forms)
    }

    fn parse_chance(&self, index: usize, field: &str, value: &Value) -> Option<f32> {
        let Some(raw) = value.as_f64().filter(|c| c.is_finite()) else {
            tracing::warn!("{} rule #{}: {} must be a number, got {}", self.document, index, field, value);
            return None;
        };
        if !(0.0..=100.0).contains(&raw) {
            tracing::warn!("{} rule #{}: {} {} clamped to 0..=100", self.document, index, field, raw);
        }
        Some(raw.clamp(0.0, 100.0) as f32)
    }

    /// A non-negative integer no larger than `max`. Anything else is
    /// rejected so the caller keeps its default.
    fn parse_count(&self, index: usize, field: &str, value: &Value, max: u32) -> Option<u32> {
        let Some(n) = value.as_u64() else {
            tracing::warn!(
                "{} rule #{}: {} must be a non-negative integer, got {}",
                self.document,
                index,
                field,
                value
            );
            return None;
        };
        match u32::try_from(n) {
            Ok(n) if n <= max => Some(n),
            _ => {
                tracing::warn!(
                    "{} rule #{}: {} {} is above the limit of {}, using default",
                    self.document,
                    index,
                    field,
                    n,
                    max
                );
                None
            }
        }
    }
}
