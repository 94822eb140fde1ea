use std::collections::HashSet;

use crate::form::{FormId, FormType};
use crate::host::ObjectRef;

use super::context::RuleContext;
use super::hit::{AttackType, WeaponType};

/// The predicate set a rule uses to decide whether it applies.
///
/// Every predicate is a set; an empty set is a wildcard. Non-empty sets are
/// ANDed together and each one passes when the context's value is a member.
/// The hit-only sets are consulted only for hit contexts.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub form_types: HashSet<FormType>,
    pub form_ids: HashSet<FormId>,
    /// Passes if the target has *any* of these.
    pub keywords: Vec<FormId>,
    /// Per-trigger gate, 0..=100. Rolled once per trigger by the engine.
    pub chance: f32,
    /// The rule fires only once this many qualifying interactions have
    /// accumulated for the same target. 0 disables counting.
    pub interactions: u32,

    pub weapon_types: HashSet<WeaponType>,
    pub weapons: HashSet<FormId>,
    pub projectiles: HashSet<FormId>,
    pub attacks: HashSet<AttackType>,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            form_types: HashSet::new(),
            form_ids: HashSet::new(),
            keywords: Vec::new(),
            chance: 100.0,
            interactions: 0,
            weapon_types: HashSet::new(),
            weapons: HashSet::new(),
            projectiles: HashSet::new(),
            attacks: HashSet::new(),
        }
    }
}

impl Filter {
    pub fn has_hit_predicates(&self) -> bool {
        !self.weapon_types.is_empty()
            || !self.weapons.is_empty()
            || !self.projectiles.is_empty()
            || !self.attacks.is_empty()
    }

    /// Evaluate the deterministic predicates. Chance and interaction count
    /// are stateful and handled by the engine.
    pub fn matches<R: ObjectRef>(&self, ctx: &RuleContext<R>) -> bool {
        if !self.form_types.is_empty() && !self.form_types.contains(&ctx.base.form_type) {
            return false;
        }

        if !self.form_ids.is_empty() && !self.form_ids.contains(&ctx.base.id) {
            return false;
        }

        if !self.keywords.is_empty()
            && !ctx.base.form_type.skips_keyword_check()
            && !self.keywords.iter().any(|kw| ctx.target.has_keyword(*kw))
        {
            return false;
        }

        let Some(hit) = &ctx.hit else {
            return true;
        };

        if !self.weapon_types.is_empty()
            && !hit.weapon_type.is_some_and(|t| self.weapon_types.contains(&t))
        {
            return false;
        }

        if !self.weapons.is_empty() && !hit.weapon.is_some_and(|w| self.weapons.contains(&w)) {
            return false;
        }

        if !self.projectiles.is_empty()
            && !hit.projectile.is_some_and(|p| self.projectiles.contains(&p))
        {
            return false;
        }

        if !self.attacks.is_empty() && !hit.attack.is_some_and(|a| self.attacks.contains(&a)) {
            return false;
        }

        true
    }
}
