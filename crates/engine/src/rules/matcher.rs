//! Structural gates applied before a rule's own filter.

use crate::form::FormType;
use crate::host::ObjectRef;

use super::context::RuleContext;
use super::event::EventKind;
use super::Rule;

const ACTIVATABLE: &[FormType] = &[
    FormType::Activator,
    FormType::Container,
    FormType::Door,
    FormType::Flora,
    FormType::Furniture,
    FormType::Tree,
];

const HITTABLE: &[FormType] = &[
    FormType::Activator,
    FormType::Container,
    FormType::Door,
    FormType::Flora,
    FormType::Furniture,
    FormType::Static,
    FormType::MovableStatic,
    FormType::Tree,
    FormType::Light,
    FormType::Weapon,
    FormType::Armor,
    FormType::Ammo,
    FormType::Misc,
    FormType::Book,
    FormType::Ingredient,
    FormType::AlchemyItem,
    FormType::Scroll,
    FormType::SoulGem,
    FormType::Key,
];

const GRABBABLE: &[FormType] = &[
    FormType::MovableStatic,
    FormType::Light,
    FormType::Weapon,
    FormType::Armor,
    FormType::Ammo,
    FormType::Misc,
    FormType::Book,
    FormType::Ingredient,
    FormType::AlchemyItem,
    FormType::Scroll,
    FormType::SoulGem,
    FormType::Key,
];

/// Whether `event` is meaningful at all for an entity of category `form_type`.
/// Independent of any rule.
pub fn category_allowed(event: EventKind, form_type: FormType) -> bool {
    let allowed = match event {
        EventKind::Activate => ACTIVATABLE,
        EventKind::Hit => HITTABLE,
        EventKind::Grab | EventKind::Release => GRABBABLE,
    };
    allowed.contains(&form_type)
}

/// Event membership, category gate, then the rule's filter.
pub fn rule_applies<R: ObjectRef>(rule: &Rule, ctx: &RuleContext<R>) -> bool {
    rule.events.contains(&ctx.event)
        && category_allowed(ctx.event, ctx.base.form_type)
        && rule.filter.matches(ctx)
}
