use std::time::Duration;

use crate::form::{FormId, FormType};

/// Base categories that can be placed in the world as a loose object.
const PLACEABLE: &[FormType] = &[
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

/// What an effect needs resolved at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormRequirement {
    /// Acts on the target alone.
    Nothing,
    /// A primary form of one of these categories.
    Single(&'static [FormType]),
    /// A non-empty `items` list whose forms are of these categories.
    Items(&'static [FormType]),
}

/// Closed set of reactions. Each variant maps to exactly one executor in the
/// host's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Dispose,
    SpawnItem,
    SpawnMultipleItems,
    SpawnSpell,
    SpawnActor,
    SpawnImpact,
    SpawnExplosion,
    SwapItem,
    SwapWithMultipleItems,
    PlaySound,
    SpawnLeveledItem,
    /// Push the target repeatedly for `duration`. Runs as a timed task.
    Nudge,
}

impl EffectKind {
    pub const ALL: [EffectKind; 12] = [
        Self::Dispose,
        Self::SpawnItem,
        Self::SpawnMultipleItems,
        Self::SpawnSpell,
        Self::SpawnActor,
        Self::SpawnImpact,
        Self::SpawnExplosion,
        Self::SwapItem,
        Self::SwapWithMultipleItems,
        Self::PlaySound,
        Self::SpawnLeveledItem,
        Self::Nudge,
    ];

    pub fn from_tag(tag: &str) -> Option<Self> {
        let norm: String = tag
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(&norm))
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dispose => "Dispose",
            Self::SpawnItem => "SpawnItem",
            Self::SpawnMultipleItems => "SpawnMultipleItems",
            Self::SpawnSpell => "SpawnSpell",
            Self::SpawnActor => "SpawnActor",
            Self::SpawnImpact => "SpawnImpact",
            Self::SpawnExplosion => "SpawnExplosion",
            Self::SwapItem => "SwapItem",
            Self::SwapWithMultipleItems => "SwapWithMultipleItems",
            Self::PlaySound => "PlaySound",
            Self::SpawnLeveledItem => "SpawnLeveledItem",
            Self::Nudge => "Nudge",
        }
    }

    pub const fn requirement(&self) -> FormRequirement {
        match self {
            Self::Dispose | Self::Nudge => FormRequirement::Nothing,
            Self::SpawnItem | Self::SwapItem => FormRequirement::Single(PLACEABLE),
            Self::SpawnMultipleItems | Self::SwapWithMultipleItems => {
                FormRequirement::Items(PLACEABLE)
            }
            Self::SpawnSpell => FormRequirement::Single(&[FormType::Spell, FormType::Scroll]),
            Self::SpawnActor => FormRequirement::Single(&[FormType::Npc, FormType::LeveledNpc]),
            Self::SpawnImpact => FormRequirement::Single(&[FormType::ImpactDataSet]),
            Self::SpawnExplosion => FormRequirement::Single(&[FormType::Explosion]),
            Self::PlaySound => FormRequirement::Single(&[FormType::Sound]),
            Self::SpawnLeveledItem => FormRequirement::Single(&[FormType::LeveledItem]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemCount {
    pub form: FormId,
    pub count: u32,
}

/// One declared reaction of a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    pub kind: EffectKind,
    pub form: Option<FormId>,
    pub items: Vec<ItemCount>,
    pub count: u32,
    /// Independent gate, 0..=100, rolled once per dispatch.
    pub chance: f32,
    pub duration: Duration,
}

impl Effect {
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            form: None,
            items: Vec::new(),
            count: 1,
            chance: 100.0,
            duration: Duration::ZERO,
        }
    }

    pub fn with_form(mut self, form: FormId) -> Self {
        self.form = Some(form);
        self
    }

    pub fn with_chance(mut self, chance: f32) -> Self {
        self.chance = chance;
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }
}
