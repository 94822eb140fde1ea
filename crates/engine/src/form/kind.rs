/// Category tag of a base object.
///
/// The engine only interprets a handful of these: which categories each
/// event kind may act on, which are exempt from keyword checks, and which
/// are valid targets for each effect's primary form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormType {
    Activator,
    Container,
    Door,
    Flora,
    Furniture,
    Static,
    MovableStatic,
    Tree,
    Light,
    Weapon,
    Armor,
    Ammo,
    Misc,
    Book,
    Ingredient,
    AlchemyItem,
    Scroll,
    SoulGem,
    Key,
    Npc,
    Keyword,
    Projectile,
    Spell,
    Sound,
    Explosion,
    ImpactDataSet,
    LeveledItem,
    LeveledNpc,
}

/// Categories that can sit in an inventory.
pub const INVENTORY_ITEMS: &[FormType] = &[
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
    FormType::Light,
];

impl FormType {
    /// Parse a document tag. Case, spaces, dashes and underscores are ignored,
    /// so `"MovableStatic"`, `"movable_static"` and `"Movable Static"` agree.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let norm: String = tag
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        let kind = match norm.as_str() {
            "activator" => Self::Activator,
            "container" => Self::Container,
            "door" => Self::Door,
            "flora" => Self::Flora,
            "furniture" => Self::Furniture,
            "static" => Self::Static,
            "movablestatic" | "moveablestatic" => Self::MovableStatic,
            "tree" => Self::Tree,
            "light" => Self::Light,
            "weapon" => Self::Weapon,
            "armor" | "armour" => Self::Armor,
            "ammo" | "ammunition" => Self::Ammo,
            "misc" | "miscitem" => Self::Misc,
            "book" => Self::Book,
            "ingredient" => Self::Ingredient,
            "alchemyitem" | "potion" | "ingestible" => Self::AlchemyItem,
            "scroll" => Self::Scroll,
            "soulgem" => Self::SoulGem,
            "key" => Self::Key,
            "npc" | "actor" => Self::Npc,
            "keyword" => Self::Keyword,
            "projectile" => Self::Projectile,
            "spell" => Self::Spell,
            "sound" | "sounddescriptor" => Self::Sound,
            "explosion" => Self::Explosion,
            "impactdataset" | "impact" => Self::ImpactDataSet,
            "leveleditem" => Self::LeveledItem,
            "levelednpc" | "leveledactor" => Self::LeveledNpc,
            _ => return None,
        };
        Some(kind)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Activator => "Activator",
            Self::Container => "Container",
            Self::Door => "Door",
            Self::Flora => "Flora",
            Self::Furniture => "Furniture",
            Self::Static => "Static",
            Self::MovableStatic => "MovableStatic",
            Self::Tree => "Tree",
            Self::Light => "Light",
            Self::Weapon => "Weapon",
            Self::Armor => "Armor",
            Self::Ammo => "Ammo",
            Self::Misc => "Misc",
            Self::Book => "Book",
            Self::Ingredient => "Ingredient",
            Self::AlchemyItem => "AlchemyItem",
            Self::Scroll => "Scroll",
            Self::SoulGem => "SoulGem",
            Self::Key => "Key",
            Self::Npc => "Npc",
            Self::Keyword => "Keyword",
            Self::Projectile => "Projectile",
            Self::Spell => "Spell",
            Self::Sound => "Sound",
            Self::Explosion => "Explosion",
            Self::ImpactDataSet => "ImpactDataSet",
            Self::LeveledItem => "LeveledItem",
            Self::LeveledNpc => "LeveledNpc",
        }
    }

    /// These categories carry no keywords, so a keyword filter always passes
    /// for them.
    pub const fn skips_keyword_check(&self) -> bool {
        matches!(
            self,
            Self::Container | Self::Static | Self::MovableStatic | Self::Tree
        )
    }

    pub fn is_inventory_item(&self) -> bool {
        INVENTORY_ITEMS.contains(self)
    }
}

impl std::fmt::Display for FormType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_normalized() {
        assert_eq!(FormType::from_tag("Container"), Some(FormType::Container));
        assert_eq!(FormType::from_tag("movable_static"), Some(FormType::MovableStatic));
        assert_eq!(FormType::from_tag("Moveable Static"), Some(FormType::MovableStatic));
        assert_eq!(FormType::from_tag("POTION"), Some(FormType::AlchemyItem));
        assert_eq!(FormType::from_tag("spaceship"), None);
    }

    #[test]
    fn keyword_exempt_categories() {
        for t in [FormType::Container, FormType::Static, FormType::MovableStatic, FormType::Tree] {
            assert!(t.skips_keyword_check(), "{t} should skip keywords");
        }
        assert!(!FormType::Activator.skips_keyword_check());
        assert!(!FormType::Weapon.skips_keyword_check());
    }

    #[test]
    fn as_str_round_trips_through_from_tag() {
        for t in [FormType::Flora, FormType::ImpactDataSet, FormType::LeveledNpc] {
            assert_eq!(FormType::from_tag(t.as_str()), Some(t));
        }
    }
}
