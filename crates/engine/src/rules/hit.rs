//! Classification of hit events: what kind of implement and what kind of
//! attack. Hosts map their own weapon/attack data onto these.

use crate::form::FormId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeaponType {
    HandToHand,
    Sword,
    Dagger,
    WarAxe,
    Mace,
    Greatsword,
    Battleaxe,
    Warhammer,
    Bow,
    Staff,
    Crossbow,
}

impl WeaponType {
    pub fn from_tag(tag: &str) -> Option<Self> {
        let norm: String = tag
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        let kind = match norm.as_str() {
            "handtohand" | "unarmed" | "fist" => Self::HandToHand,
            "sword" | "onehandsword" => Self::Sword,
            "dagger" | "onehanddagger" => Self::Dagger,
            "waraxe" | "axe" | "onehandaxe" => Self::WarAxe,
            "mace" | "onehandmace" => Self::Mace,
            "greatsword" | "twohandsword" => Self::Greatsword,
            "battleaxe" | "twohandaxe" => Self::Battleaxe,
            "warhammer" => Self::Warhammer,
            "bow" => Self::Bow,
            "staff" => Self::Staff,
            "crossbow" => Self::Crossbow,
            _ => return None,
        };
        Some(kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttackType {
    Regular,
    Power,
    Sneak,
    Bash,
    Blocked,
    Projectile,
    /// A released physics object struck the target.
    Thrown,
}

impl AttackType {
    pub fn from_tag(tag: &str) -> Option<Self> {
        let norm: String = tag
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        let kind = match norm.as_str() {
            "regular" | "normal" => Self::Regular,
            "power" | "powerattack" => Self::Power,
            "sneak" | "sneakattack" => Self::Sneak,
            "bash" | "bashattack" => Self::Bash,
            "blocked" | "hitblocked" => Self::Blocked,
            "projectile" | "ranged" => Self::Projectile,
            "thrown" => Self::Thrown,
            _ => return None,
        };
        Some(kind)
    }
}

/// Hit-only attributes of a [`RuleContext`](super::context::RuleContext).
///
/// Every field is a stable identifier or a plain classification, so the whole
/// struct can be copied into a deferred task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitAttributes {
    pub weapon: Option<FormId>,
    pub projectile: Option<FormId>,
    pub weapon_type: Option<WeaponType>,
    pub attack: Option<AttackType>,
}
