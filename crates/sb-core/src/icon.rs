use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The skill-panel icon a habit is drawn with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillIcon {
    #[default]
    Attack,
    Strength,
    Defence,
    Ranged,
    Prayer,
    Magic,
    Runecraft,
    Construction,
    Hitpoints,
    Agility,
    Herblore,
    Thieving,
    Crafting,
    Fletching,
    Slayer,
    Hunter,
    Mining,
    Smithing,
    Fishing,
    Cooking,
    Firemaking,
    Woodcutting,
    Farming,
}

impl SkillIcon {
    pub const ALL: [SkillIcon; 23] = [
        SkillIcon::Attack,
        SkillIcon::Strength,
        SkillIcon::Defence,
        SkillIcon::Ranged,
        SkillIcon::Prayer,
        SkillIcon::Magic,
        SkillIcon::Runecraft,
        SkillIcon::Construction,
        SkillIcon::Hitpoints,
        SkillIcon::Agility,
        SkillIcon::Herblore,
        SkillIcon::Thieving,
        SkillIcon::Crafting,
        SkillIcon::Fletching,
        SkillIcon::Slayer,
        SkillIcon::Hunter,
        SkillIcon::Mining,
        SkillIcon::Smithing,
        SkillIcon::Fishing,
        SkillIcon::Cooking,
        SkillIcon::Firemaking,
        SkillIcon::Woodcutting,
        SkillIcon::Farming,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SkillIcon::Attack => "Attack",
            SkillIcon::Strength => "Strength",
            SkillIcon::Defence => "Defence",
            SkillIcon::Ranged => "Ranged",
            SkillIcon::Prayer => "Prayer",
            SkillIcon::Magic => "Magic",
            SkillIcon::Runecraft => "Runecraft",
            SkillIcon::Construction => "Construction",
            SkillIcon::Hitpoints => "Hitpoints",
            SkillIcon::Agility => "Agility",
            SkillIcon::Herblore => "Herblore",
            SkillIcon::Thieving => "Thieving",
            SkillIcon::Crafting => "Crafting",
            SkillIcon::Fletching => "Fletching",
            SkillIcon::Slayer => "Slayer",
            SkillIcon::Hunter => "Hunter",
            SkillIcon::Mining => "Mining",
            SkillIcon::Smithing => "Smithing",
            SkillIcon::Fishing => "Fishing",
            SkillIcon::Cooking => "Cooking",
            SkillIcon::Firemaking => "Firemaking",
            SkillIcon::Woodcutting => "Woodcutting",
            SkillIcon::Farming => "Farming",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            SkillIcon::Attack => "⚔️",
            SkillIcon::Strength => "💪",
            SkillIcon::Defence => "🛡️",
            SkillIcon::Ranged => "🏹",
            SkillIcon::Prayer => "✨",
            SkillIcon::Magic => "🔮",
            SkillIcon::Runecraft => "🔵",
            SkillIcon::Construction => "🏠",
            SkillIcon::Hitpoints => "❤️",
            SkillIcon::Agility => "🏃",
            SkillIcon::Herblore => "🌿",
            SkillIcon::Thieving => "🎭",
            SkillIcon::Crafting => "✂️",
            SkillIcon::Fletching => "🪶",
            SkillIcon::Slayer => "💀",
            SkillIcon::Hunter => "🦊",
            SkillIcon::Mining => "⛏️",
            SkillIcon::Smithing => "🔨",
            SkillIcon::Fishing => "🎣",
            SkillIcon::Cooking => "🍖",
            SkillIcon::Firemaking => "🔥",
            SkillIcon::Woodcutting => "🪓",
            SkillIcon::Farming => "🌾",
        }
    }

    /// Legacy numeric slot ("1".."23") used by the browser build.
    pub fn from_slot(slot: &str) -> Option<SkillIcon> {
        let index: usize = slot.trim().parse().ok()?;
        index
            .checked_sub(1)
            .and_then(|i| SkillIcon::ALL.get(i).copied())
    }

    pub fn slot(self) -> usize {
        SkillIcon::ALL
            .iter()
            .position(|&icon| icon == self)
            .map_or(1, |i| i + 1)
    }
}

impl fmt::Display for SkillIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SkillIcon {
    type Err = String;

    /// Accepts a label (any case) or a legacy slot number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        SkillIcon::ALL
            .iter()
            .copied()
            .find(|icon| icon.label().eq_ignore_ascii_case(needle))
            .or_else(|| SkillIcon::from_slot(needle))
            .ok_or_else(|| format!("unknown skill icon '{needle}'"))
    }
}
