//! Character aggregate: base record, stats and customization.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ids::CharacterId;

const CHARACTER_NAME_MIN_LEN: usize = 2;

string_enum! {
    /// Body silhouette used by the character renderer
    BodyType, "body type" {
        TypeA => "type_a",
        TypeB => "type_b",
    }
}

string_enum! {
    Species, "species" {
        Aasimar => "aasimar",
        Dragonborn => "dragonborn",
        Dwarf => "dwarf",
        Elf => "elf",
        Gnome => "gnome",
        Goliath => "goliath",
        Halfling => "halfling",
        Human => "human",
        Orc => "orc",
        Tiefling => "tiefling",
    }
}

string_enum! {
    Class, "class" {
        Barbarian => "barbarian",
        Bard => "bard",
        Cleric => "cleric",
        Druid => "druid",
        Fighter => "fighter",
        Monk => "monk",
        Paladin => "paladin",
        Ranger => "ranger",
        Rogue => "rogue",
        Sorcerer => "sorcerer",
        Warlock => "warlock",
        Wizard => "wizard",
    }
}

/// Ability scores, stored in the `stats` table under the character's id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub strength: u8,
    pub dexterity: u8,
    pub constitution: u8,
    pub intelligence: u8,
    pub wisdom: u8,
    pub charisma: u8,
}

/// Appearance indices, stored in the `customizations` table under the character's id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customization {
    pub hair: u32,
    pub face: u32,
    pub shirt: u32,
    pub pants: u32,
    pub shoes: u32,
}

/// A character together with the two records it owns.
///
/// The three parts share one primary key value and are always written,
/// replaced and deleted as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    #[serde(default)]
    pub id: CharacterId,
    pub name: String,
    pub body_type: BodyType,
    pub species: Species,
    pub class: Class,
    pub stats: Stats,
    pub customization: Customization,
}

impl Character {
    /// Build an unsaved character; the store assigns the id on create.
    pub fn new(
        name: impl Into<String>,
        body_type: BodyType,
        species: Species,
        class: Class,
        stats: Stats,
        customization: Customization,
    ) -> Self {
        Self {
            id: CharacterId::UNASSIGNED,
            name: name.into(),
            body_type,
            species,
            class,
            stats,
            customization,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().chars().count() < CHARACTER_NAME_MIN_LEN {
            return Err(ValidationError::CharacterNameTooShort {
                min: CHARACTER_NAME_MIN_LEN,
            });
        }
        Ok(())
    }
}

/// One page of characters plus the total number stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterPage {
    pub characters: Vec<Character>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aria() -> Character {
        Character::new(
            "Aria",
            BodyType::TypeA,
            Species::Human,
            Class::Fighter,
            Stats {
                strength: 15,
                dexterity: 12,
                constitution: 14,
                intelligence: 10,
                wisdom: 8,
                charisma: 11,
            },
            Customization {
                hair: 1,
                face: 2,
                shirt: 3,
                pants: 4,
                shoes: 5,
            },
        )
    }

    #[test]
    fn test_enum_round_trip_text() {
        for class in Class::ALL {
            assert_eq!(class.as_str().parse::<Class>().unwrap(), *class);
        }
        assert_eq!("type_b".parse::<BodyType>().unwrap(), BodyType::TypeB);
        assert!("mage".parse::<Class>().is_err());
        assert_eq!(Species::ALL.len(), 10);
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&aria()).unwrap();
        assert!(json.contains("\"body_type\":\"type_a\""));
        assert!(json.contains("\"class\":\"fighter\""));
    }

    #[test]
    fn test_missing_id_deserializes_unassigned() {
        let json = r#"{
            "name": "Bram", "body_type": "type_b", "species": "dwarf", "class": "cleric",
            "stats": {"strength": 10, "dexterity": 10, "constitution": 10,
                      "intelligence": 10, "wisdom": 10, "charisma": 10},
            "customization": {"hair": 0, "face": 0, "shirt": 0, "pants": 0, "shoes": 0}
        }"#;
        let character: Character = serde_json::from_str(json).unwrap();
        assert!(!character.id.is_assigned());
        assert_eq!(character.species, Species::Dwarf);
    }

    #[test]
    fn test_validate_name() {
        assert!(aria().validate().is_ok());

        let mut short = aria();
        short.name = "A".to_string();
        assert!(short.validate().is_err());
    }
}
