//! Errors raised while parsing or validating domain values.

/// A string could not be turned into a domain value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid {kind} id: {value}")]
    InvalidId { kind: &'static str, value: String },

    #[error("Invalid {kind}: {value}")]
    InvalidVariant { kind: &'static str, value: String },
}

/// A record failed one of its validity predicates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Character name must be at least {min} characters")]
    CharacterNameTooShort { min: usize },

    #[error("Item name must be between {min} and {max} characters")]
    ItemNameLength { min: usize, max: usize },

    #[error("Item description must be between {min} and {max} characters")]
    ItemDescriptionLength { min: usize, max: usize },

    #[error("Item rarity must be between 1 and 5, got {0}")]
    Rarity(u8),

    #[error("Equippable item '{0}' has no active attribute")]
    EquippableWithoutAttributes(String),
}
