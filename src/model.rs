//! Data models for the idol board.
//!
//! This module defines the fundamental data structures:
//! - `Footprint`: The cell size of an idol type
//! - `Modifier`: An immutable modifier line from the catalog
//! - `Idol`: A modifier-bearing item that can be placed on the board
//!
//! Constructors validate the invariants and return `ValidationError` on violation.

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::types::Spanning;

/// Unique identifier of an idol.
pub type IdolId = u64;

/// Maximum number of prefixes on a non-unique idol.
pub const MAX_PREFIXES: usize = 2;

/// Maximum number of suffixes on a non-unique idol.
pub const MAX_SUFFIXES: usize = 2;

/// Validation error for model data.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    InvalidFootprint(String),
    InvalidModifier(String),
    InvalidIdol(String),
    InvalidCatalog(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidFootprint(msg) => write!(f, "Invalid footprint: {}", msg),
            ValidationError::InvalidModifier(msg) => write!(f, "Invalid modifier: {}", msg),
            ValidationError::InvalidIdol(msg) => write!(f, "Invalid idol: {}", msg),
            ValidationError::InvalidCatalog(msg) => write!(f, "Invalid catalog: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

fn require_non_empty(value: &str, what: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} must not be empty", what));
    }
    Ok(())
}

/// Grid footprint of an idol type.
///
/// # Fields
/// * `type_id` - Identifier of the idol type (e.g. `conqueror`)
/// * `name` - Display name of the type (e.g. `Conqueror Idol`)
/// * `width` - Number of columns covered
/// * `height` - Number of rows covered
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"type_id": "conqueror", "name": "Conqueror Idol", "width": 2, "height": 2}))]
pub struct Footprint {
    pub type_id: String,
    pub name: String,
    pub width: usize,
    pub height: usize,
}

impl Footprint {
    /// Creates a new footprint with validation.
    ///
    /// # Examples
    /// ```
    /// use idol_planner::model::Footprint;
    ///
    /// assert!(Footprint::new("minor", "Minor Idol", 1, 1).is_ok());
    /// assert!(Footprint::new("broken", "Broken Idol", 0, 1).is_err());
    /// ```
    pub fn new(
        type_id: impl Into<String>,
        name: impl Into<String>,
        width: usize,
        height: usize,
    ) -> Result<Self, ValidationError> {
        let footprint = Self {
            type_id: type_id.into(),
            name: name.into(),
            width,
            height,
        };
        footprint.validate()?;
        Ok(footprint)
    }

    /// Checks the footprint invariants (used after deserialization as well).
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty(&self.type_id, "Type id").map_err(ValidationError::InvalidFootprint)?;
        if self.width == 0 || self.height == 0 {
            return Err(ValidationError::InvalidFootprint(format!(
                "{} must be at least 1x1, got: {}x{}",
                self.type_id, self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Spanning for Footprint {
    fn span(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}

/// Slot a modifier occupies on an idol.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ModifierClass {
    Prefix,
    Suffix,
    Unique,
}

impl ModifierClass {
    pub fn code(&self) -> &'static str {
        match self {
            ModifierClass::Prefix => "prefix",
            ModifierClass::Suffix => "suffix",
            ModifierClass::Unique => "unique",
        }
    }
}

/// A modifier line from the catalog.
///
/// # Fields
/// * `id` - Catalog identifier
/// * `name` - Display family name
/// * `text` - The literal effect line, numbers included
/// * `class` - Prefix, suffix or unique
/// * `supported_type_ids` - Idol types that can roll this modifier
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "rarity_1",
    "name": "of Rarity",
    "text": "10% increased Rarity of Items found in your Maps",
    "class": "suffix",
    "supported_type_ids": ["minor", "noble"]
}))]
pub struct Modifier {
    pub id: String,
    pub name: String,
    pub text: String,
    pub class: ModifierClass,
    #[serde(default)]
    pub supported_type_ids: Vec<String>,
}

impl Modifier {
    /// Creates a new modifier with validation.
    ///
    /// Duplicate type ids are removed while keeping the first-seen order.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        text: impl Into<String>,
        class: ModifierClass,
        supported_type_ids: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, ValidationError> {
        let mut modifier = Self {
            id: id.into(),
            name: name.into(),
            text: text.into(),
            class,
            supported_type_ids: Vec::new(),
        };
        for type_id in supported_type_ids {
            modifier.add_supported_type(type_id.into());
        }
        require_non_empty(&modifier.id, "Modifier id").map_err(ValidationError::InvalidModifier)?;
        require_non_empty(&modifier.text, "Modifier text")
            .map_err(ValidationError::InvalidModifier)?;
        Ok(modifier)
    }

    /// Checks if the modifier can roll on the given idol type.
    pub fn supports(&self, type_id: &str) -> bool {
        self.supported_type_ids.iter().any(|t| t == type_id)
    }

    pub(crate) fn add_supported_type(&mut self, type_id: String) {
        if !self.supports(&type_id) {
            self.supported_type_ids.push(type_id);
        }
    }
}

/// A modifier-bearing item that can be placed on the board.
///
/// `is_placed` is a cache; the board itself is the source of truth
/// (see `Inventory::sync_placement`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Idol {
    pub id: IdolId,
    pub type_id: String,
    pub name: String,
    #[serde(default)]
    pub is_placed: bool,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub prefixes: Vec<Modifier>,
    #[serde(default)]
    pub suffixes: Vec<Modifier>,
    #[serde(default)]
    pub unique_modifiers: Vec<Modifier>,
}

impl Idol {
    /// Creates a regular (non-unique) idol with validation.
    ///
    /// # Parameters
    /// * `id` - Unique ID
    /// * `type_id` - Idol type
    /// * `name` - Display name
    /// * `prefixes` - At most two prefixes
    /// * `suffixes` - At most two suffixes
    ///
    /// # Returns
    /// `Ok(Idol)` for valid values, otherwise `Err(ValidationError)`
    pub fn new(
        id: IdolId,
        type_id: impl Into<String>,
        name: impl Into<String>,
        prefixes: Vec<Modifier>,
        suffixes: Vec<Modifier>,
    ) -> Result<Self, ValidationError> {
        let idol = Self {
            id,
            type_id: type_id.into(),
            name: name.into(),
            is_placed: false,
            is_unique: false,
            prefixes,
            suffixes,
            unique_modifiers: Vec::new(),
        };
        idol.validate()?;
        Ok(idol)
    }

    /// Creates a unique idol carrying only unique modifiers.
    pub fn unique(
        id: IdolId,
        type_id: impl Into<String>,
        name: impl Into<String>,
        unique_modifiers: Vec<Modifier>,
    ) -> Result<Self, ValidationError> {
        let idol = Self {
            id,
            type_id: type_id.into(),
            name: name.into(),
            is_placed: false,
            is_unique: true,
            prefixes: Vec::new(),
            suffixes: Vec::new(),
            unique_modifiers,
        };
        idol.validate()?;
        Ok(idol)
    }

    /// Checks the idol invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty(&self.type_id, "Type id").map_err(ValidationError::InvalidIdol)?;

        if self.is_unique {
            if !self.prefixes.is_empty() || !self.suffixes.is_empty() {
                return Err(ValidationError::InvalidIdol(format!(
                    "unique idol {} must not carry prefixes or suffixes",
                    self.id
                )));
            }
            if self.unique_modifiers.is_empty() {
                return Err(ValidationError::InvalidIdol(format!(
                    "unique idol {} needs at least one unique modifier",
                    self.id
                )));
            }
            return self.require_slot_class(&self.unique_modifiers, ModifierClass::Unique);
        }

        if !self.unique_modifiers.is_empty() {
            return Err(ValidationError::InvalidIdol(format!(
                "idol {} is not unique but carries unique modifiers",
                self.id
            )));
        }
        if self.prefixes.len() > MAX_PREFIXES {
            return Err(ValidationError::InvalidIdol(format!(
                "idol {} has {} prefixes, at most {} allowed",
                self.id,
                self.prefixes.len(),
                MAX_PREFIXES
            )));
        }
        if self.suffixes.len() > MAX_SUFFIXES {
            return Err(ValidationError::InvalidIdol(format!(
                "idol {} has {} suffixes, at most {} allowed",
                self.id,
                self.suffixes.len(),
                MAX_SUFFIXES
            )));
        }
        if self.prefixes.is_empty() && self.suffixes.is_empty() {
            return Err(ValidationError::InvalidIdol(format!(
                "idol {} needs at least one modifier",
                self.id
            )));
        }
        self.require_slot_class(&self.prefixes, ModifierClass::Prefix)?;
        self.require_slot_class(&self.suffixes, ModifierClass::Suffix)
    }

    fn require_slot_class(
        &self,
        slot: &[Modifier],
        class: ModifierClass,
    ) -> Result<(), ValidationError> {
        match slot.iter().find(|m| m.class != class) {
            Some(misplaced) => Err(ValidationError::InvalidIdol(format!(
                "idol {}: modifier '{}' is a {:?} line in the {:?} slot",
                self.id, misplaced.id, misplaced.class, class
            ))),
            None => Ok(()),
        }
    }

    /// Number of modifier lines the idol carries.
    pub fn modifier_count(&self) -> usize {
        self.prefixes.len() + self.suffixes.len() + self.unique_modifiers.len()
    }

    /// All modifier lines in display order: prefixes, suffixes, unique modifiers.
    pub fn modifiers(&self) -> impl Iterator<Item = &Modifier> {
        self.prefixes
            .iter()
            .chain(self.suffixes.iter())
            .chain(self.unique_modifiers.iter())
    }

    /// Returns a copy with the placement cache set.
    pub fn with_placed(&self, is_placed: bool) -> Self {
        Self {
            is_placed,
            ..self.clone()
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn modifier(id: &str, name: &str, text: &str, class: ModifierClass) -> Modifier {
        Modifier::new(
            id,
            name,
            text,
            class,
            ["minor", "kamasan", "totemic", "noble", "conqueror", "burial"],
        )
        .unwrap()
    }

    pub fn idol(id: IdolId, type_id: &str) -> Idol {
        Idol::new(
            id,
            type_id,
            format!("Idol {id}"),
            vec![modifier(
                "pack_size",
                "Teeming",
                "3% increased Pack size in your Maps",
                ModifierClass::Prefix,
            )],
            Vec::new(),
        )
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn footprint_rejects_zero_dimension() {
        assert!(matches!(
            Footprint::new("minor", "Minor Idol", 1, 0),
            Err(ValidationError::InvalidFootprint(_))
        ));
        assert!(Footprint::new("", "Nameless", 1, 1).is_err());
        assert_eq!(Footprint::new("burial", "Burial Idol", 3, 1).unwrap().area(), 3);
    }

    #[test]
    fn modifier_dedups_supported_types() {
        let m = Modifier::new(
            "m1",
            "Teeming",
            "3% increased Pack size",
            ModifierClass::Prefix,
            ["minor", "minor", "noble"],
        )
        .unwrap();
        assert_eq!(m.supported_type_ids, vec!["minor", "noble"]);
        assert!(m.supports("noble"));
        assert!(!m.supports("burial"));
    }

    #[test]
    fn idol_enforces_affix_caps() {
        let p = modifier("p", "Teeming", "3% increased Pack size", ModifierClass::Prefix);
        let too_many = Idol::new(1, "minor", "Greedy", vec![p.clone(), p.clone(), p], vec![]);
        assert!(matches!(too_many, Err(ValidationError::InvalidIdol(_))));

        let empty = Idol::new(2, "minor", "Empty", vec![], vec![]);
        assert!(empty.is_err());
    }

    #[test]
    fn idol_rejects_modifiers_in_the_wrong_slot() {
        let p = modifier("p", "Teeming", "3% increased Pack size", ModifierClass::Prefix);
        let s = modifier("s", "of Rarity", "5% increased Rarity", ModifierClass::Suffix);
        let u = modifier("u", "Unique", "Your Maps are haunted", ModifierClass::Unique);

        assert!(Idol::new(1, "minor", "Fine", vec![p.clone()], vec![s.clone()]).is_ok());
        assert!(matches!(
            Idol::new(2, "minor", "Swapped", vec![s.clone()], vec![p.clone()]),
            Err(ValidationError::InvalidIdol(_))
        ));
        assert!(Idol::new(3, "minor", "Odd", vec![p.clone()], vec![u.clone()]).is_err());
        assert!(Idol::unique(4, "conqueror", "Relic", vec![p]).is_err());
        assert!(Idol::unique(5, "conqueror", "Relic", vec![u]).is_ok());
    }

    #[test]
    fn unique_idol_rules() {
        let u = modifier("u", "Unique", "Your Maps are haunted", ModifierClass::Unique);
        let ok = Idol::unique(3, "conqueror", "Relic", vec![u.clone()]).unwrap();
        assert!(ok.is_unique);
        assert_eq!(ok.modifier_count(), 1);

        assert!(Idol::unique(4, "conqueror", "Hollow", vec![]).is_err());

        let mut broken = ok.clone();
        broken
            .prefixes
            .push(modifier("p", "Teeming", "3% increased Pack size", ModifierClass::Prefix));
        assert!(broken.validate().is_err());
    }

    #[test]
    fn modifiers_iterate_in_display_order() {
        let idol = Idol::new(
            5,
            "noble",
            "Mixed",
            vec![modifier("p", "Teeming", "3% increased Pack size", ModifierClass::Prefix)],
            vec![modifier("s", "of Rarity", "5% increased Rarity", ModifierClass::Suffix)],
        )
        .unwrap();
        let ids: Vec<&str> = idol.modifiers().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["p", "s"]);
        assert!(idol.with_placed(true).is_placed);
    }
}
