//! Static catalogs: idol footprints and the modifier database.
//!
//! The modifier database is produced by an external data collaborator as JSON.
//! This module only reads it; the core never fetches anything itself.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::model::{Footprint, Modifier, ModifierClass, ValidationError};
use crate::types::Spanning;

/// Idol types that share one modifier pool and only differ in orientation.
pub const TWIN_TYPES: [(&str, &str); 2] = [("kamasan", "noble"), ("totemic", "burial")];

/// Modifier names whose distinct lines are alternative tiers of one effect.
/// Every catalog excludes these; a database can list more.
pub const DEFAULT_EXCLUSIVE_FAMILIES: [&str; 1] = ["Contribution"];

/// Lookup table from idol type id to footprint.
#[derive(Clone, Debug, PartialEq)]
pub struct FootprintCatalog {
    footprints: Vec<Footprint>,
}

impl FootprintCatalog {
    /// Creates a catalog, rejecting invalid entries and duplicate type ids.
    pub fn new(footprints: Vec<Footprint>) -> Result<Self, ValidationError> {
        for (idx, footprint) in footprints.iter().enumerate() {
            footprint.validate()?;
            if footprints[..idx]
                .iter()
                .any(|other| other.type_id == footprint.type_id)
            {
                return Err(ValidationError::InvalidCatalog(format!(
                    "duplicate footprint for type '{}'",
                    footprint.type_id
                )));
            }
        }
        Ok(Self { footprints })
    }

    /// The six idol types of the board.
    pub fn standard() -> Self {
        let entry = |type_id: &str, name: &str, width, height| Footprint {
            type_id: type_id.to_string(),
            name: name.to_string(),
            width,
            height,
        };
        Self {
            footprints: vec![
                entry("minor", "Minor Idol", 1, 1),
                entry("kamasan", "Kamasan Idol", 1, 2),
                entry("totemic", "Totemic Idol", 1, 3),
                entry("noble", "Noble Idol", 2, 1),
                entry("conqueror", "Conqueror Idol", 2, 2),
                entry("burial", "Burial Idol", 3, 1),
            ],
        }
    }

    /// Looks up the footprint of a type.
    pub fn get(&self, type_id: &str) -> Option<&Footprint> {
        self.footprints.iter().find(|f| f.type_id == type_id)
    }

    /// Footprint area of a type, if known.
    pub fn area_of(&self, type_id: &str) -> Option<usize> {
        self.get(type_id).map(Spanning::area)
    }

    /// All footprints in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Footprint> {
        self.footprints.iter()
    }
}

impl Default for FootprintCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Checks whether two types form a twin pair.
pub fn are_twins(a: &str, b: &str) -> bool {
    TWIN_TYPES
        .iter()
        .any(|&(x, y)| (x == a && y == b) || (x == b && y == a))
}

/// Built-in families first, then the extra names not already listed.
fn with_default_families(extra: Vec<String>) -> Vec<String> {
    let mut families: Vec<String> = DEFAULT_EXCLUSIVE_FAMILIES
        .iter()
        .map(|name| name.to_string())
        .collect();
    for name in extra {
        if !families.contains(&name) {
            families.push(name);
        }
    }
    families
}

/// A modifier entry as it appears in the raw JSON database.
#[derive(Clone, Debug, Deserialize)]
pub struct RawModifier {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub text: String,
}

/// The raw JSON database shape.
///
/// `prefixes` and `suffixes` map an idol type id to the modifiers that can
/// roll on that type. The same modifier listed under several types is merged
/// into one catalog entry supporting all of them.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawCatalog {
    #[serde(default)]
    pub footprints: Option<Vec<Footprint>>,
    #[serde(default)]
    pub prefixes: BTreeMap<String, Vec<RawModifier>>,
    #[serde(default)]
    pub suffixes: BTreeMap<String, Vec<RawModifier>>,
    #[serde(default)]
    pub exclusive_families: Vec<String>,
}

/// Error while loading the catalog file.
#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(ValidationError),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io(err) => write!(f, "Could not read catalog: {}", err),
            CatalogError::Parse(err) => write!(f, "Could not parse catalog: {}", err),
            CatalogError::Invalid(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io(err) => Some(err),
            CatalogError::Parse(err) => Some(err),
            CatalogError::Invalid(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Io(err)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Parse(err)
    }
}

impl From<ValidationError> for CatalogError {
    fn from(err: ValidationError) -> Self {
        CatalogError::Invalid(err)
    }
}

/// Footprints plus every modifier that can roll, indexed by id.
#[derive(Clone, Debug, PartialEq)]
pub struct Catalog {
    pub footprints: FootprintCatalog,
    modifiers: BTreeMap<String, Modifier>,
    /// Modifier names whose textually distinct lines exclude each other on one idol.
    pub exclusive_families: Vec<String>,
}

impl Catalog {
    /// Standard footprints, no modifiers.
    pub fn empty() -> Self {
        Self {
            footprints: FootprintCatalog::standard(),
            modifiers: BTreeMap::new(),
            exclusive_families: with_default_families(Vec::new()),
        }
    }

    /// Builds a catalog from already constructed modifiers.
    pub fn new(
        footprints: FootprintCatalog,
        modifiers: impl IntoIterator<Item = Modifier>,
        exclusive_families: Vec<String>,
    ) -> Result<Self, ValidationError> {
        let mut catalog = Self {
            footprints,
            modifiers: BTreeMap::new(),
            exclusive_families: with_default_families(exclusive_families),
        };
        for modifier in modifiers {
            catalog.insert(modifier)?;
        }
        Ok(catalog)
    }

    /// Builds a catalog from the raw database shape.
    pub fn from_raw(raw: RawCatalog) -> Result<Self, ValidationError> {
        let footprints = match raw.footprints {
            Some(list) => FootprintCatalog::new(list)?,
            None => FootprintCatalog::standard(),
        };
        let mut catalog = Self {
            footprints,
            modifiers: BTreeMap::new(),
            exclusive_families: with_default_families(raw.exclusive_families),
        };

        for (class, pool) in [
            (ModifierClass::Prefix, raw.prefixes),
            (ModifierClass::Suffix, raw.suffixes),
        ] {
            for (type_id, entries) in pool {
                if catalog.footprints.get(&type_id).is_none() {
                    return Err(ValidationError::InvalidCatalog(format!(
                        "modifier pool for unknown type '{}'",
                        type_id
                    )));
                }
                for entry in entries {
                    let id = entry.id.unwrap_or_else(|| entry.text.clone());
                    let modifier =
                        Modifier::new(id, entry.name, entry.text, class, [type_id.as_str()])?;
                    catalog.insert(modifier)?;
                }
            }
        }

        Ok(catalog)
    }

    /// Parses the JSON database.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        Ok(Self::from_raw(raw)?)
    }

    /// Reads and parses the JSON database from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    fn insert(&mut self, modifier: Modifier) -> Result<(), ValidationError> {
        match self.modifiers.get_mut(&modifier.id) {
            Some(existing) => {
                if existing.class != modifier.class || existing.text != modifier.text {
                    return Err(ValidationError::InvalidCatalog(format!(
                        "modifier id '{}' is used for different lines",
                        modifier.id
                    )));
                }
                for type_id in modifier.supported_type_ids {
                    existing.add_supported_type(type_id);
                }
            }
            None => {
                self.modifiers.insert(modifier.id.clone(), modifier);
            }
        }
        Ok(())
    }

    /// Looks up a modifier by id.
    pub fn modifier(&self, id: &str) -> Option<&Modifier> {
        self.modifiers.get(id)
    }

    /// All modifiers ordered by id.
    pub fn modifiers(&self) -> impl Iterator<Item = &Modifier> {
        self.modifiers.values()
    }

    /// Modifiers of one class that can roll on the type.
    pub fn pool(&self, type_id: &str, class: ModifierClass) -> Vec<&Modifier> {
        self.modifiers
            .values()
            .filter(|m| m.class == class && m.supports(type_id))
            .collect()
    }

    pub fn modifier_count(&self) -> usize {
        self.modifiers.len()
    }

    /// Checks if two modifiers may not share one idol.
    ///
    /// The same modifier never appears twice. Distinct lines sharing a name
    /// listed in `exclusive_families` (always including
    /// [`DEFAULT_EXCLUSIVE_FAMILIES`]) are alternative tiers of one effect.
    pub fn excludes(&self, a: &Modifier, b: &Modifier) -> bool {
        if a.id == b.id {
            return true;
        }
        a.name == b.name
            && a.text != b.text
            && self.exclusive_families.iter().any(|family| *family == a.name)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "prefixes": {
            "minor": [
                {"id": "pack_size", "name": "Teeming", "text": "3% increased Pack size in your Maps"}
            ],
            "noble": [
                {"id": "pack_size", "name": "Teeming", "text": "3% increased Pack size in your Maps"},
                {"name": "Shrine", "text": "Your Maps contain an additional Shrine"}
            ]
        },
        "suffixes": {
            "noble": [
                {"id": "rarity", "name": "of Rarity", "text": "10% increased Rarity of Items found in your Maps"}
            ]
        },
        "exclusive_families": ["Teeming"]
    }"#;

    #[test]
    fn standard_footprints() {
        let catalog = FootprintCatalog::standard();
        assert_eq!(catalog.iter().count(), 6);
        let conqueror = catalog.get("conqueror").unwrap();
        assert_eq!((conqueror.width, conqueror.height), (2, 2));
        assert_eq!(catalog.area_of("totemic"), Some(3));
        assert!(catalog.get("unknown").is_none());
    }

    #[test]
    fn duplicate_footprints_rejected() {
        let dup = vec![
            Footprint::new("minor", "Minor Idol", 1, 1).unwrap(),
            Footprint::new("minor", "Other", 1, 1).unwrap(),
        ];
        assert!(FootprintCatalog::new(dup).is_err());
    }

    #[test]
    fn twins_are_symmetric() {
        assert!(are_twins("noble", "kamasan"));
        assert!(are_twins("totemic", "burial"));
        assert!(!are_twins("minor", "conqueror"));
    }

    #[test]
    fn raw_catalog_merges_supported_types() {
        let catalog = Catalog::from_json_str(SAMPLE).unwrap();
        assert_eq!(catalog.modifier_count(), 3);

        let pack = catalog.modifier("pack_size").unwrap();
        assert_eq!(pack.class, ModifierClass::Prefix);
        assert_eq!(pack.supported_type_ids, vec!["minor", "noble"]);

        let shrine = catalog
            .modifier("Your Maps contain an additional Shrine")
            .expect("id falls back to text");
        assert!(shrine.supports("noble"));
        assert!(!shrine.supports("minor"));

        assert_eq!(catalog.pool("noble", ModifierClass::Suffix).len(), 1);
        assert_eq!(catalog.pool("minor", ModifierClass::Suffix).len(), 0);
    }

    #[test]
    fn unknown_type_pool_is_rejected() {
        let json = r#"{"prefixes": {"giant": [{"name": "X", "text": "1% more X"}]}}"#;
        assert!(matches!(
            Catalog::from_json_str(json),
            Err(CatalogError::Invalid(ValidationError::InvalidCatalog(_)))
        ));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(
            Catalog::from_json_str("{not json"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(catalog.modifier_count(), 3);

        let missing = Catalog::load(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(CatalogError::Io(_))));
    }

    #[test]
    fn exclusion_rules() {
        let tier_one = Modifier::new(
            "contrib_1",
            "Contribution",
            "Your Maps have 5% increased Contribution",
            ModifierClass::Prefix,
            ["minor"],
        )
        .unwrap();
        let tier_two = Modifier::new(
            "contrib_2",
            "Contribution",
            "Your Maps have 8% increased Contribution of Rare Monsters",
            ModifierClass::Prefix,
            ["minor"],
        )
        .unwrap();
        let other = Modifier::new(
            "rarity",
            "of Rarity",
            "10% increased Rarity",
            ModifierClass::Suffix,
            ["minor"],
        )
        .unwrap();

        let catalog = Catalog::new(
            FootprintCatalog::standard(),
            vec![tier_one.clone(), tier_two.clone(), other.clone()],
            vec!["Contribution".to_string()],
        )
        .unwrap();

        assert!(catalog.excludes(&tier_one, &tier_two));
        assert!(catalog.excludes(&tier_one, &tier_one));
        assert!(!catalog.excludes(&tier_one, &other));

        let pack = |id: &str, text: &str| {
            Modifier::new(id, "Teeming", text, ModifierClass::Prefix, ["minor"]).unwrap()
        };
        let (pack_low, pack_high) = (
            pack("pack_1", "3% increased Pack size"),
            pack("pack_2", "5% increased Pack size"),
        );
        assert!(!catalog.excludes(&pack_low, &pack_high));
    }

    #[test]
    fn built_in_families_apply_without_database_list() {
        let tier_one = Modifier::new(
            "contrib_1",
            "Contribution",
            "Your Maps have 5% increased Contribution",
            ModifierClass::Prefix,
            ["minor"],
        )
        .unwrap();
        let tier_two = Modifier::new(
            "contrib_2",
            "Contribution",
            "Your Maps have 8% increased Contribution of Rare Monsters",
            ModifierClass::Prefix,
            ["minor"],
        )
        .unwrap();

        let json = r#"{"prefixes": {"minor": [
            {"id": "contrib_1", "name": "Contribution", "text": "Your Maps have 5% increased Contribution"},
            {"id": "contrib_2", "name": "Contribution", "text": "Your Maps have 8% increased Contribution of Rare Monsters"}
        ]}}"#;
        for catalog in [
            Catalog::empty(),
            Catalog::new(FootprintCatalog::standard(), Vec::new(), Vec::new()).unwrap(),
            Catalog::from_json_str(json).unwrap(),
        ] {
            assert_eq!(catalog.exclusive_families, vec!["Contribution".to_string()]);
            assert!(catalog.excludes(&tier_one, &tier_two));
        }

        let merged = Catalog::from_json_str(SAMPLE).unwrap();
        assert_eq!(
            merged.exclusive_families,
            vec!["Contribution".to_string(), "Teeming".to_string()]
        );
    }
}
