//! Modifier aggregation over everything placed on the board.
//!
//! Modifier lines are grouped into families by replacing their numbers with a
//! placeholder. Families whose lines carry a recognized numeric role are
//! merged into one line with the summed value; everything else is counted.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::grid::Grid;
use crate::model::ModifierClass;

/// Display name used for every unique modifier line.
pub const UNIQUE_FAMILY: &str = "Unique";

/// Numeric role of a modifier line, in matching priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchPattern {
    /// `+<n>% chance`
    PlusChance,
    /// `have <n>% [increased] chance`
    HaveChance,
    /// `<n>% increased`
    Increased,
    /// `<n>% more`
    More,
    /// `<n>% reduced`
    Reduced,
    /// `<n>% faster`
    Faster,
    /// `<n>% slower`
    Slower,
    /// `additional`, counting the first bare integer or 1
    Additional,
    /// Any number
    Generic,
}

impl MatchPattern {
    /// All patterns in the order they are tried.
    pub const PRIORITY: [MatchPattern; 9] = [
        MatchPattern::PlusChance,
        MatchPattern::HaveChance,
        MatchPattern::Increased,
        MatchPattern::More,
        MatchPattern::Reduced,
        MatchPattern::Faster,
        MatchPattern::Slower,
        MatchPattern::Additional,
        MatchPattern::Generic,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            MatchPattern::PlusChance => "plus_chance",
            MatchPattern::HaveChance => "have_chance",
            MatchPattern::Increased => "increased",
            MatchPattern::More => "more",
            MatchPattern::Reduced => "reduced",
            MatchPattern::Faster => "faster",
            MatchPattern::Slower => "slower",
            MatchPattern::Additional => "additional",
            MatchPattern::Generic => "generic",
        }
    }

    fn source(&self) -> &'static str {
        match self {
            MatchPattern::PlusChance => r"(?i)\+(\d+(?:\.\d+)?)% chance",
            MatchPattern::HaveChance => r"(?i)have (\d+(?:\.\d+)?)% (?:increased )?chance",
            MatchPattern::Increased => r"(?i)(\d+(?:\.\d+)?)% increased",
            MatchPattern::More => r"(?i)(\d+(?:\.\d+)?)% more",
            MatchPattern::Reduced => r"(?i)(\d+(?:\.\d+)?)% reduced",
            MatchPattern::Faster => r"(?i)(\d+(?:\.\d+)?)% faster",
            MatchPattern::Slower => r"(?i)(\d+(?:\.\d+)?)% slower",
            MatchPattern::Additional => r"(?i)\badditional\b",
            MatchPattern::Generic => r"(\d+(?:\.\d+)?)",
        }
    }
}

/// Numeric reading of one modifier line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatternMatch {
    pub pattern: MatchPattern,
    pub value: f64,
    /// `false` when the value is implied (an `additional` line without a number).
    pub explicit: bool,
}

fn compile(source: &str) -> Regex {
    Regex::new(source).expect("modifier patterns are valid regular expressions")
}

fn pattern_table() -> &'static [(MatchPattern, Regex)] {
    static TABLE: OnceLock<Vec<(MatchPattern, Regex)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        MatchPattern::PRIORITY
            .iter()
            .map(|pattern| (*pattern, compile(pattern.source())))
            .collect()
    })
}

/// Number followed by `%`, whitespace or end of text.
fn number_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(r"\d+(?:\.\d+)?(%|\s|$)"))
}

fn first_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(r"\d+(?:\.\d+)?"))
}

fn bare_integer() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(r"\b(\d+)\b"))
}

fn additional_article() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(r"(?i)\b(?:an|a)\s+additional\b"))
}

/// Family key of a modifier line: numbers replaced by `#`, whitespace collapsed.
///
/// # Examples
/// ```
/// use idol_planner::aggregator::base_effect_key;
///
/// assert_eq!(
///     base_effect_key("30% increased pack size"),
///     base_effect_key("45% increased pack size")
/// );
/// assert_ne!(
///     base_effect_key("30% increased pack size"),
///     base_effect_key("30% increased rarity")
/// );
/// ```
pub fn base_effect_key(text: &str) -> String {
    let replaced = number_token().replace_all(text, "#${1}");
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Classifies the numeric role of a modifier line. First match wins.
///
/// # Returns
/// `None` for lines without a stackable value.
pub fn match_pattern(text: &str) -> Option<PatternMatch> {
    for (pattern, regex) in pattern_table() {
        if *pattern == MatchPattern::Additional {
            if !regex.is_match(text) {
                continue;
            }
            let explicit = bare_integer()
                .captures(text)
                .and_then(|caps| caps[1].parse::<f64>().ok());
            return Some(PatternMatch {
                pattern: *pattern,
                value: explicit.unwrap_or(1.0),
                explicit: explicit.is_some(),
            });
        }

        if let Some(value) = regex
            .captures(text)
            .and_then(|caps| caps[1].parse::<f64>().ok())
        {
            return Some(PatternMatch {
                pattern: *pattern,
                value,
                explicit: true,
            });
        }
    }
    None
}

/// One aggregated line of the board summary.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({
    "family_key": "#% increased Rarity of Items found",
    "name": "of Rarity",
    "kind": "suffix",
    "text": "20% increased Rarity of Items found",
    "occurrence_count": 2,
    "summed_value": 20.0,
    "pattern": "increased"
}))]
pub struct StackedModifier {
    pub family_key: String,
    pub name: String,
    pub kind: ModifierClass,
    /// First occurrence's text, with the summed value substituted when stacked.
    pub text: String,
    pub occurrence_count: usize,
    /// Sum over all occurrences, rounded to one decimal; `None` when unstackable.
    pub summed_value: Option<f64>,
    pub pattern: Option<MatchPattern>,
}

struct Family {
    name: String,
    kind: ModifierClass,
    family_key: String,
    texts: Vec<String>,
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

impl Family {
    fn stack(self) -> StackedModifier {
        let count = self.texts.len();
        let first = &self.texts[0];

        let reading = if self.kind == ModifierClass::Unique {
            None
        } else {
            match_pattern(first)
        };

        let Some(reading) = reading else {
            return StackedModifier {
                family_key: self.family_key,
                name: self.name,
                kind: self.kind,
                text: first.clone(),
                occurrence_count: count,
                summed_value: None,
                pattern: None,
            };
        };

        let summed: f64 = self
            .texts
            .iter()
            .filter_map(|text| match_pattern(text))
            .map(|m| m.value)
            .sum();
        let summed = round_one_decimal(summed);

        let text = if count < 2 {
            first.clone()
        } else if reading.pattern == MatchPattern::Additional && !reading.explicit {
            additional_article()
                .replace(first, format!("{} additional", count).as_str())
                .into_owned()
        } else {
            first_number()
                .replace(first, format_value(summed).as_str())
                .into_owned()
        };

        StackedModifier {
            family_key: self.family_key,
            name: self.name,
            kind: self.kind,
            text,
            occurrence_count: count,
            summed_value: Some(summed),
            pattern: Some(reading.pattern),
        }
    }
}

fn kind_rank(kind: ModifierClass) -> u8 {
    match kind {
        ModifierClass::Prefix => 0,
        ModifierClass::Suffix => 1,
        ModifierClass::Unique => 2,
    }
}

/// Summarizes the modifiers of every idol on the board.
///
/// Each idol is visited once, keyed by its anchor. Output is sorted by name,
/// then prefix before suffix before unique; ties keep first-seen order.
pub fn aggregate(grid: &Grid) -> Vec<StackedModifier> {
    let mut families: Vec<Family> = Vec::new();
    let mut index: HashMap<(ModifierClass, String, String), usize> = HashMap::new();

    let mut push = |kind: ModifierClass, name: &str, text: &str| {
        let (name, family_key) = if kind == ModifierClass::Unique {
            (UNIQUE_FAMILY.to_string(), text.to_string())
        } else {
            (name.to_string(), base_effect_key(text))
        };
        // Prefix and suffix lines of the same family stack together.
        let slot = if kind == ModifierClass::Unique {
            ModifierClass::Unique
        } else {
            ModifierClass::Prefix
        };
        let key = (slot, name.clone(), family_key.clone());
        match index.get(&key) {
            Some(&idx) => families[idx].texts.push(text.to_string()),
            None => {
                index.insert(key, families.len());
                families.push(Family {
                    name,
                    kind,
                    family_key,
                    texts: vec![text.to_string()],
                });
            }
        }
    };

    for (_, idol) in grid.placed_idols() {
        if idol.is_unique {
            for modifier in &idol.unique_modifiers {
                push(ModifierClass::Unique, &modifier.name, &modifier.text);
            }
        } else {
            for modifier in idol.prefixes.iter().chain(idol.suffixes.iter()) {
                push(modifier.class, &modifier.name, &modifier.text);
            }
        }
    }

    let mut stacked: Vec<StackedModifier> = families.into_iter().map(Family::stack).collect();
    stacked.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| kind_rank(a.kind).cmp(&kind_rank(b.kind)))
    });
    stacked
}

/// Plain-text export of an aggregation, one line per entry.
pub fn render_summary(stacked: &[StackedModifier]) -> String {
    stacked
        .iter()
        .map(|entry| {
            if entry.occurrence_count > 1 {
                format!("{} (x{})", entry.text, entry.occurrence_count)
            } else {
                entry.text.clone()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
