//! Builds new idols that together carry a requested set of modifiers.
//!
//! Generation never touches the board. Its output is meant to be handed to the
//! packing optimizer by the caller.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::catalog::{Catalog, are_twins};
use crate::model::{
    Footprint, Idol, IdolId, MAX_PREFIXES, MAX_SUFFIXES, Modifier, ModifierClass, ValidationError,
};
use crate::types::Spanning;

/// Most copies of one modifier a single request can ask for: four modifiers
/// on each of the 32 usable cells.
pub const MAX_REQUESTED_COUNT: usize = 128;

fn default_first_id() -> IdolId {
    1
}

/// One requested modifier and how many times it should appear overall.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DesiredModifier {
    pub modifier_id: String,
    pub count: usize,
}

/// Request for [`generate`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "desired": [
        {"modifier_id": "pack_size", "count": 3},
        {"modifier_id": "rarity_1", "count": 1}
    ],
    "first_id": 100
}))]
pub struct GenerationRequest {
    pub desired: Vec<DesiredModifier>,
    /// Id given to the first generated idol; later idols count up from it.
    #[serde(default = "default_first_id")]
    pub first_id: IdolId,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl GenerationRequest {
    pub fn new(desired: Vec<DesiredModifier>) -> Self {
        Self {
            desired,
            first_id: default_first_id(),
        }
    }
}

/// Requested versus achieved count of one modifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct Fulfillment {
    pub modifier_id: String,
    pub requested: usize,
    pub achieved: usize,
}

impl Fulfillment {
    pub fn is_met(&self) -> bool {
        self.achieved >= self.requested
    }
}

/// Generated idols plus a per-modifier report. Partial results are normal.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct GenerationOutcome {
    pub idols: Vec<Idol>,
    pub fulfillment: Vec<Fulfillment>,
    pub is_complete: bool,
}

struct Wanted<'a> {
    modifier: &'a Modifier,
    remaining: usize,
}

/// Modifiers one new idol of `footprint` would take from the wanted list.
struct Draft<'a> {
    footprint: &'a Footprint,
    order: usize,
    picks: Vec<usize>,
}

impl Draft<'_> {
    fn area(&self) -> usize {
        self.footprint.area()
    }
}

/// Greedy selection for one idol of the given type.
///
/// Modifiers still needed most often go first. Caps, supported types and
/// exclusions are checked against everything picked so far.
fn draft<'a>(
    catalog: &Catalog,
    wanted: &[Wanted<'_>],
    footprint: &'a Footprint,
    order: usize,
) -> Draft<'a> {
    let mut candidates: Vec<usize> = (0..wanted.len())
        .filter(|&idx| wanted[idx].remaining > 0)
        .collect();
    candidates.sort_by(|&a, &b| wanted[b].remaining.cmp(&wanted[a].remaining));

    let mut picks: Vec<usize> = Vec::new();
    let (mut prefixes, mut suffixes) = (0, 0);

    for idx in candidates {
        let modifier = wanted[idx].modifier;
        if !modifier.supports(&footprint.type_id) {
            continue;
        }
        let slot = match modifier.class {
            ModifierClass::Prefix if prefixes < MAX_PREFIXES => &mut prefixes,
            ModifierClass::Suffix if suffixes < MAX_SUFFIXES => &mut suffixes,
            _ => continue,
        };
        if picks
            .iter()
            .any(|&picked| catalog.excludes(wanted[picked].modifier, modifier))
        {
            continue;
        }
        *slot += 1;
        picks.push(idx);
    }

    Draft {
        footprint,
        order,
        picks,
    }
}

/// Ranking for several distinct wanted modifiers: coverage, then area, then
/// twin balance, then catalog order.
fn compare_drafts(a: &Draft<'_>, b: &Draft<'_>, usage: &HashMap<String, usize>) -> Ordering {
    b.picks
        .len()
        .cmp(&a.picks.len())
        .then_with(|| a.area().cmp(&b.area()))
        .then_with(|| {
            if are_twins(&a.footprint.type_id, &b.footprint.type_id) {
                let used = |d: &Draft<'_>| usage.get(&d.footprint.type_id).copied().unwrap_or(0);
                used(a).cmp(&used(b))
            } else {
                Ordering::Equal
            }
        })
        .then_with(|| a.order.cmp(&b.order))
}

/// `[prefix] [type] [suffix]`, then `of <name>` for the second of each.
fn idol_name(footprint: &Footprint, prefixes: &[Modifier], suffixes: &[Modifier]) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(first) = prefixes.first() {
        parts.push(&first.name);
    }
    parts.push(&footprint.name);
    if let Some(first) = suffixes.first() {
        parts.push(&first.name);
    }

    let mut name = parts.join(" ");
    for extra in prefixes.iter().skip(1).chain(suffixes.iter().skip(1)) {
        name.push_str(" of ");
        name.push_str(&extra.name);
    }
    name
}

/// Synthesizes idols carrying the requested modifiers.
///
/// Stops once every request is met or no further idol can take any of the
/// remaining modifiers. Unknown modifier ids and unique modifiers are reported
/// with an achieved count of zero.
///
/// # Errors
/// Returns an error only if a built idol violates the idol invariants.
pub fn generate(
    request: &GenerationRequest,
    catalog: &Catalog,
) -> Result<GenerationOutcome, ValidationError> {
    // Merge repeated ids, keeping first-seen order.
    let mut requested: Vec<(String, usize)> = Vec::new();
    for desired in &request.desired {
        match requested.iter_mut().find(|(id, _)| *id == desired.modifier_id) {
            Some((_, count)) => *count = count.saturating_add(desired.count),
            None => requested.push((desired.modifier_id.clone(), desired.count)),
        }
    }

    let mut wanted: Vec<Wanted<'_>> = requested
        .iter()
        .filter_map(|(id, count)| {
            let modifier = catalog.modifier(id)?;
            (modifier.class != ModifierClass::Unique && *count > 0).then_some(Wanted {
                modifier,
                remaining: (*count).min(MAX_REQUESTED_COUNT),
            })
        })
        .collect();

    let mut usage: HashMap<String, usize> = HashMap::new();
    let mut idols: Vec<Idol> = Vec::new();
    let mut next_id = Some(request.first_id);

    while let Some(id) = next_id {
        let distinct = wanted.iter().filter(|w| w.remaining > 0).count();
        if distinct == 0 {
            break;
        }

        let drafts: Vec<Draft<'_>> = catalog
            .footprints
            .iter()
            .enumerate()
            .map(|(order, footprint)| draft(catalog, &wanted, footprint, order))
            .filter(|d| !d.picks.is_empty())
            .collect();

        let chosen = if distinct == 1 {
            drafts
                .into_iter()
                .min_by(|a, b| a.area().cmp(&b.area()).then_with(|| a.order.cmp(&b.order)))
        } else {
            drafts
                .into_iter()
                .min_by(|a, b| compare_drafts(a, b, &usage))
        };
        let Some(chosen) = chosen else {
            break;
        };

        let mut prefixes = Vec::new();
        let mut suffixes = Vec::new();
        for &idx in &chosen.picks {
            let modifier = wanted[idx].modifier;
            wanted[idx].remaining -= 1;
            match modifier.class {
                ModifierClass::Prefix => prefixes.push(modifier.clone()),
                _ => suffixes.push(modifier.clone()),
            }
        }

        let footprint = chosen.footprint;
        let name = idol_name(footprint, &prefixes, &suffixes);
        idols.push(Idol::new(
            id,
            footprint.type_id.clone(),
            name,
            prefixes,
            suffixes,
        )?);
        *usage.entry(footprint.type_id.clone()).or_insert(0) += footprint.area();
        next_id = id.checked_add(1);
    }

    let fulfillment: Vec<Fulfillment> = requested
        .iter()
        .map(|(id, count)| {
            let achieved = idols
                .iter()
                .filter(|idol| idol.modifiers().any(|m| m.id == *id))
                .count();
            Fulfillment {
                modifier_id: id.clone(),
                requested: *count,
                achieved,
            }
        })
        .collect();
    let is_complete = fulfillment.iter().all(Fulfillment::is_met);

    Ok(GenerationOutcome {
        idols,
        fulfillment,
        is_complete,
    })
}
