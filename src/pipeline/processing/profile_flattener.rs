//! Collapses multi-row scraped profiles into one fixed-width row per profile.
//!
//! Every category gets exactly `capacity` slots. Slot `i` holds the i-th
//! fragment row of that category in input order; rows past the capacity are
//! dropped and empty slots stay `None`. Column names are unsuffixed for slot 1
//! and suffixed `_2`, `_3`, ... for the following slots.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::domain::{FragmentCategory, FragmentFields, RawProfileFragment};

const CATEGORIES: [FragmentCategory; 3] = [
    FragmentCategory::Experience,
    FragmentCategory::Education,
    FragmentCategory::FundingEvent,
];

/// Fixed-width representation of one scraped profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlattenedProfile {
    pub profile_id: String,
    pub experience: Vec<Option<FragmentFields>>,
    pub education: Vec<Option<FragmentFields>>,
    pub funding_events: Vec<Option<FragmentFields>>,
}

impl FlattenedProfile {
    fn empty(profile_id: &str, capacity: usize) -> Self {
        Self {
            profile_id: profile_id.to_string(),
            experience: vec![None; capacity],
            education: vec![None; capacity],
            funding_events: vec![None; capacity],
        }
    }

    pub fn slots(&self, category: FragmentCategory) -> &[Option<FragmentFields>] {
        match category {
            FragmentCategory::Experience => &self.experience,
            FragmentCategory::Education => &self.education,
            FragmentCategory::FundingEvent => &self.funding_events,
        }
    }

    fn slots_mut(&mut self, category: FragmentCategory) -> &mut Vec<Option<FragmentFields>> {
        match category {
            FragmentCategory::Experience => &mut self.experience,
            FragmentCategory::Education => &mut self.education,
            FragmentCategory::FundingEvent => &mut self.funding_events,
        }
    }

    pub fn populated(&self, category: FragmentCategory) -> usize {
        self.slots(category).iter().filter(|slot| slot.is_some()).count()
    }

    /// Values of one named field across the populated slots of its category.
    pub fn field_values<'a>(
        &'a self,
        category: FragmentCategory,
        field: &'a str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        let position = category.field_names().iter().position(|name| *name == field);
        self.slots(category)
            .iter()
            .flatten()
            .filter_map(move |fields| position.and_then(|p| fields.values()[p]))
    }

    /// Flat column map: `profile_id`, then every category's fields slot by slot.
    pub fn to_row(&self) -> Map<String, Value> {
        let mut row = Map::new();
        row.insert("profile_id".to_string(), Value::String(self.profile_id.clone()));

        for category in CATEGORIES {
            let names = category.field_names();
            for (index, slot) in self.slots(category).iter().enumerate() {
                let values = slot.as_ref().map(|fields| fields.values()).unwrap_or([None; 3]);
                for (name, value) in names.iter().zip(values) {
                    let cell = value.map(|v| Value::String(v.to_string())).unwrap_or(Value::Null);
                    row.insert(slot_column(name, index + 1), cell);
                }
            }
        }
        row
    }
}

/// Column name for `field` in 1-based `slot`.
pub fn slot_column(field: &str, slot: usize) -> String {
    if slot <= 1 {
        field.to_string()
    } else {
        format!("{}_{}", field, slot)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenOutcome {
    /// One profile per distinct id, in first-seen order
    pub profiles: Vec<FlattenedProfile>,
    /// Fragment rows beyond the slot capacity
    pub dropped_fragments: usize,
}

pub struct ProfileFlattener {
    capacity: usize,
}

impl ProfileFlattener {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Flatten the fragments of a single profile. Returns the row and the
    /// number of fragments dropped at the capacity.
    pub fn flatten_profile<'a>(
        &self,
        profile_id: &str,
        fragments: impl IntoIterator<Item = &'a RawProfileFragment>,
    ) -> (FlattenedProfile, usize) {
        let mut profile = FlattenedProfile::empty(profile_id, self.capacity);
        let mut filled: HashMap<FragmentCategory, usize> = HashMap::new();
        let mut dropped = 0;

        for fragment in fragments {
            let category = fragment.category();
            let position = filled.entry(category).or_insert(0);
            if *position < self.capacity {
                profile.slots_mut(category)[*position] = Some(fragment.fields.clone());
                *position += 1;
            } else {
                dropped += 1;
            }
        }

        if dropped > 0 {
            debug!(
                profile_id,
                dropped,
                capacity = self.capacity,
                "Fragments beyond slot capacity dropped"
            );
        }
        (profile, dropped)
    }

    /// Flatten a whole fragment table, one row per distinct profile id.
    pub fn flatten(&self, fragments: &[RawProfileFragment]) -> FlattenOutcome {
        let mut order: Vec<&str> = Vec::new();
        let mut grouped: HashMap<&str, Vec<&RawProfileFragment>> = HashMap::new();
        for fragment in fragments {
            grouped
                .entry(fragment.profile_id.as_str())
                .or_insert_with(|| {
                    order.push(fragment.profile_id.as_str());
                    Vec::new()
                })
                .push(fragment);
        }

        let mut outcome = FlattenOutcome::default();
        for profile_id in order {
            let rows = grouped.remove(profile_id).unwrap_or_default();
            let (profile, dropped) = self.flatten_profile(profile_id, rows);
            outcome.dropped_fragments += dropped;
            outcome.profiles.push(profile);
        }

        info!(
            fragments = fragments.len(),
            profiles = outcome.profiles.len(),
            dropped = outcome.dropped_fragments,
            "Profiles flattened"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn experience(profile: &str, n: usize) -> RawProfileFragment {
        RawProfileFragment {
            profile_id: profile.to_string(),
            fields: FragmentFields::Experience {
                title: Some(format!("title {}", n)),
                company: Some(format!("company {}", n)),
                description: None,
            },
        }
    }

    fn education(profile: &str, n: usize) -> RawProfileFragment {
        RawProfileFragment {
            profile_id: profile.to_string(),
            fields: FragmentFields::Education {
                institution: Some(format!("school {}", n)),
                degree: Some("PhD".to_string()),
                field: None,
            },
        }
    }

    #[test]
    fn test_bounded_slots_per_category() {
        let mut fragments: Vec<RawProfileFragment> = (1..=7).map(|n| experience("p1", n)).collect();
        fragments.insert(3, education("p1", 1));
        fragments.push(education("p1", 2));

        let outcome = ProfileFlattener::new(5).flatten(&fragments);
        assert_eq!(outcome.profiles.len(), 1);
        assert_eq!(outcome.dropped_fragments, 2);

        let profile = &outcome.profiles[0];
        assert_eq!(profile.populated(FragmentCategory::Experience), 5);
        assert_eq!(profile.populated(FragmentCategory::Education), 2);
        assert_eq!(profile.populated(FragmentCategory::FundingEvent), 0);
        assert!(profile.education[2..].iter().all(Option::is_none));

        let titles: Vec<&str> = profile
            .field_values(FragmentCategory::Experience, "title")
            .collect();
        assert_eq!(titles, vec!["title 1", "title 2", "title 3", "title 4", "title 5"]);
    }

    #[test]
    fn test_one_row_per_distinct_profile_in_first_seen_order() {
        let fragments = vec![
            experience("b", 1),
            experience("a", 1),
            education("b", 1),
            experience("c", 1),
        ];
        let outcome = ProfileFlattener::new(5).flatten(&fragments);
        let ids: Vec<&str> = outcome.profiles.iter().map(|p| p.profile_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_row_has_fixed_column_count() {
        let flattener = ProfileFlattener::new(5);
        let (sparse, _) = flattener.flatten_profile("p", &[experience("p", 1)]);
        let many: Vec<RawProfileFragment> = (1..=9).map(|n| experience("q", n)).collect();
        let (dense, _) = flattener.flatten_profile("q", &many);

        // profile_id plus 3 fields x 5 slots for each of the 3 categories
        assert_eq!(sparse.to_row().len(), 1 + 3 * 3 * 5);
        assert_eq!(dense.to_row().len(), 1 + 3 * 3 * 5);

        let row = sparse.to_row();
        assert_eq!(row["title"], Value::String("title 1".to_string()));
        assert_eq!(row["title_2"], Value::Null);
        assert!(row.contains_key("text_5"));
        assert!(!row.contains_key("title_6"));
    }

    #[test]
    fn test_slot_column_names() {
        assert_eq!(slot_column("degree", 1), "degree");
        assert_eq!(slot_column("degree", 4), "degree_4");
    }
}
