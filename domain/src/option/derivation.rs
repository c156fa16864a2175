//! Catalogue derivation from submitted suggestion sets

use super::{OptionKind, VoteOption};
use crate::core::ids::OptionId;
use crate::suggestion::{ActivityType, SuggestionSet};
use std::collections::HashMap;

/// Union all submitted suggestion sets into a trip's option catalogue.
///
/// Order is fixed so re-running the brainstorm action reproduces the same
/// ids: sets sorted by user id, then days, then activities in itinerary
/// order, then cuisine picks. Within each set an activity contributes its
/// name (travel legs excluded) and its start/end locations. Labels are
/// compared trimmed and case-insensitively; the first spelling wins.
///
/// Ids are `{kind}_{n:03}` with `n` counted per kind; `seq` is counted
/// across all kinds and defines creation order.
pub fn derive_catalogue(sets: &[SuggestionSet]) -> Vec<VoteOption> {
    let mut ordered: Vec<&SuggestionSet> = sets.iter().filter(|s| s.is_submitted()).collect();
    ordered.sort_by(|a, b| a.user_id.cmp(&b.user_id));

    let mut builder = CatalogueBuilder::default();

    for set in ordered {
        let mut days: Vec<_> = set.candidates.days.iter().collect();
        days.sort_by_key(|d| d.day);

        for day in days {
            for activity in &day.activities {
                if activity.activity_type != ActivityType::Travel {
                    builder.add(OptionKind::Activity, &activity.activity_name, set);
                }
                builder.add(OptionKind::Location, &activity.start_location, set);
                builder.add(OptionKind::Location, &activity.end_location, set);
            }
        }

        for cuisine in &set.candidates.cuisines {
            builder.add(OptionKind::Cuisine, cuisine, set);
        }
    }

    builder.options
}

#[derive(Default)]
struct CatalogueBuilder {
    options: Vec<VoteOption>,
    index: HashMap<(OptionKind, String), usize>,
    per_kind: HashMap<OptionKind, u64>,
}

impl CatalogueBuilder {
    fn add(&mut self, kind: OptionKind, label: &str, set: &SuggestionSet) {
        let label = label.trim();
        if label.is_empty() {
            return;
        }

        let key = (kind, label.to_lowercase());
        let position = match self.index.get(&key) {
            Some(&position) => position,
            None => {
                let n = self.per_kind.entry(kind).or_insert(0);
                *n += 1;
                let id = OptionId::new(format!("{}_{:03}", kind.as_str(), n));
                let seq = self.options.len() as u64 + 1;
                self.options.push(VoteOption::new(id, kind, label, seq));
                self.index.insert(key, self.options.len() - 1);
                self.options.len() - 1
            }
        };

        self.options[position]
            .proposed_by
            .insert(set.user_id.clone());
    }
}
