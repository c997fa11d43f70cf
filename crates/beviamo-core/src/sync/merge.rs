//! Id-keyed merge of intervention histories.
//!
//! Histories are logically sets keyed by `id`. Every merge goes through
//! [`merge_records`], which deduplicates with [`resolve`] and returns the
//! display order: `createdAt` descending, ties kept in first-seen order.

use std::collections::{HashMap, HashSet};

use crate::models::{Intervention, InterventionId};

/// Choose the copy kept when two records share an id.
///
/// `earlier` is the copy positioned first in the merge sequence, `later` the
/// one seen after it. The later copy wins. Records are only ever written by
/// the client that created them, so the two copies are expected to be equal.
pub fn resolve(earlier: Intervention, later: Intervention) -> Intervention {
    if earlier != later {
        tracing::debug!(
            id = %later.id,
            "Diverging copies of the same intervention; keeping the later one"
        );
    }
    later
}

/// Deduplicate a sequence of records by id and sort it newest first.
pub fn merge_records<I>(records: I) -> Vec<Intervention>
where
    I: IntoIterator<Item = Intervention>,
{
    let mut by_id: HashMap<InterventionId, (usize, Intervention)> = HashMap::new();

    for (position, record) in records.into_iter().enumerate() {
        let id = record.id.clone();
        let slot = match by_id.remove(&id) {
            Some((first_position, existing)) => (first_position, resolve(existing, record)),
            None => (position, record),
        };
        by_id.insert(id, slot);
    }

    let mut merged = by_id.into_values().collect::<Vec<_>>();
    merged.sort_by(|(left_pos, left), (right_pos, right)| {
        right
            .created_at
            .cmp(&left.created_at)
            .then(left_pos.cmp(right_pos))
    });
    merged.into_iter().map(|(_, record)| record).collect()
}

/// Ids present in a history
pub fn id_set(records: &[Intervention]) -> HashSet<&InterventionId> {
    records.iter().map(|record| &record.id).collect()
}

/// Records of `candidates` whose id does not appear in `reference`
pub fn missing_from<'a>(
    candidates: &'a [Intervention],
    reference: &[Intervention],
) -> Vec<&'a Intervention> {
    let known = id_set(reference);
    let mut seen = HashSet::new();
    candidates
        .iter()
        .filter(|record| !known.contains(&record.id) && seen.insert(&record.id))
        .collect()
}
