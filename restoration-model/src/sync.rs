//! Assistance-entry synchronization.
//!
//! The assistance cost list must track the selected-assistance set one to
//! one. [`reconcile_assistance_entries`] repairs drift: it keeps existing
//! entries in place, drops entries for deselected (or repeated) activities
//! and appends a zeroed entry for each newly selected one. When the two
//! sides already match it hands back the input slice untouched, so callers
//! can skip the write entirely.

use std::borrow::Cow;
use std::collections::BTreeSet;

use crate::types::{AssistanceActivity, AssistanceCostEntry};

/// Canonical, order-insensitive key for a list of identifiers.
///
/// Repeated identifiers are kept, so a list with duplicates never matches a
/// proper set.
pub fn canonical_key<'a>(names: impl IntoIterator<Item = &'a AssistanceActivity>) -> String {
    let mut names: Vec<&str> = names.into_iter().map(|n| n.as_str()).collect();
    names.sort_unstable();
    names.join(",")
}

/// Whether the entry names already match the selection.
pub fn entries_match_selection(
    selected: &[AssistanceActivity],
    entries: &[AssistanceCostEntry],
) -> bool {
    let unique: BTreeSet<&AssistanceActivity> = selected.iter().collect();
    canonical_key(unique) == canonical_key(entries.iter().map(|e| &e.name))
}

/// Bring `current` in line with `selected`.
///
/// Returns `Cow::Borrowed(current)` when nothing needs to change.
pub fn reconcile_assistance_entries<'a>(
    selected: &[AssistanceActivity],
    current: &'a [AssistanceCostEntry],
) -> Cow<'a, [AssistanceCostEntry]> {
    if entries_match_selection(selected, current) {
        return Cow::Borrowed(current);
    }

    let mut seen: BTreeSet<AssistanceActivity> = BTreeSet::new();
    let mut next: Vec<AssistanceCostEntry> = current
        .iter()
        .filter(|e| selected.contains(&e.name) && seen.insert(e.name))
        .cloned()
        .collect();

    for name in selected {
        if seen.insert(*name) {
            next.push(AssistanceCostEntry::zeroed(*name));
        }
    }

    tracing::debug!(
        before = current.len(),
        after = next.len(),
        "Synchronized assistance cost entries"
    );

    Cow::Owned(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CostPhase;

    use AssistanceActivity::*;

    fn costed(name: AssistanceActivity, cost: f64) -> AssistanceCostEntry {
        AssistanceCostEntry {
            cost: Some(cost),
            phase: CostPhase::Both,
            ..AssistanceCostEntry::zeroed(name)
        }
    }

    #[test]
    fn test_matching_sets_are_borrowed() {
        let entries = vec![costed(Firebreak, 10.0), costed(Fencing, 20.0)];
        let result = reconcile_assistance_entries(&[Fencing, Firebreak], &entries);
        match result {
            Cow::Borrowed(slice) => assert!(std::ptr::eq(slice, entries.as_slice())),
            Cow::Owned(_) => panic!("matching sets must not be rewritten"),
        }
    }

    #[test]
    fn test_new_selection_appends_zeroed_entry() {
        let entries = vec![costed(Fencing, 20.0)];
        let result = reconcile_assistance_entries(&[Fencing, SoilRecovery], &entries);
        assert_eq!(
            result.as_ref(),
            &[costed(Fencing, 20.0), AssistanceCostEntry::zeroed(SoilRecovery)]
        );
    }

    #[test]
    fn test_deselection_removes_entry_without_reordering() {
        let entries = vec![
            costed(CattleManagement, 1.0),
            costed(Fencing, 2.0),
            costed(Firebreak, 3.0),
        ];
        let result = reconcile_assistance_entries(&[Firebreak, CattleManagement], &entries);
        assert_eq!(
            result.as_ref(),
            &[costed(CattleManagement, 1.0), costed(Firebreak, 3.0)]
        );
    }

    #[test]
    fn test_duplicate_entries_are_collapsed() {
        let entries = vec![costed(Fencing, 5.0), costed(Fencing, 7.0)];
        let result = reconcile_assistance_entries(&[Fencing], &entries);
        assert_eq!(result.as_ref(), &[costed(Fencing, 5.0)]);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let entries = vec![costed(InvasiveControl, 4.0)];
        let selected = [EnrichmentPlanting, InvasiveControl];
        let once = reconcile_assistance_entries(&selected, &entries).into_owned();
        let twice = reconcile_assistance_entries(&selected, &once);
        assert!(matches!(twice, Cow::Borrowed(_)));
        assert_eq!(twice.as_ref(), once.as_slice());
    }

    #[test]
    fn test_empty_selection_clears_entries() {
        let entries = vec![costed(Fencing, 1.0)];
        let result = reconcile_assistance_entries(&[], &entries);
        assert!(result.is_empty());
        assert!(matches!(
            reconcile_assistance_entries(&[], &[]),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn test_canonical_key_ignores_order() {
        assert_eq!(canonical_key(&[Fencing, Firebreak]), canonical_key(&[Firebreak, Fencing]));
        assert_ne!(canonical_key(&[Fencing]), canonical_key(&[Fencing, Fencing]));
    }
}
