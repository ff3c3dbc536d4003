//! Merge resolver — turns `Group` merges into OR-chains and a suppression set.

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use tracing::debug;

use crate::model::{Merge, RefId};

/// Merge edges resolved from the `merges` list.
#[derive(Debug, Clone, Default)]
pub struct MergeIndex {
    /// Target group → source groups OR-ed into it, in declaration order.
    targets: IndexMap<RefId, Vec<RefId>>,
    /// Every group that was merged into another.
    sources: IndexSet<RefId>,
}

impl MergeIndex {
    /// Scan the merges list once.
    pub fn build(merges: &[Value]) -> Self {
        let mut index = Self::default();

        for entry in merges {
            match Merge::from_json(entry) {
                Merge::Group(edge) => {
                    index.sources.extend(edge.sources.iter().cloned());
                    // An edge without a target still suppresses its sources.
                    if let Some(target) = edge.target {
                        index.targets.entry(target).or_default().extend(edge.sources);
                    }
                }
                Merge::Other(kind) => {
                    debug!(%kind, "Ignoring merge kind");
                }
            }
        }

        debug!(
            targets = index.targets.len(),
            suppressed = index.sources.len(),
            "Resolved merges"
        );
        index
    }

    /// Whether this group was merged into another and must not render alone.
    pub fn is_suppressed(&self, ref_id: &RefId) -> bool {
        self.sources.contains(ref_id)
    }

    /// Groups merged into `target`, in declaration order.
    pub fn sources_of(&self, target: &RefId) -> &[RefId] {
        self.targets.get(target).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn suppressed_count(&self) -> usize {
        self.sources.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn appends_across_entries_in_order() {
        let index = MergeIndex::build(&[
            json!({ "type": "Group", "to": "a", "from": ["b"] }),
            json!({ "type": "Group", "to": "x", "from": ["y"] }),
            json!({ "type": "Group", "to": "a", "from": ["c", "d"] }),
        ]);
        let a = RefId::from("a");
        assert_eq!(
            index.sources_of(&a),
            &[RefId::from("b"), RefId::from("c"), RefId::from("d")]
        );
        assert!(index.is_suppressed(&RefId::from("y")));
        assert!(!index.is_suppressed(&a));
        assert_eq!(index.suppressed_count(), 4);
    }

    #[test]
    fn non_group_merges_are_ignored() {
        let index = MergeIndex::build(&[json!({ "type": "Account", "to": "a", "from": ["b"] })]);
        assert!(!index.is_suppressed(&RefId::from("b")));
        assert!(index.sources_of(&RefId::from("a")).is_empty());
    }

    #[test]
    fn unknown_target_has_no_sources() {
        let index = MergeIndex::default();
        assert!(index.sources_of(&RefId::from("nope")).is_empty());
    }

    #[test]
    fn edge_without_target_still_suppresses() {
        let index = MergeIndex::build(&[json!({ "type": "Group", "from": ["b"] })]);
        assert!(index.is_suppressed(&RefId::from("b")));
    }
}
