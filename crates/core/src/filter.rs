//! Filter collector — gathers filter rules per target group.
//!
//! Clauses inside one rule are AND-ed; rules sharing a target and asset type
//! are OR-ed. Rules carrying a forward marker belong to another group's chain
//! and are never collected here.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::model::{Clause, RefId, Rule};

/// One collected filter rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRecord {
    pub asset_type: String,
    pub clauses: Vec<Clause>,
}

/// Filter rules keyed by target group, in rule declaration order.
#[derive(Debug, Clone, Default)]
pub struct FilterIndex {
    by_target: IndexMap<RefId, Vec<FilterRecord>>,
    forwarded: usize,
}

impl FilterIndex {
    /// Scan the rules list once.
    pub fn build(rules: &[Value]) -> Self {
        let mut index = Self::default();

        for entry in rules {
            let Rule::Filter(rule) = Rule::from_json(entry) else {
                continue;
            };
            if rule.forwarded {
                index.forwarded += 1;
                continue;
            }
            let Some(target) = rule.target.filter(|t| !t.as_str().is_empty()) else {
                debug!("Filter rule without target, dropping");
                continue;
            };
            index.by_target.entry(target).or_default().push(FilterRecord {
                asset_type: rule.asset_type,
                clauses: rule.clauses,
            });
        }

        debug!(
            targets = index.by_target.len(),
            forwarded = index.forwarded,
            "Collected filter rules"
        );
        index
    }

    /// Records collected for a group, in declaration order.
    pub fn records_for(&self, target: &RefId) -> &[FilterRecord] {
        self.by_target
            .get(target)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Records for a group re-grouped by asset type. Asset types appear in
    /// first-seen order; each holds its rules' clause lists in order.
    pub fn by_asset(&self, target: &RefId) -> IndexMap<&str, Vec<&[Clause]>> {
        let mut grouped: IndexMap<&str, Vec<&[Clause]>> = IndexMap::new();
        for record in self.records_for(target) {
            grouped
                .entry(record.asset_type.as_str())
                .or_default()
                .push(&record.clauses);
        }
        grouped
    }

    /// Number of rules skipped for carrying a forward marker.
    pub fn forwarded_count(&self) -> usize {
        self.forwarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn clause(field: &str, val: &str) -> Value {
        json!({ "field": [field], "op": "=", "val": val })
    }

    #[test]
    fn collects_in_declaration_order() {
        let index = FilterIndex::build(&[
            json!({ "type": "filter", "to": "s1", "asset": "AwsAsset",
                    "condition": { "clauses": [clause("a", "1")] } }),
            json!({ "type": "categorize", "ref_id": "b1" }),
            json!({ "type": "filter", "to": "s1", "asset": "AwsAsset",
                    "condition": { "clauses": [clause("b", "2"), clause("c", "3")] } }),
        ]);
        let records = index.records_for(&RefId::from("s1"));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].clauses.len(), 1);
        assert_eq!(records[1].clauses.len(), 2);
    }

    #[test]
    fn forwarded_rules_are_never_collected() {
        let index = FilterIndex::build(&[
            json!({ "type": "filter", "to": "s1", "fwd_to": "s2", "asset": "AwsAsset",
                    "condition": { "clauses": [clause("a", "1")] } }),
            json!({ "type": "filter", "to": "s2", "fwd_to": null, "asset": "AwsAsset" }),
        ]);
        assert!(index.records_for(&RefId::from("s1")).is_empty());
        assert!(index.records_for(&RefId::from("s2")).is_empty());
        assert_eq!(index.forwarded_count(), 2);
    }

    #[test]
    fn rules_without_target_are_dropped() {
        let index = FilterIndex::build(&[json!({ "type": "filter", "asset": "AwsAsset" })]);
        assert!(index.by_target.is_empty());
    }

    #[test]
    fn rules_with_blank_target_are_dropped() {
        let index = FilterIndex::build(&[json!({ "type": "filter", "to": "", "asset": "AwsAsset",
                                                 "condition": { "clauses": [clause("a", "1")] } })]);
        assert!(index.by_target.is_empty());
        assert!(index.records_for(&RefId::from("")).is_empty());
    }

    #[test]
    fn by_asset_uses_first_seen_order() {
        let index = FilterIndex::build(&[
            json!({ "type": "filter", "to": "s1", "asset": "AzureVm",
                    "condition": { "clauses": [clause("a", "1")] } }),
            json!({ "type": "filter", "to": "s1", "asset": "AwsInstance",
                    "condition": { "clauses": [clause("b", "2")] } }),
            json!({ "type": "filter", "to": "s1", "asset": "AzureVm",
                    "condition": { "clauses": [clause("c", "3")] } }),
        ]);
        let grouped = index.by_asset(&RefId::from("s1"));
        let assets: Vec<_> = grouped.keys().copied().collect();
        assert_eq!(assets, vec!["AzureVm", "AwsInstance"]);
        assert_eq!(grouped["AzureVm"].len(), 2);
    }
}
