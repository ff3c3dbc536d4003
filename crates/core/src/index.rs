//! Indexer — partitions the constants list into keyed lookups.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::RecordIssue;
use crate::model::{ConstantKind, DynamicGroup, GroupBlock, RefId, StaticGroup};

/// Group blocks, dynamic groups and static groups keyed by `ref_id`.
///
/// Maps keep first-insertion order. A duplicate `ref_id` replaces the earlier
/// entry in place (last write wins, original position kept).
#[derive(Debug, Clone, Default)]
pub struct ConstantIndex {
    pub group_blocks: IndexMap<RefId, GroupBlock>,
    pub dynamic_groups: IndexMap<RefId, DynamicGroup>,
    pub static_groups: IndexMap<RefId, StaticGroup>,
    /// Entries skipped because they were malformed.
    pub issues: Vec<RecordIssue>,
}

impl ConstantIndex {
    /// Scan the constants list once.
    pub fn build(constants: &[Value]) -> Self {
        let mut index = Self::default();

        for constant in constants {
            let kind = ConstantKind::of(constant);
            let entries = match constant.get("list").and_then(Value::as_array) {
                Some(entries) => entries,
                None => continue,
            };

            match kind {
                ConstantKind::GroupBlock => {
                    for (i, entry) in entries.iter().enumerate() {
                        if let Some(block) = index.accept(GroupBlock::from_json(i, entry)) {
                            overwrite(&mut index.group_blocks, block.ref_id.clone(), block);
                        }
                    }
                }
                ConstantKind::DynamicGroup => {
                    for (i, entry) in entries.iter().enumerate() {
                        if let Some(group) = index.accept(DynamicGroup::from_json(i, entry)) {
                            overwrite(&mut index.dynamic_groups, group.ref_id.clone(), group);
                        }
                    }
                }
                ConstantKind::StaticGroup => {
                    for (i, entry) in entries.iter().enumerate() {
                        if let Some(group) = index.accept(StaticGroup::from_json(i, entry)) {
                            overwrite(&mut index.static_groups, group.ref_id.clone(), group);
                        }
                    }
                }
                ConstantKind::Other(name) => {
                    debug!(kind = %name, "Ignoring constant kind");
                }
            }
        }

        debug!(
            group_blocks = index.group_blocks.len(),
            dynamic_groups = index.dynamic_groups.len(),
            static_groups = index.static_groups.len(),
            skipped = index.issues.len(),
            "Indexed constants"
        );
        index
    }

    /// Dynamic groups belonging to a block, in index order.
    ///
    /// A `None` block id matches groups that have no `blk_id` themselves.
    pub fn groups_in_block<'a>(
        &'a self,
        block_id: Option<&'a RefId>,
    ) -> impl Iterator<Item = &'a DynamicGroup> + 'a {
        self.dynamic_groups
            .values()
            .filter(move |group| group.block_id.as_ref() == block_id)
    }

    fn accept<T>(&mut self, record: Result<T, RecordIssue>) -> Option<T> {
        match record {
            Ok(record) => Some(record),
            Err(issue) => {
                warn!(%issue, "Skipping malformed constant");
                self.issues.push(issue);
                None
            }
        }
    }
}

fn overwrite<T>(map: &mut IndexMap<RefId, T>, key: RefId, value: T) {
    if map.insert(key.clone(), value).is_some() {
        debug!(ref_id = %key, "Duplicate ref_id, later entry wins");
    }
}
