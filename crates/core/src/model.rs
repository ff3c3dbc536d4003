//! Domain model for perspective schemas.
//!
//! The raw document is three flat, ordered lists (`constants`, `rules`,
//! `merges`) whose entries reference each other by [`RefId`]. Entries stay as
//! `serde_json::Value` until a pass decodes them into the typed records below,
//! so one malformed entry never poisons the rest of the document.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::error::{DocumentError, RecordIssue, Result, json_type_name};

/// Opaque join key linking constants, rules and merges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RefId(pub String);

impl RefId {
    /// Read a reference id out of a JSON value. Strings are used as-is,
    /// integers are stringified, anything else is not an id.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RefId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ── Document envelope ────────────────────────────────────────────────────

/// A parsed perspective schema document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Perspective name (`schema.name`).
    pub name: Option<String>,
    pub constants: Vec<Value>,
    pub rules: Vec<Value>,
    pub merges: Vec<Value>,
}

impl Document {
    /// Decode the `{"schema": {...}}` envelope.
    ///
    /// Missing lists are treated as empty. Only a non-object top level (or a
    /// non-object `schema`) is an error.
    pub fn from_value(value: &Value) -> Result<Self> {
        let root = value.as_object().ok_or(DocumentError::NotAnObject {
            found: json_type_name(value),
        })?;

        let schema = match root.get("schema") {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Object(schema)) => schema,
            Some(other) => {
                return Err(DocumentError::SchemaNotAnObject {
                    found: json_type_name(other),
                }
                .into());
            }
        };

        let list = |key: &str| -> Vec<Value> {
            match schema.get(key) {
                Some(Value::Array(items)) => items.clone(),
                None | Some(Value::Null) => Vec::new(),
                Some(other) => {
                    tracing::warn!(
                        key,
                        found = json_type_name(other),
                        "Schema list is not an array, treating as empty"
                    );
                    Vec::new()
                }
            }
        };

        Ok(Self {
            name: schema.get("name").and_then(scalar_text),
            constants: list("constants"),
            rules: list("rules"),
            merges: list("merges"),
        })
    }

    /// Parse a JSON string into a document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }
}

// ── Kinds ────────────────────────────────────────────────────────────────

/// The `type` of a constants entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstantKind {
    GroupBlock,
    DynamicGroup,
    StaticGroup,
    /// Unrecognized kinds are ignored by the indexer.
    Other(String),
}

impl ConstantKind {
    pub fn of(entry: &Value) -> Self {
        match entry.get("type").and_then(Value::as_str) {
            Some("Dynamic Group Block") => Self::GroupBlock,
            Some("Dynamic Group") => Self::DynamicGroup,
            Some("Static Group") => Self::StaticGroup,
            Some(other) => Self::Other(other.to_string()),
            None => Self::Other(String::new()),
        }
    }

    /// Label used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::GroupBlock => "Dynamic Group Block",
            Self::DynamicGroup => "Dynamic Group",
            Self::StaticGroup => "Static Group",
            Self::Other(_) => "unknown constant",
        }
    }
}

/// A decoded `rules` entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Categorize(CategorizeRule),
    Filter(FilterRule),
    /// Any other rule type; ignored.
    Other(String),
}

impl Rule {
    pub fn from_json(entry: &Value) -> Self {
        match entry.get("type").and_then(Value::as_str) {
            Some("categorize") => Self::Categorize(CategorizeRule::from_json(entry)),
            Some("filter") => Self::Filter(FilterRule::from_json(entry)),
            Some(other) => Self::Other(other.to_string()),
            None => Self::Other(String::new()),
        }
    }
}

/// A decoded `merges` entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Merge {
    Group(MergeEdge),
    /// Reserved for other merge types; ignored.
    Other(String),
}

impl Merge {
    pub fn from_json(entry: &Value) -> Self {
        match entry.get("type").and_then(Value::as_str) {
            Some("Group") => Self::Group(MergeEdge::from_json(entry)),
            Some(other) => Self::Other(other.to_string()),
            None => Self::Other(String::new()),
        }
    }
}

// ── Constants ────────────────────────────────────────────────────────────

/// Named container of dynamic groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupBlock {
    pub ref_id: RefId,
    pub name: String,
}

/// One tag-value bucket inside a group block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DynamicGroup {
    pub ref_id: RefId,
    pub name: String,
    /// Owning block (`blk_id`).
    pub block_id: Option<RefId>,
    /// Tag value this group matches (`val`).
    pub value: String,
}

/// A bucket defined by filter rules, or the catch-all "Other" bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticGroup {
    pub ref_id: RefId,
    pub name: String,
    pub is_other: bool,
}

impl GroupBlock {
    pub fn from_json(index: usize, entry: &Value) -> std::result::Result<Self, RecordIssue> {
        let ref_id = required_ref_id(ConstantKind::GroupBlock.label(), index, entry)?;
        Ok(Self {
            ref_id,
            name: text_or_empty(entry, "name"),
        })
    }
}

impl DynamicGroup {
    pub fn from_json(index: usize, entry: &Value) -> std::result::Result<Self, RecordIssue> {
        let ref_id = required_ref_id(ConstantKind::DynamicGroup.label(), index, entry)?;
        Ok(Self {
            ref_id,
            name: text_or_empty(entry, "name"),
            block_id: entry.get("blk_id").and_then(RefId::from_json),
            value: text_or_empty(entry, "val"),
        })
    }
}

impl StaticGroup {
    pub fn from_json(index: usize, entry: &Value) -> std::result::Result<Self, RecordIssue> {
        let ref_id = required_ref_id(ConstantKind::StaticGroup.label(), index, entry)?;
        let is_other = match entry.get("is_other") {
            Some(Value::String(s)) => s == "true",
            Some(Value::Bool(b)) => *b,
            _ => false,
        };
        Ok(Self {
            ref_id,
            name: text_or_empty(entry, "name"),
            is_other,
        })
    }
}

fn required_ref_id(
    kind: &'static str,
    index: usize,
    entry: &Value,
) -> std::result::Result<RefId, RecordIssue> {
    if !entry.is_object() {
        return Err(RecordIssue::NotAnObject { kind, index });
    }
    entry
        .get("ref_id")
        .and_then(RefId::from_json)
        .ok_or(RecordIssue::MissingRefId { kind, index })
}

// ── Rules & merges ───────────────────────────────────────────────────────

/// Declares a group block's filter basis: `asset WHERE tag {tag_field} = value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorizeRule {
    /// The group block this rule describes.
    pub ref_id: Option<RefId>,
    pub name: String,
    pub asset_type: String,
    pub tag_field: String,
}

impl CategorizeRule {
    pub fn from_json(entry: &Value) -> Self {
        Self {
            ref_id: entry.get("ref_id").and_then(RefId::from_json),
            name: text_or_empty(entry, "name"),
            asset_type: text_or_empty(entry, "asset"),
            tag_field: first_text(entry, "tag_field"),
        }
    }
}

/// One OR-branch of AND-ed clauses, scoped to an asset type and target group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterRule {
    pub target: Option<RefId>,
    pub asset_type: String,
    /// Carries a `fwd_to` marker: the rule redirects to another group.
    pub forwarded: bool,
    pub clauses: Vec<Clause>,
}

impl FilterRule {
    pub fn from_json(entry: &Value) -> Self {
        let clauses = entry
            .get("condition")
            .and_then(|c| c.get("clauses"))
            .and_then(Value::as_array)
            .map(|items| items.iter().map(Clause::from_json).collect())
            .unwrap_or_default();

        Self {
            target: entry.get("to").and_then(RefId::from_json),
            asset_type: text_or_empty(entry, "asset"),
            forwarded: entry.get("fwd_to").is_some(),
            clauses,
        }
    }
}

/// `from` groups are OR-ed into the `to` group's rendered condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeEdge {
    pub target: Option<RefId>,
    pub sources: Vec<RefId>,
}

impl MergeEdge {
    pub fn from_json(entry: &Value) -> Self {
        let sources = entry
            .get("from")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(RefId::from_json).collect())
            .unwrap_or_default();

        Self {
            target: entry.get("to").and_then(RefId::from_json),
            sources,
        }
    }
}

// ── Clauses ──────────────────────────────────────────────────────────────

/// The left-hand side of a clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FieldRef {
    /// `tag_field` reference, rendered with a `tag ` prefix.
    Tag(String),
    /// Plain `field` reference.
    Field(String),
}

impl FieldRef {
    pub fn name(&self) -> &str {
        match self {
            Self::Tag(name) | Self::Field(name) => name,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Tag(_) => "tag ",
            Self::Field(_) => "",
        }
    }
}

/// Comparison operator of a clause.
///
/// `=`, `!=` and `Contains` only match their exact spelling, while the
/// null checks and `does not contain` match in any case. Anything else is
/// kept verbatim and rendered literally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Operator {
    Eq,
    NotEq,
    Contains,
    DoesNotContain,
    IsNull,
    IsNotNull,
    Other(String),
}

impl Operator {
    pub fn parse(op: &str) -> Self {
        match op {
            "=" => return Self::Eq,
            "!=" => return Self::NotEq,
            "Contains" => return Self::Contains,
            _ => {}
        }
        match op.to_lowercase().as_str() {
            "does not contain" => Self::DoesNotContain,
            "is null" => Self::IsNull,
            "is not null" => Self::IsNotNull,
            _ => Self::Other(op.to_string()),
        }
    }
}

/// A single comparison within a filter rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Clause {
    pub field: FieldRef,
    pub operator: Operator,
    pub value: String,
}

impl Clause {
    pub fn from_json(entry: &Value) -> Self {
        let field = if entry.get("tag_field").is_some() {
            FieldRef::Tag(first_text(entry, "tag_field"))
        } else {
            FieldRef::Field(first_text(entry, "field"))
        };
        let op = entry
            .get("op")
            .and_then(scalar_text)
            .unwrap_or_else(|| "=".to_string());

        Self {
            field,
            operator: Operator::parse(&op),
            value: text_or_empty(entry, "val"),
        }
    }
}

// ── Field helpers ────────────────────────────────────────────────────────

/// Render a scalar JSON value as text. Containers and null have no text.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_or_empty(entry: &Value, key: &str) -> String {
    entry.get(key).and_then(scalar_text).unwrap_or_default()
}

/// First element of a list field; a bare scalar counts as a one-element list.
fn first_text(entry: &Value, key: &str) -> String {
    match entry.get(key) {
        Some(Value::Array(items)) => items.first().and_then(scalar_text).unwrap_or_default(),
        Some(other) => scalar_text(other).unwrap_or_default(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_missing_schema_is_empty() {
        let doc = Document::from_value(&json!({})).unwrap();
        assert!(doc.name.is_none());
        assert!(doc.constants.is_empty());
        assert!(doc.rules.is_empty());
        assert!(doc.merges.is_empty());
    }

    #[test]
    fn document_rejects_non_object() {
        assert!(Document::from_value(&json!([1, 2])).is_err());
        assert!(Document::from_value(&json!({ "schema": "nope" })).is_err());
    }

    #[test]
    fn document_from_json_str() {
        let doc = Document::from_json_str(
            r#"{"schema": {"name": "Env", "rules": [{"type": "filter"}], "merges": 7}}"#,
        )
        .unwrap();
        assert_eq!(doc.name.as_deref(), Some("Env"));
        assert_eq!(doc.rules.len(), 1);
        assert!(doc.merges.is_empty());
    }

    #[test]
    fn invalid_json_is_serialization_error() {
        let err = Document::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, crate::Error::Serialization(_)));
    }

    #[test]
    fn ref_id_accepts_strings_and_integers() {
        assert_eq!(RefId::from_json(&json!("abc")), Some(RefId::from("abc")));
        assert_eq!(RefId::from_json(&json!(42)), Some(RefId::from("42")));
        assert_eq!(RefId::from_json(&json!(null)), None);
        assert_eq!(RefId::from_json(&json!(["x"])), None);
    }

    #[test]
    fn constant_kinds() {
        assert_eq!(
            ConstantKind::of(&json!({ "type": "Dynamic Group Block" })),
            ConstantKind::GroupBlock
        );
        assert_eq!(
            ConstantKind::of(&json!({ "type": "Static Group" })),
            ConstantKind::StaticGroup
        );
        assert_eq!(
            ConstantKind::of(&json!({ "type": "Member Account" })),
            ConstantKind::Other("Member Account".into())
        );
    }

    #[test]
    fn dynamic_group_defaults() {
        let group = DynamicGroup::from_json(0, &json!({ "ref_id": "g1" })).unwrap();
        assert_eq!(group.name, "");
        assert_eq!(group.value, "");
        assert!(group.block_id.is_none());
    }

    #[test]
    fn missing_ref_id_is_reported() {
        let err = DynamicGroup::from_json(2, &json!({ "name": "Prod" })).unwrap_err();
        assert_eq!(
            err,
            RecordIssue::MissingRefId {
                kind: "Dynamic Group",
                index: 2
            }
        );
        let err = StaticGroup::from_json(0, &json!("oops")).unwrap_err();
        assert!(matches!(err, RecordIssue::NotAnObject { .. }));
    }

    #[test]
    fn static_group_is_other_flag() {
        let s = StaticGroup::from_json(0, &json!({ "ref_id": "1", "is_other": "true" })).unwrap();
        assert!(s.is_other);
        let b = StaticGroup::from_json(0, &json!({ "ref_id": "1", "is_other": true })).unwrap();
        assert!(b.is_other);
        let f = StaticGroup::from_json(0, &json!({ "ref_id": "1", "is_other": "false" })).unwrap();
        assert!(!f.is_other);
    }

    #[test]
    fn clause_field_selection() {
        let tag = Clause::from_json(&json!({ "tag_field": ["Team"], "op": "=", "val": "x" }));
        assert_eq!(tag.field, FieldRef::Tag("Team".into()));

        let empty_tag = Clause::from_json(&json!({ "tag_field": [], "val": "x" }));
        assert_eq!(empty_tag.field, FieldRef::Tag(String::new()));
        assert_eq!(empty_tag.operator, Operator::Eq);

        let plain = Clause::from_json(&json!({ "field": ["Region", "ignored"], "op": "!=" }));
        assert_eq!(plain.field, FieldRef::Field("Region".into()));
        assert_eq!(plain.operator, Operator::NotEq);
        assert_eq!(plain.value, "");
    }

    #[test]
    fn operator_case_rules() {
        assert_eq!(Operator::parse("Contains"), Operator::Contains);
        assert_eq!(Operator::parse("contains"), Operator::Other("contains".into()));
        assert_eq!(Operator::parse("Is Null"), Operator::IsNull);
        assert_eq!(Operator::parse("IS NOT NULL"), Operator::IsNotNull);
        assert_eq!(Operator::parse("Does Not Contain"), Operator::DoesNotContain);
        assert_eq!(Operator::parse("=="), Operator::Other("==".into()));
    }

    #[test]
    fn filter_rule_forward_marker() {
        let rule = FilterRule::from_json(&json!({
            "type": "filter",
            "to": "s1",
            "fwd_to": "s2",
            "asset": "AwsAsset"
        }));
        assert!(rule.forwarded);
        assert!(rule.clauses.is_empty());
        assert_eq!(rule.target, Some(RefId::from("s1")));
    }

    #[test]
    fn merge_kinds() {
        let edge = Merge::from_json(&json!({ "type": "Group", "to": "a", "from": ["b", "c"] }));
        match edge {
            Merge::Group(edge) => {
                assert_eq!(edge.target, Some(RefId::from("a")));
                assert_eq!(edge.sources, vec![RefId::from("b"), RefId::from("c")]);
            }
            other => panic!("expected group merge, got {other:?}"),
        }
        assert_eq!(
            Merge::from_json(&json!({ "type": "Account" })),
            Merge::Other("Account".into())
        );
    }
}
