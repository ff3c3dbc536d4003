//! Report renderer.
//!
//! Two passes share one clause formatter:
//!
//! 1. **Dynamic groups** — for every `categorize` rule, a block header and one
//!    section per dynamic group of that block, with merged-in groups OR-ed in.
//! 2. **Static groups** — one section per static group, with its collected
//!    filter rules rendered as a fixed two-level boolean expression.
//!
//! Output layout:
//!
//! ```text
//! Perspective: Environments
//!
//! Group Block: Environment
//!
//! ----------------------------------------------------------------------------
//!
//! Group:  Production
//!
//! Filter: Aws Account
//!         WHERE tag Environment = 'prod'
//!         OR tag Environment = 'production'
//!
//! Static Groups:
//!
//! ----------------------------------------------------------------------------
//!
//! Group:  Web
//!
//! Filter: Aws Instance
//!         WHERE tag Role = 'web'
//!         AND Region != 'us-east-1'
//!         OR (tag Role = 'frontend'
//!             AND tag Team = 'edge')
//!
//! Done
//! ```

use serde::Serialize;
use tracing::debug;

use crate::filter::FilterIndex;
use crate::index::ConstantIndex;
use crate::merge::MergeIndex;
use crate::model::{CategorizeRule, Clause, Document, Operator, Rule, StaticGroup};

/// Default width of the `-----` separator between group sections.
pub const DEFAULT_SEPARATOR_WIDTH: usize = 76;

const INDENT: &str = "        ";
const NESTED_INDENT: &str = "            ";
const OTHER_GROUP_NOTE: &str = "Note: Catches all assets not matched by other groups";
const EMPTY_GROUP_MARKER: &str = "EMPTY GROUP";
const DONE: &str = "Done";

/// Presentation knobs for a render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub separator_width: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            separator_width: DEFAULT_SEPARATOR_WIDTH,
        }
    }
}

/// Counters describing what a render produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportStats {
    pub group_blocks: usize,
    pub dynamic_groups: usize,
    pub suppressed_groups: usize,
    pub static_groups: usize,
    pub empty_static_groups: usize,
    pub forwarded_rules: usize,
    pub skipped_records: usize,
}

/// The rendered text plus its counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub text: String,
    pub stats: ReportStats,
}

/// Render a document into its report. Never fails: malformed records are
/// skipped and everything else is rendered best-effort.
pub fn render(document: &Document, options: &RenderOptions) -> Report {
    let constants = ConstantIndex::build(&document.constants);
    let merges = MergeIndex::build(&document.merges);
    let filters = FilterIndex::build(&document.rules);

    Renderer::new(&constants, &merges, &filters, options).render(document)
}

/// Walks the rules and static groups against prebuilt indexes.
pub struct Renderer<'a> {
    constants: &'a ConstantIndex,
    merges: &'a MergeIndex,
    filters: &'a FilterIndex,
    options: &'a RenderOptions,
}

impl<'a> Renderer<'a> {
    pub fn new(
        constants: &'a ConstantIndex,
        merges: &'a MergeIndex,
        filters: &'a FilterIndex,
        options: &'a RenderOptions,
    ) -> Self {
        Self {
            constants,
            merges,
            filters,
            options,
        }
    }

    pub fn render(&self, document: &Document) -> Report {
        let mut out = Vec::new();
        let mut stats = ReportStats {
            forwarded_rules: self.filters.forwarded_count(),
            skipped_records: self.constants.issues.len(),
            ..ReportStats::default()
        };

        let name = document.name.as_deref().unwrap_or("Unknown");
        out.push(format!("Perspective: {name}"));
        out.push(String::new());

        for entry in &document.rules {
            if let Rule::Categorize(rule) = Rule::from_json(entry) {
                self.render_block(&rule, &mut out, &mut stats);
            }
        }

        if !self.constants.static_groups.is_empty() {
            out.push("Static Groups:".into());
            out.push(String::new());
            for group in self.constants.static_groups.values() {
                self.render_static_group(group, &mut out, &mut stats);
            }
        }

        out.push(DONE.into());

        debug!(?stats, "Rendered report");
        Report {
            text: out.join("\n"),
            stats,
        }
    }

    fn render_block(&self, rule: &CategorizeRule, out: &mut Vec<String>, stats: &mut ReportStats) {
        stats.group_blocks += 1;
        let asset = readable_asset(&rule.asset_type);
        let tag = &rule.tag_field;

        out.push(format!("Group Block: {}", rule.name));
        out.push(String::new());

        for group in self.constants.groups_in_block(rule.ref_id.as_ref()) {
            if self.merges.is_suppressed(&group.ref_id) {
                stats.suppressed_groups += 1;
                continue;
            }
            stats.dynamic_groups += 1;

            self.section_header(&group.name, out);
            out.push(String::new());
            out.push(format!("Filter: {asset}"));
            out.push(format!("{INDENT}WHERE tag {tag} = '{}'", group.value));

            for source in self.merges.sources_of(&group.ref_id) {
                // Sources missing from the index contribute nothing.
                if let Some(merged) = self.constants.dynamic_groups.get(source) {
                    out.push(format!("{INDENT}OR tag {tag} = '{}'", merged.value));
                }
            }
            out.push(String::new());
        }
    }

    fn render_static_group(
        &self,
        group: &StaticGroup,
        out: &mut Vec<String>,
        stats: &mut ReportStats,
    ) {
        stats.static_groups += 1;
        self.section_header(&group.name, out);

        if group.is_other {
            out.push(String::new());
            out.push(OTHER_GROUP_NOTE.into());
            out.push(String::new());
            return;
        }

        let by_asset = self.filters.by_asset(&group.ref_id);
        if by_asset.is_empty() {
            stats.empty_static_groups += 1;
            out.push(String::new());
            out.push(format!("{INDENT}{EMPTY_GROUP_MARKER}"));
        } else {
            for (asset, rules) in &by_asset {
                out.push(String::new());
                out.push(format!("Filter: {}", readable_asset(asset)));
                FilterExpr::from_rules(rules).write_lines(out);
            }
        }
        out.push(String::new());
    }

    fn section_header(&self, name: &str, out: &mut Vec<String>) {
        out.push("-".repeat(self.options.separator_width));
        out.push(String::new());
        out.push(format!("Group:  {name}"));
    }
}

/// The boolean shape of one asset type's filter rules.
///
/// Nesting is exactly two levels: an AND-chain, or an AND-chain OR-ed with
/// further AND-chains. Deeper grouping is not representable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpr<'a> {
    /// A single rule: `WHERE a AND b ...`.
    AllOf(&'a [Clause]),
    /// The first rule's chain OR-ed with each later rule's chain.
    AnyOf {
        first: &'a [Clause],
        alternatives: Vec<&'a [Clause]>,
    },
}

impl<'a> FilterExpr<'a> {
    pub fn from_rules(rules: &[&'a [Clause]]) -> Self {
        match rules {
            [] => Self::AllOf(&[]),
            [only] => Self::AllOf(*only),
            [first, rest @ ..] => Self::AnyOf {
                first: *first,
                alternatives: rest.to_vec(),
            },
        }
    }

    /// Append the expression's lines. Empty rules are skipped but keep their
    /// position, so an empty first rule leaves later rules as `OR` branches.
    pub fn write_lines(&self, out: &mut Vec<String>) {
        match self {
            Self::AllOf(chain) => write_and_chain(chain, out),
            Self::AnyOf {
                first,
                alternatives,
            } => {
                write_and_chain(first, out);
                for chain in alternatives {
                    write_or_branch(chain, out);
                }
            }
        }
    }
}

fn write_and_chain(chain: &[Clause], out: &mut Vec<String>) {
    for (i, clause) in chain.iter().enumerate() {
        let keyword = if i == 0 { "WHERE" } else { "AND" };
        out.push(format!("{INDENT}{keyword} {}", format_clause(clause)));
    }
}

fn write_or_branch(chain: &[Clause], out: &mut Vec<String>) {
    match chain {
        [] => {}
        [single] => out.push(format!("{INDENT}OR {}", format_clause(single))),
        [head, middle @ .., last] => {
            out.push(format!("{INDENT}OR ({}", format_clause(head)));
            for clause in middle {
                out.push(format!("{NESTED_INDENT}AND {}", format_clause(clause)));
            }
            out.push(format!("{NESTED_INDENT}AND {})", format_clause(last)));
        }
    }
}

/// Format one clause as an SQL-like comparison.
pub fn format_clause(clause: &Clause) -> String {
    let prefix = clause.field.prefix();
    let field = clause.field.name();
    let value = &clause.value;

    match &clause.operator {
        Operator::Eq => format!("{prefix}{field} = '{value}'"),
        Operator::NotEq => format!("{prefix}{field} != '{value}'"),
        Operator::Contains => format!("{prefix}{field} CONTAINS '{value}'"),
        Operator::DoesNotContain => format!("{prefix}{field} DOES NOT CONTAIN '{value}'"),
        Operator::IsNull => format!("{prefix}{field} IS NULL"),
        Operator::IsNotNull => format!("{prefix}{field} IS NOT NULL"),
        Operator::Other(op) => format!("{prefix}{field} {op} '{value}'"),
    }
}

/// `"AwsAccount"` → `"Aws Account"`: a space before every uppercase ASCII
/// letter except the first character.
pub fn readable_asset(asset: &str) -> String {
    let mut readable = String::with_capacity(asset.len() + 4);
    for (i, c) in asset.chars().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            readable.push(' ');
        }
        readable.push(c);
    }
    readable
}
