//! # Perspective Core
//!
//! Turns a cost-allocation perspective schema (constants, rules, merges) into
//! a deterministic, SQL-like text report. This crate does no I/O: callers hand
//! it a parsed [`Document`] and receive a [`Report`].
//!
//! ## Pipeline
//!
//! - [`ConstantIndex`] — group blocks, dynamic groups and static groups by ref id
//! - [`MergeIndex`] — merge targets → OR-ed sources, plus the suppressed set
//! - [`FilterIndex`] — non-forwarded filter rules per target group
//! - [`Renderer`] — walks categorize rules and static groups against the three
//!
//! The three indexes are independent; rendering needs all of them.

pub mod error;
pub mod filter;
pub mod index;
pub mod merge;
pub mod model;
pub mod render;

// Re-export key types at crate root for ergonomics
pub use error::{DocumentError, Error, RecordIssue, Result};
pub use filter::{FilterIndex, FilterRecord};
pub use index::ConstantIndex;
pub use merge::MergeIndex;
pub use model::{
    CategorizeRule, Clause, ConstantKind, Document, DynamicGroup, FieldRef, FilterRule,
    GroupBlock, Merge, MergeEdge, Operator, RefId, Rule, StaticGroup,
};
pub use render::{
    DEFAULT_SEPARATOR_WIDTH, FilterExpr, RenderOptions, Renderer, Report, ReportStats,
    format_clause, readable_asset, render,
};
