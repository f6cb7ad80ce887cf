//! Column schemas and the empty-block kernel runs that resolve them.
//!
//! The planner attaches a column layout to every frame it emits. Output
//! layouts are what the relational kernel would produce when applied to
//! *empty* blocks carrying the source schemas -- and an empty block is fully
//! characterized by its schema, so those kernel runs reduce to the pure
//! column algebra in this module: suffix resolution for joins and merges,
//! union/intersection for concat.

use crate::task::{Axis, ConcatKind};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An ordered, duplicate-free column list.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    /// Schema over the given columns.
    ///
    /// # Errors
    ///
    /// If a column name appears twice.
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                bail!("schema: duplicate column {column:?}");
            }
        }
        Ok(Self { columns })
    }

    /// Schema with no columns.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Columns present in both schemas, in this schema's order.
    #[must_use]
    pub fn intersection(&self, other: &Schema) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| other.contains(c))
            .cloned()
            .collect()
    }
}

/// Output columns of an index-aligned join.
///
/// Overlapping columns take `lsuffix`/`rsuffix`; left columns come first.
///
/// # Errors
///
/// If columns overlap and both suffixes are empty, or suffixing still
/// collides.
pub fn join_columns(
    left: &Schema,
    right: &Schema,
    lsuffix: &str,
    rsuffix: &str,
) -> Result<Schema> {
    let overlap: HashSet<String> = left.intersection(right).into_iter().collect();
    if !overlap.is_empty() && lsuffix.is_empty() && rsuffix.is_empty() {
        bail!("schema: join columns overlap but no suffixes were given: {overlap:?}");
    }
    let mut columns = Vec::with_capacity(left.len() + right.len());
    for c in left.columns() {
        columns.push(suffixed(c, &overlap, lsuffix));
    }
    for c in right.columns() {
        columns.push(suffixed(c, &overlap, rsuffix));
    }
    Schema::new(columns)
}

/// Output columns of a key merge.
///
/// When both sides join on the same column names, those key columns appear
/// once, unsuffixed, in the left side's position. Every other overlapping
/// column takes a suffix.
///
/// # Errors
///
/// If non-key columns overlap and both suffixes are empty, or suffixing
/// still collides.
#[allow(clippy::too_many_arguments)]
pub fn merge_columns(
    left: &Schema,
    right: &Schema,
    left_on: Option<&[String]>,
    right_on: Option<&[String]>,
    left_index: bool,
    right_index: bool,
    suffixes: (&str, &str),
) -> Result<Schema> {
    // Keys with identical names on both sides coalesce into one column.
    let shared_keys: HashSet<&str> = match (left_on, right_on) {
        (Some(l), Some(r)) if l == r && !left_index && !right_index => {
            l.iter().map(String::as_str).collect()
        }
        _ => HashSet::new(),
    };

    let overlap: HashSet<String> = left
        .intersection(right)
        .into_iter()
        .filter(|c| !shared_keys.contains(c.as_str()))
        .collect();
    if !overlap.is_empty() && suffixes.0.is_empty() && suffixes.1.is_empty() {
        bail!("schema: merge columns overlap but no suffixes were given: {overlap:?}");
    }

    let mut columns = Vec::with_capacity(left.len() + right.len());
    for c in left.columns() {
        columns.push(suffixed(c, &overlap, suffixes.0));
    }
    for c in right.columns() {
        if shared_keys.contains(c.as_str()) {
            continue;
        }
        columns.push(suffixed(c, &overlap, suffixes.1));
    }
    Schema::new(columns)
}

/// Output columns of a concat.
///
/// Along rows, `Outer` unions the inputs in first-seen order and `Inner`
/// intersects them in the first input's order. Along columns, the inputs
/// are laid side by side.
///
/// # Errors
///
/// If `schemas` is empty, or a column-axis concat would produce a duplicate
/// label.
pub fn concat_columns(schemas: &[&Schema], axis: Axis, how: ConcatKind) -> Result<Schema> {
    let Some((first, rest)) = schemas.split_first() else {
        bail!("schema: concat of zero schemas");
    };
    match axis {
        Axis::Columns => Schema::new(
            schemas
                .iter()
                .flat_map(|s| s.columns().iter().cloned())
                .collect::<Vec<_>>(),
        ),
        Axis::Rows => match how {
            ConcatKind::Outer => {
                let mut columns: Vec<String> = first.columns().to_vec();
                for schema in rest {
                    for c in schema.columns() {
                        if !columns.iter().any(|have| have == c) {
                            columns.push(c.clone());
                        }
                    }
                }
                Schema::new(columns)
            }
            ConcatKind::Inner => {
                let columns: Vec<String> = first
                    .columns()
                    .iter()
                    .filter(|c| rest.iter().all(|s| s.contains(c.as_str())))
                    .cloned()
                    .collect();
                Schema::new(columns)
            }
        },
    }
}

fn suffixed(column: &str, overlap: &HashSet<String>, suffix: &str) -> String {
    if overlap.contains(column) {
        format!("{column}{suffix}")
    } else {
        column.to_string()
    }
}
