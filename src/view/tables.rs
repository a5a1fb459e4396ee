//! Table and density-card content.
//!
//! Rows are shaped from each row's own keys: a tier row that carries
//! `Plans` and `Instances` gets the full columns, one without them gets a
//! single "N apps" cell under the `Apps` column. Missing values render as `Unknown` or `0`.

use serde::Serialize;

use crate::payload::{DensityMetric, GroupRow, Scalar, TierStatRow, format_count};

/// Largest number of rows the grouping table shows.
pub const GROUP_TABLE_LIMIT: usize = 10;

/// Text of the placeholder row for an empty tier table.
pub const NO_TIER_STATS: &str = "No tier statistics available";

/// One table cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub text: String,
    #[serde(skip_serializing_if = "is_one")]
    pub colspan: u8,
    pub numeric: bool,
    /// Bold leading cell.
    pub strong: bool,
    /// Muted, centered placeholder text.
    pub muted: bool,
}

fn is_one(n: &u8) -> bool {
    *n == 1
}

impl Cell {
    fn label(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            colspan: 1,
            numeric: false,
            strong: true,
            muted: false,
        }
    }

    fn text(text: impl Into<String>) -> Self {
        Self {
            strong: false,
            ..Self::label(text)
        }
    }

    fn number(value: Option<f64>) -> Self {
        Self {
            numeric: true,
            strong: false,
            ..Self::label(format_count(value.unwrap_or(0.0)))
        }
    }

    fn placeholder(text: &str, colspan: u8) -> Self {
        Self {
            colspan,
            strong: false,
            muted: true,
            ..Self::label(text)
        }
    }
}

/// A table row.
pub type Row = Vec<Cell>;

fn tier_label(tier: &Option<Scalar>) -> String {
    match tier {
        Some(Scalar::Text(s)) if s.is_empty() => "Unknown".to_string(),
        Some(t) => t.to_string(),
        None => "Unknown".to_string(),
    }
}

/// Rows for the per-tier statistics table.
pub fn tier_rows(rows: &[TierStatRow]) -> Vec<Row> {
    if rows.is_empty() {
        return vec![vec![Cell::placeholder(NO_TIER_STATS, 5)]];
    }

    rows.iter()
        .map(|row| {
            let tier = Cell::label(tier_label(&row.tier));
            if row.has_plan_columns() {
                let mut cells = vec![tier];
                if row.os.is_some() {
                    let os = row.os.as_deref().filter(|s| !s.is_empty()).unwrap_or("Unknown");
                    cells.push(Cell::text(os));
                }
                cells.push(Cell::number(row.plans));
                cells.push(Cell::number(row.apps));
                cells.push(Cell::number(row.instances));
                cells
            } else {
                let apps = format_count(row.apps.unwrap_or(0.0));
                vec![
                    tier,
                    Cell {
                        numeric: true,
                        ..Cell::text(format!("{apps} apps"))
                    },
                ]
            }
        })
        .collect()
}

/// Rows for the grouping table, at most [`GROUP_TABLE_LIMIT`].
///
/// The first row decides the shape: a `Subscription` key means the
/// subscription layout (name, apps), otherwise the resource group layout.
pub fn group_rows(rows: &[GroupRow]) -> Vec<Row> {
    let by_subscription = rows.first().is_some_and(|r| r.subscription.is_some());

    rows.iter()
        .take(GROUP_TABLE_LIMIT)
        .map(|row| {
            if by_subscription {
                vec![
                    Cell::label(row.subscription.as_deref().unwrap_or("Unknown")),
                    Cell::number(row.apps),
                ]
            } else {
                vec![
                    Cell::label(row.resource_group_name()),
                    Cell::number(row.plans),
                    Cell::number(row.apps),
                    Cell::number(row.instances),
                ]
            }
        })
        .collect()
}

/// One card of the density section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityCard {
    pub plan_name: String,
    pub tier: String,
    pub apps: String,
    pub instances: String,
    pub density: String,
    pub status: String,
    /// Bootstrap contextual color; anything unrecognized becomes `secondary`.
    pub color: String,
}

const DENSITY_COLORS: [&str; 6] = ["danger", "warning", "info", "success", "primary", "secondary"];

pub fn density_cards(metrics: &[DensityMetric]) -> Vec<DensityCard> {
    metrics
        .iter()
        .map(|m| DensityCard {
            plan_name: m.plan_name.clone(),
            tier: m.tier.clone(),
            apps: format_count(m.apps),
            instances: format_count(m.instances),
            density: format_count(m.density),
            status: m.status.clone(),
            color: if DENSITY_COLORS.contains(&m.color.as_str()) {
                m.color.clone()
            } else {
                "secondary".to_string()
            },
        })
        .collect()
}
