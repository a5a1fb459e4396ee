//! Recommendation list rendering.
//!
//! Joins each recommendation with its type definition. Unknown types fall
//! back to a generic definition instead of failing, and an empty list turns
//! into a single "no issues" notice.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::payload::{Definition, Recommendation, Severity};

/// Text of the notice shown when there is nothing to recommend.
pub const NO_ISSUES_NOTICE: &str =
    "Great! No major cost optimization issues detected. Continue monitoring your resources.";

/// A recommendation joined with its definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationCard {
    pub title: String,
    pub description: String,
    pub impact: String,
    pub category: String,
    pub severity: Severity,
    /// Badge text, the backend's `potential_saving` wording.
    pub badge: String,
    pub resource: String,
    pub current_state: String,
    pub suggestion: String,
}

/// Rendered recommendation section body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecommendationList {
    /// No findings: one success notice.
    Clear { notice: String },
    Items { cards: Vec<RecommendationCard> },
}

impl RecommendationList {
    /// Number of recommendations, for the section's counter badge.
    pub fn count(&self) -> usize {
        match self {
            Self::Clear { .. } => 0,
            Self::Items { cards } => cards.len(),
        }
    }

    /// Number of elements the section body contains.
    pub fn element_count(&self) -> usize {
        match self {
            Self::Clear { .. } => 1,
            Self::Items { cards } => cards.len(),
        }
    }
}

/// Build the recommendation section from the payload's list and definitions.
pub fn render(
    recommendations: &[Recommendation],
    definitions: &BTreeMap<String, Definition>,
) -> RecommendationList {
    if recommendations.is_empty() {
        return RecommendationList::Clear {
            notice: NO_ISSUES_NOTICE.to_string(),
        };
    }

    let fallback = Definition::default();
    let cards = recommendations
        .iter()
        .map(|rec| {
            let def = definitions.get(&rec.kind).unwrap_or(&fallback);
            RecommendationCard {
                title: def.title.clone(),
                description: def.description.clone(),
                impact: def.impact.clone(),
                category: def.category.clone(),
                severity: rec.severity(),
                badge: rec.potential_saving.clone(),
                resource: rec.resource.clone(),
                current_state: rec.current_state.clone(),
                suggestion: rec.suggestion.clone(),
            }
        })
        .collect();

    RecommendationList::Items { cards }
}
