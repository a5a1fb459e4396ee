//! Chart instances owned by one dashboard.
//!
//! Every render cycle replaces the whole set. Nothing survives from the
//! previous cycle, so a chart whose data disappeared is gone rather than
//! left drawing stale numbers into its canvas.

use std::collections::BTreeMap;

use super::ChartSpec;

#[derive(Debug, Default)]
pub struct ChartRegistry {
    charts: BTreeMap<String, ChartSpec>,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Destroy every existing chart and install `specs`.
    ///
    /// Returns how many charts were destroyed. A later chart for the same
    /// mount replaces an earlier one.
    pub fn replace_all(&mut self, specs: impl IntoIterator<Item = ChartSpec>) -> usize {
        let destroyed = self.clear();
        for spec in specs {
            self.charts.insert(spec.mount.clone(), spec);
        }
        destroyed
    }

    /// Destroy every chart, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let n = self.charts.len();
        self.charts.clear();
        n
    }

    pub fn get(&self, mount: &str) -> Option<&ChartSpec> {
        self.charts.get(mount)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChartSpec> {
        self.charts.values()
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{ChartKind, ChartRenderer};
    use crate::payload::Series;

    fn spec(mount: &str) -> ChartSpec {
        ChartRenderer::new([mount])
            .render_into(mount, ChartKind::BarGrouped, &Series::default())
            .unwrap()
    }

    #[test]
    fn replace_all_drops_previous_charts() {
        let mut registry = ChartRegistry::new();
        assert_eq!(registry.replace_all([spec("tierChart"), spec("osChart")]), 0);
        assert_eq!(registry.len(), 2);

        assert_eq!(registry.replace_all([spec("locationChart")]), 2);
        assert_eq!(registry.len(), 1);
        assert!(registry.get("tierChart").is_none());
        assert!(registry.get("locationChart").is_some());
    }

    #[test]
    fn clear_empties_the_registry() {
        let mut registry = ChartRegistry::new();
        registry.replace_all([spec("tierChart")]);
        assert_eq!(registry.clear(), 1);
        assert!(registry.is_empty());
    }
}
