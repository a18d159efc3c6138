use crate::models::{FacetSelection, FilterSet};

/// Filter picker state: a working copy edited by the user and the committed
/// set that listings query with.
///
/// Edits never touch the committed set until [`FilterComposer::apply`]; the
/// returned set is what the listing re-queries from page 1.
#[derive(Debug, Clone, Default)]
pub struct FilterComposer {
    committed: FilterSet,
    working: FilterSet,
}

impl FilterComposer {
    pub fn new(committed: FilterSet) -> Self {
        Self {
            working: committed.clone(),
            committed,
        }
    }

    pub fn toggle(&mut self, selection: FacetSelection) {
        tracing::debug!(selection = ?selection, "Filter toggled");
        self.working.toggle(selection);
    }

    /// Restores the working copy to the last committed set
    pub fn reset(&mut self) {
        self.working = self.committed.clone();
    }

    /// Picker closed without applying
    pub fn dismiss(&mut self) {
        self.reset();
    }

    /// Commits the working copy and returns the set to query with
    pub fn apply(&mut self) -> FilterSet {
        self.committed = self.working.clone();
        tracing::info!(
            categories = self.committed.categories().len(),
            time_periods = self.committed.time_periods().len(),
            sort = %self.committed.sort().as_param(),
            "Filters applied"
        );
        self.committed.clone()
    }

    pub fn working(&self) -> &FilterSet {
        &self.working
    }

    pub fn committed(&self) -> &FilterSet {
        &self.committed
    }

    /// Whether the picker has unapplied edits
    pub fn is_dirty(&self) -> bool {
        self.working != self.committed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SortOrder, TimePeriod};
    use crate::services::catalog::CatalogRequest;

    #[test]
    fn test_toggle_changes_only_working_copy() {
        let mut composer = FilterComposer::default();
        composer.toggle(FacetSelection::Category("28".to_string()));

        assert_eq!(composer.working().categories(), ["28".to_string()]);
        assert!(composer.committed().categories().is_empty());
        assert!(composer.is_dirty());
    }

    #[test]
    fn test_sort_always_single_value() {
        let mut composer = FilterComposer::default();
        composer.toggle(FacetSelection::Sort(SortOrder::Rating));
        composer.toggle(FacetSelection::Sort(SortOrder::Rating));
        assert_eq!(composer.working().sort(), SortOrder::Rating);

        composer.toggle(FacetSelection::Sort(SortOrder::Popularity));
        assert_eq!(composer.working().sort(), SortOrder::Popularity);
    }

    #[test]
    fn test_reset_restores_committed() {
        let committed = FilterSet::new().with_category("35");
        let mut composer = FilterComposer::new(committed.clone());

        composer.toggle(FacetSelection::Category("35".to_string()));
        composer.toggle(FacetSelection::TimePeriod(TimePeriod::new(1990).unwrap()));
        composer.reset();

        assert_eq!(composer.working(), &committed);
        assert!(!composer.is_dirty());
    }

    #[test]
    fn test_dismiss_discards_edits() {
        let mut composer = FilterComposer::default();
        composer.toggle(FacetSelection::Sort(SortOrder::Rating));
        composer.dismiss();
        assert_eq!(composer.working().sort(), SortOrder::Popularity);
    }

    #[test]
    fn test_apply_then_query_uses_committed_filters() {
        let mut composer = FilterComposer::default();
        composer.toggle(FacetSelection::Category("28".to_string()));

        let applied = composer.apply();
        composer.toggle(FacetSelection::Category("12".to_string()));

        let params = CatalogRequest::from_input(None, composer.committed().clone()).query_params(1);
        assert!(params.contains(&("with_genres", "28".to_string())));
        assert_eq!(composer.committed(), &applied);
    }
}
