//! Static per-version feature matrix.

use indexmap::IndexMap;

/// Well-known feature names.
pub mod feature {
    /// Create/read/update/delete endpoints.
    pub const BASIC_CRUD: &str = "basic_crud";
    /// Paginated list responses.
    pub const PAGINATION: &str = "pagination";
    /// Query-string filtering.
    pub const FILTERING: &str = "filtering";
    /// Bulk create/update/delete.
    pub const BULK_OPERATIONS: &str = "bulk_operations";
    /// Outbound webhooks.
    pub const WEBHOOKS: &str = "webhooks";
    /// Sparse field selection.
    pub const FIELD_SELECTION: &str = "field_selection";
}

/// Maps version tags to the features they expose.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureMatrix {
    versions: IndexMap<String, Vec<String>>,
}

impl FeatureMatrix {
    /// Creates an empty matrix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock matrix: `v1` has the basics, `v2` adds bulk operations,
    /// webhooks and field selection.
    #[must_use]
    pub fn standard() -> Self {
        let v1 = [feature::BASIC_CRUD, feature::PAGINATION, feature::FILTERING];
        let v2 = v1
            .iter()
            .chain(&[
                feature::BULK_OPERATIONS,
                feature::WEBHOOKS,
                feature::FIELD_SELECTION,
            ])
            .copied()
            .collect::<Vec<_>>();

        Self::new().with_version("v1", v1).with_version("v2", v2)
    }

    /// Sets the feature list for a version, replacing any previous list.
    #[must_use]
    pub fn with_version<I, S>(mut self, version: impl Into<String>, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.versions.insert(
            version.into(),
            features.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Returns `true` if `version` exposes `feature`. Unknown versions expose nothing.
    #[must_use]
    pub fn supports(&self, version: &str, feature: &str) -> bool {
        self.versions
            .get(version)
            .is_some_and(|features| features.iter().any(|f| f == feature))
    }

    /// Returns the features of a version.
    #[must_use]
    pub fn features(&self, version: &str) -> &[String] {
        self.versions.get(version).map_or(&[], Vec::as_slice)
    }
}
