//! Pass 4: compute the exchangeable result set from the frozen map.

use tracing::info;

use crate::data_type::{DataType, ExchangeableSet, StructuralTypes};
use crate::registry::RegistrationMap;
use crate::settings::ExchangeSettings;

/// Builds the final set of data types to project.
pub struct ExchangeableSetBuilder<'a> {
    types: &'a dyn StructuralTypes,
    settings: &'a ExchangeSettings,
}

impl<'a> ExchangeableSetBuilder<'a> {
    pub fn new(types: &'a dyn StructuralTypes, settings: &'a ExchangeSettings) -> Self {
        Self { types, settings }
    }

    /// Every registered data type, plus what it structurally references,
    /// minus the unsupported leaf types. Always a subset of the universe.
    pub fn build(&self, map: &RegistrationMap) -> ExchangeableSet {
        let exclude: ExchangeableSet = self
            .settings
            .exclude
            .iter()
            .map(DataType::new)
            .collect();
        let include: Vec<DataType> = map.data_types().cloned().collect();

        let result = if self.settings.enabled {
            ExchangeableSet::empty().include_and_exclude(
                include.iter().cloned(),
                &exclude,
                self.types,
            )
        } else {
            ExchangeableSet::empty()
        };

        info!(
            enabled = self.settings.enabled,
            included = include.len(),
            excluded = exclude.len(),
            result = result.len(),
            universe = self.types.universe().len(),
            "built exchangeable set"
        );
        result
    }
}
