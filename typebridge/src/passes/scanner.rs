//! Pass 2: scan declared markers and merge them with configured entries.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::attribute::ArtifactAttribute;
use crate::data_type::{DataType, StructuralTypes};
use crate::error::{PassError, SetupError};
use crate::generator::{GlobalGeneratorFactory, TypeGenerator};
use crate::registry::{RegisteredTypeEntry, RegistrationMap};
use crate::types::SourceType;
use crate::universe::{Marker, TypeUniverse};

pub(crate) const PASS_NAME: &str = "attribute scan";

/// Global generator factories discovered during the scan, in discovery order.
pub type DiscoveredFactories = Vec<Arc<dyn GlobalGeneratorFactory>>;

/// Scans every declaration of a universe.
pub struct AttributeScanner<'a> {
    types: &'a dyn StructuralTypes,
}

impl<'a> AttributeScanner<'a> {
    pub fn new(types: &'a dyn StructuralTypes) -> Self {
        Self { types }
    }

    /// Merge code-declared markers into `map` and collect global factories.
    ///
    /// On failure `map` is left untouched.
    pub fn scan(
        &self,
        universe: &dyn TypeUniverse,
        map: &mut RegistrationMap,
    ) -> Result<DiscoveredFactories, PassError> {
        let mut working = map.clone();
        let mut factories = DiscoveredFactories::new();
        let mut errors = Vec::new();
        let mut touched = 0usize;

        for declaration in universe.declarations() {
            let mut artifacts = Vec::new();
            let mut generators: Vec<Arc<dyn TypeGenerator>> = Vec::new();

            for marker in &declaration.markers {
                match marker {
                    Marker::Artifact(attribute) => artifacts.push(attribute),
                    Marker::Generator(generator) => generators.push(Arc::clone(generator)),
                    Marker::GlobalFactory(factory) => factories.push(Arc::clone(factory)),
                    Marker::Other(_) => {}
                }
            }

            if artifacts.len() > 1 {
                let err = SetupError::DuplicateAnnotation {
                    source_type: declaration.source.clone(),
                };
                error!(type_name = %declaration.source, count = artifacts.len(), "{}", err);
                errors.push(err);
                continue;
            }

            if artifacts.is_empty() && generators.is_empty() {
                continue;
            }

            let code_attribute = artifacts.first().copied();
            let entry = self.merge(
                &declaration.source,
                code_attribute,
                generators,
                working.remove(&declaration.source),
            );
            debug!(type_name = %declaration.source, ?entry, "registered from markers");
            working.insert(declaration.source.clone(), entry);
            touched += 1;
        }

        if !errors.is_empty() {
            return Err(PassError::new(PASS_NAME, errors));
        }

        info!(
            scanned = universe.declarations().len(),
            registered = touched,
            global_factories = factories.len(),
            "scanned type markers"
        );
        *map = working;
        Ok(factories)
    }

    fn merge(
        &self,
        source: &SourceType,
        code_attribute: Option<&ArtifactAttribute>,
        generators: Vec<Arc<dyn TypeGenerator>>,
        existing: Option<RegisteredTypeEntry>,
    ) -> RegisteredTypeEntry {
        let existing = existing.unwrap_or_default();
        let configured = existing.attribute.as_ref();

        let attribute = match code_attribute {
            Some(code) => Some(code.apply_override(configured)),
            None => existing.attribute.clone(),
        };

        let data_type = match existing.data_type {
            Some(data_type) => Some(data_type),
            None if configured.is_none() => probe_data_type(self.types, source),
            None => None,
        };

        let mut all_generators = existing.generators;
        all_generators.extend(generators);

        RegisteredTypeEntry {
            attribute,
            generators: all_generators,
            data_type,
        }
    }
}

/// Look up the data type of `source`, demoting results outside the universe.
pub(crate) fn probe_data_type(
    types: &dyn StructuralTypes,
    source: &SourceType,
) -> Option<DataType> {
    let data_type = types.find_by_type(source)?;
    if types.is_exchangeable(&data_type) {
        Some(types.non_nullable(&data_type))
    } else {
        warn!(
            type_name = %source,
            data_type = %data_type,
            "data type is not exchangeable, registering without data type"
        );
        None
    }
}
