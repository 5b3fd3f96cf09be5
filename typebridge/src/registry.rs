//! The registration map accumulated by the setup passes.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::attribute::ArtifactAttribute;
use crate::data_type::DataType;
use crate::generator::TypeGenerator;
use crate::types::SourceType;

/// Everything registered for one source type.
#[derive(Clone, Default)]
pub struct RegisteredTypeEntry {
    /// Placement attribute, if any source declared one.
    pub attribute: Option<ArtifactAttribute>,

    /// Generators bound to this type, in declaration order.
    pub generators: Vec<Arc<dyn TypeGenerator>>,

    /// Associated data type, always a member of the exchangeable universe.
    pub data_type: Option<DataType>,
}

impl RegisteredTypeEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the artifact attribute.
    pub fn with_attribute(mut self, attribute: ArtifactAttribute) -> Self {
        self.attribute = Some(attribute);
        self
    }

    /// Set the associated data type.
    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    /// Names of the bound generators.
    pub fn generator_names(&self) -> Vec<String> {
        self.generators.iter().map(|g| g.name().to_string()).collect()
    }
}

impl fmt::Debug for RegisteredTypeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredTypeEntry")
            .field("attribute", &self.attribute)
            .field("generators", &self.generator_names())
            .field("data_type", &self.data_type)
            .finish()
    }
}

/// Source type → registered entry, ordered by source type.
#[derive(Debug, Clone, Default)]
pub struct RegistrationMap {
    entries: BTreeMap<SourceType, RegisteredTypeEntry>,
}

impl RegistrationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry registered for `source`.
    pub fn get(&self, source: &SourceType) -> Option<&RegisteredTypeEntry> {
        self.entries.get(source)
    }

    /// Mutable entry registered for `source`.
    pub fn get_mut(&mut self, source: &SourceType) -> Option<&mut RegisteredTypeEntry> {
        self.entries.get_mut(source)
    }

    /// Whether `source` is registered.
    pub fn contains(&self, source: &SourceType) -> bool {
        self.entries.contains_key(source)
    }

    /// Insert or replace an entry, returning the previous one.
    pub fn insert(
        &mut self,
        source: SourceType,
        entry: RegisteredTypeEntry,
    ) -> Option<RegisteredTypeEntry> {
        self.entries.insert(source, entry)
    }

    /// Remove an entry, returning it.
    pub fn remove(&mut self, source: &SourceType) -> Option<RegisteredTypeEntry> {
        self.entries.remove(source)
    }

    /// Entries in source type order.
    pub fn iter(&self) -> impl Iterator<Item = (&SourceType, &RegisteredTypeEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every data type currently associated with an entry.
    pub fn data_types(&self) -> impl Iterator<Item = &DataType> {
        self.entries.values().filter_map(|e| e.data_type.as_ref())
    }
}
