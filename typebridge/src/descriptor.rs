//! Artifact descriptors: the resolved output of the plan for one type.

use serde::Serialize;

use crate::attribute::ArtifactAttribute;
use crate::data_type::DataType;
use crate::error::AttributeError;
use crate::types::{strip_generics, SourceType};

/// Where a type's artifact goes and under which name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactLocation {
    pub source: SourceType,
    pub folder: String,
    pub file_name: String,
    pub type_name: String,
    /// False when a generator cancelled generation of the type.
    pub generate: bool,
    /// Generators that took part in the resolution, in invocation order.
    pub generators: Vec<String>,
}

impl ArtifactLocation {
    /// `folder/file_name`.
    pub fn path(&self) -> String {
        if self.folder.is_empty() {
            self.file_name.clone()
        } else {
            format!("{}/{}", self.folder, self.file_name)
        }
    }

    /// Whether both locations share one output file.
    pub fn same_file(&self, other: &ArtifactLocation) -> bool {
        self.folder == other.folder && self.file_name == other.file_name
    }
}

/// A reference from one artifact to a type generated elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ArtifactImport {
    pub source: SourceType,
    pub folder: String,
    pub file_name: String,
    pub type_name: String,
}

/// Final plan for one source type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDescriptor {
    #[serde(flatten)]
    pub location: ArtifactLocation,

    /// Projected data type, present only when it is in the exchangeable result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,

    /// Other artifacts this one refers to.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<ArtifactImport>,
}

impl ArtifactDescriptor {
    pub fn source(&self) -> &SourceType {
        &self.location.source
    }

    pub fn path(&self) -> String {
        self.location.path()
    }
}

/// Mutable descriptor state handed to generators during resolution.
///
/// Placement setters keep the attribute constraints by dropping whatever a
/// new value conflicts with. Cancelling generation cannot be undone.
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    source: SourceType,
    attribute: ArtifactAttribute,
    cancelled: bool,
}

impl DescriptorBuilder {
    /// Seed a builder from the registered attribute, if any.
    pub fn seed(source: SourceType, attribute: Option<&ArtifactAttribute>) -> Self {
        Self {
            source,
            attribute: attribute.cloned().unwrap_or_default(),
            cancelled: false,
        }
    }

    pub fn source(&self) -> &SourceType {
        &self.source
    }

    /// Current placement attribute.
    pub fn attribute(&self) -> &ArtifactAttribute {
        &self.attribute
    }

    /// Explicit folder, or the derived default.
    pub fn folder(&self) -> String {
        self.attribute
            .folder()
            .map(str::to_string)
            .unwrap_or_else(|| self.source.default_folder())
    }

    /// Explicit file name, or the derived default.
    pub fn file_name(&self) -> String {
        self.attribute
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| self.source.default_file_name())
    }

    /// Explicit exported name, or the type name.
    pub fn type_name(&self) -> String {
        self.attribute
            .type_name()
            .map(str::to_string)
            .unwrap_or_else(|| strip_generics(self.source.name()).to_string())
    }

    /// Set the folder, dropping any alias.
    pub fn set_folder(&mut self, folder: impl Into<String>) -> Result<&mut Self, AttributeError> {
        self.attribute.set_folder(folder)?;
        Ok(self)
    }

    /// Set the file name, dropping any file alias.
    pub fn set_file_name(
        &mut self,
        file_name: impl Into<String>,
    ) -> Result<&mut Self, AttributeError> {
        self.attribute.set_file_name(file_name)?;
        Ok(self)
    }

    /// Set the exported type name.
    pub fn set_type_name(
        &mut self,
        type_name: impl Into<String>,
    ) -> Result<&mut Self, AttributeError> {
        self.attribute.set_type_name(type_name)?;
        Ok(self)
    }

    /// Share `target`'s folder.
    pub fn set_same_folder_as(&mut self, target: SourceType) -> &mut Self {
        self.attribute.set_same_folder_as(target);
        self
    }

    /// Share `target`'s folder and file.
    pub fn set_same_file_as(&mut self, target: SourceType) -> &mut Self {
        self.attribute.set_same_file_as(target);
        self
    }

    /// Stop the type from being generated.
    pub fn cancel_generation(&mut self) -> &mut Self {
        self.cancelled = true;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}
