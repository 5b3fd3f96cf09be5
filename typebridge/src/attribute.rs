//! Artifact attributes: where and under which name a type is generated.
//!
//! An [`ArtifactAttribute`] can only be obtained through the validating
//! factory [`ArtifactAttribute::new`], so every attribute in the system
//! satisfies the placement constraints:
//!
//! - `same_folder_as` excludes `folder`
//! - `same_file_as` excludes `file_name`, `folder` and `same_folder_as`
//! - no field is an empty string

use serde::Serialize;

use crate::error::AttributeError;
use crate::types::SourceType;

/// Raw, unvalidated attribute fields.
///
/// This is the input to [`ArtifactAttribute::new`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSpec {
    /// Output folder.
    pub folder: Option<String>,
    /// Output file name.
    pub file_name: Option<String>,
    /// Exported type name.
    pub type_name: Option<String>,
    /// Place the artifact in the same folder as another type.
    pub same_folder_as: Option<SourceType>,
    /// Place the artifact in the same file as another type.
    pub same_file_as: Option<SourceType>,
}

impl AttributeSpec {
    /// Create an empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the folder.
    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    /// Set the file name.
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Set the exported type name.
    pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Co-locate with another type's folder.
    pub fn same_folder_as(mut self, target: SourceType) -> Self {
        self.same_folder_as = Some(target);
        self
    }

    /// Co-locate with another type's file.
    pub fn same_file_as(mut self, target: SourceType) -> Self {
        self.same_file_as = Some(target);
        self
    }
}

/// Declarative descriptor of a type's output location and exported name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactAttribute {
    #[serde(skip_serializing_if = "Option::is_none")]
    folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    same_folder_as: Option<SourceType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    same_file_as: Option<SourceType>,
}

impl ArtifactAttribute {
    /// Validate a spec and build an attribute from it.
    pub fn new(spec: AttributeSpec) -> Result<Self, AttributeError> {
        for (field, value) in [
            ("folder", &spec.folder),
            ("file_name", &spec.file_name),
            ("type_name", &spec.type_name),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(AttributeError::EmptyField { field });
            }
        }

        if spec.same_folder_as.is_some() && spec.folder.is_some() {
            return Err(AttributeError::Conflict {
                field: "same_folder_as",
                other: "folder",
            });
        }

        if spec.same_file_as.is_some() {
            let conflict = if spec.file_name.is_some() {
                Some("file_name")
            } else if spec.folder.is_some() {
                Some("folder")
            } else if spec.same_folder_as.is_some() {
                Some("same_folder_as")
            } else {
                None
            };
            if let Some(other) = conflict {
                return Err(AttributeError::Conflict {
                    field: "same_file_as",
                    other,
                });
            }
        }

        Ok(Self {
            folder: spec.folder,
            file_name: spec.file_name,
            type_name: spec.type_name,
            same_folder_as: spec.same_folder_as,
            same_file_as: spec.same_file_as,
        })
    }

    /// An attribute with no fields set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Explicit folder, if any.
    pub fn folder(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    /// Explicit file name, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Exported name of the generated type, if overridden.
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Type whose folder this artifact shares.
    pub fn same_folder_as(&self) -> Option<&SourceType> {
        self.same_folder_as.as_ref()
    }

    /// Type whose folder and file this artifact shares.
    pub fn same_file_as(&self) -> Option<&SourceType> {
        self.same_file_as.as_ref()
    }

    /// Alias targets referenced by this attribute.
    pub fn alias_targets(&self) -> impl Iterator<Item = &SourceType> {
        self.same_folder_as.iter().chain(self.same_file_as.iter())
    }

    /// Set the folder, dropping any folder or file alias.
    pub fn set_folder(&mut self, folder: impl Into<String>) -> Result<(), AttributeError> {
        self.folder = Some(non_empty("folder", folder.into())?);
        self.same_folder_as = None;
        self.same_file_as = None;
        Ok(())
    }

    /// Set the file name, dropping any file alias.
    pub fn set_file_name(&mut self, file_name: impl Into<String>) -> Result<(), AttributeError> {
        self.file_name = Some(non_empty("file_name", file_name.into())?);
        self.same_file_as = None;
        Ok(())
    }

    /// Set the exported type name.
    pub fn set_type_name(&mut self, type_name: impl Into<String>) -> Result<(), AttributeError> {
        self.type_name = Some(non_empty("type_name", type_name.into())?);
        Ok(())
    }

    /// Co-locate with another type's folder, dropping the folder and any file alias.
    pub fn set_same_folder_as(&mut self, target: SourceType) {
        self.same_folder_as = Some(target);
        self.folder = None;
        self.same_file_as = None;
    }

    /// Co-locate with another type's file, dropping every other placement field.
    pub fn set_same_file_as(&mut self, target: SourceType) {
        self.same_file_as = Some(target);
        self.folder = None;
        self.file_name = None;
        self.same_folder_as = None;
    }

    /// Merge `overrides` on top of this attribute.
    ///
    /// Every field set in `overrides` wins. When the override sets one side of
    /// an exclusive pair, the other side coming from `self` is dropped, so the
    /// result still satisfies the placement constraints.
    pub fn apply_override(&self, overrides: Option<&ArtifactAttribute>) -> ArtifactAttribute {
        let mut merged = self.clone();
        let Some(overrides) = overrides else {
            return merged;
        };

        if let Some(folder) = &overrides.folder {
            merged.folder = Some(folder.clone());
            merged.same_folder_as = None;
            merged.same_file_as = None;
        }
        if let Some(file_name) = &overrides.file_name {
            merged.file_name = Some(file_name.clone());
            merged.same_file_as = None;
        }
        if let Some(type_name) = &overrides.type_name {
            merged.type_name = Some(type_name.clone());
        }
        if let Some(target) = &overrides.same_folder_as {
            merged.set_same_folder_as(target.clone());
        }
        if let Some(target) = &overrides.same_file_as {
            merged.set_same_file_as(target.clone());
        }
        merged
    }
}

fn non_empty(field: &'static str, value: String) -> Result<String, AttributeError> {
    if value.trim().is_empty() {
        Err(AttributeError::EmptyField { field })
    } else {
        Ok(value)
    }
}
