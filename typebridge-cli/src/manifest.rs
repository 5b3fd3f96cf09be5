//! Universe manifests.
//!
//! A manifest is a JSON document describing the source types, their
//! markers and the structural data types they map to. It is turned into a
//! [`StaticUniverse`] and a [`StructuralCatalog`] for plan building.
//!
//! ```json
//! {
//!   "data_types": [
//!     { "name": "user", "kind": "record", "fields": [{ "name": "id", "type": "string" }] }
//!   ],
//!   "types": [
//!     { "namespace": "app", "name": "User", "data_type": "user",
//!       "artifact": { "folder": "models" } }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use typebridge::{
    ArtifactAttribute, AttributeError, AttributeSpec, DataShape, DataType, EnsureTypes, FileCase,
    FileNameCase, GlobalGeneratorFactory, Marker, SkipGeneration, SourceType, StaticUniverse,
    StructuralCatalog,
};

use crate::error::{CliResult, ManifestError};

/// Shapes every manifest can refer to without defining them.
const PRIMITIVES: [&str; 4] = ["string", "int", "float", "bool"];

/// Root of a manifest document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub data_types: Vec<DataTypeSpec>,

    #[serde(default)]
    pub types: Vec<TypeSpec>,
}

/// A structural data type definition.
#[derive(Debug, Clone, Deserialize)]
pub struct DataTypeSpec {
    pub name: String,

    #[serde(flatten)]
    pub shape: DataShape,

    /// Whether the shape belongs to the exchangeable universe.
    #[serde(default = "default_true")]
    pub exchangeable: bool,
}

/// A source type and its markers.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeSpec {
    #[serde(default)]
    pub namespace: String,

    pub name: String,

    /// Data type this source type maps to.
    #[serde(default)]
    pub data_type: Option<DataType>,

    /// Code-declared placement attribute.
    #[serde(default)]
    pub artifact: Option<ArtifactSpec>,

    #[serde(default)]
    pub generators: Vec<GeneratorSpec>,

    #[serde(default)]
    pub global_generators: Vec<GlobalGeneratorSpec>,

    /// Free-form markers with no meaning for planning.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl TypeSpec {
    /// The declared source type.
    pub fn source(&self) -> SourceType {
        SourceType::new(self.namespace.clone(), self.name.clone())
    }
}

/// A code-declared artifact attribute. Alias targets are qualified names.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactSpec {
    pub folder: Option<String>,
    pub file_name: Option<String>,
    pub type_name: Option<String>,
    pub same_folder_as: Option<String>,
    pub same_file_as: Option<String>,
}

impl ArtifactSpec {
    /// Validate the field combination.
    pub fn to_attribute(&self) -> Result<ArtifactAttribute, AttributeError> {
        ArtifactAttribute::new(AttributeSpec {
            folder: self.folder.clone(),
            file_name: self.file_name.clone(),
            type_name: self.type_name.clone(),
            same_folder_as: self.same_folder_as.as_deref().map(SourceType::parse),
            same_file_as: self.same_file_as.as_deref().map(SourceType::parse),
        })
    }
}

/// Built-in per-type generators.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratorSpec {
    SkipGeneration,
}

/// Built-in global generator factories.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GlobalGeneratorSpec {
    FileNameCase {
        case: FileCase,
    },
    EnsureTypes {
        types: Vec<String>,
        #[serde(default)]
        must_be_data_type: bool,
        #[serde(default)]
        folder: Option<String>,
    },
}

/// Inputs for building a generation plan.
#[derive(Debug)]
pub struct ManifestInputs {
    pub universe: StaticUniverse,
    pub catalog: StructuralCatalog,
}

fn default_true() -> bool {
    true
}

impl Manifest {
    /// Load a manifest from disk.
    pub fn load(path: &Path) -> CliResult<Manifest> {
        if !path.exists() {
            return Err(ManifestError::NotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content, path.to_path_buf())
    }

    /// Parse manifest content read from `path`.
    pub fn parse(content: &str, path: PathBuf) -> CliResult<Manifest> {
        let manifest: Manifest = serde_json::from_str(content)
            .map_err(|e| ManifestError::invalid_json(path, e.to_string()))?;
        Ok(manifest)
    }

    /// Check references and artifacts, then build the universe and catalog.
    ///
    /// Every offense is collected before failing.
    pub fn into_inputs(self) -> CliResult<ManifestInputs> {
        let artifacts = self.validate()?;

        let mut catalog = StructuralCatalog::with_primitives();
        for spec in &self.data_types {
            catalog.define(spec.name.clone(), spec.shape.clone(), spec.exchangeable);
        }

        let mut universe = StaticUniverse::builder();
        for (spec, artifact) in self.types.iter().zip(artifacts) {
            let source = spec.source();
            if let Some(data_type) = &spec.data_type {
                catalog.bind(source.clone(), data_type.clone());
            }

            let markers = markers_of(spec, artifact);
            debug!(type_name = %source, markers = markers.len(), "declared type");
            universe = universe.declare(source, |mut ty| {
                for marker in markers {
                    ty = ty.marker(marker);
                }
                ty
            });
        }

        Ok(ManifestInputs {
            universe: universe.build(),
            catalog,
        })
    }

    /// Returns the validated artifact attribute of every type, in order.
    fn validate(&self) -> Result<Vec<Option<ArtifactAttribute>>, ManifestError> {
        let mut errors = Vec::new();
        let mut defined: HashSet<&str> = PRIMITIVES.into_iter().collect();

        for spec in &self.data_types {
            if !defined.insert(spec.name.as_str()) {
                errors.push(ManifestError::DuplicateDataType {
                    name: spec.name.clone(),
                });
            }
        }

        for spec in &self.data_types {
            for reference in spec.shape.references() {
                if !defined.contains(reference.name()) {
                    errors.push(ManifestError::unknown_data_type(&spec.name, reference.name()));
                }
            }
        }

        let mut artifacts = Vec::with_capacity(self.types.len());
        for spec in &self.types {
            if let Some(data_type) = &spec.data_type {
                if !defined.contains(data_type.name()) {
                    errors.push(ManifestError::unknown_data_type(
                        spec.source().qualified_name(),
                        data_type.name(),
                    ));
                }
            }

            let artifact = match spec.artifact.as_ref().map(ArtifactSpec::to_attribute) {
                Some(Ok(attribute)) => Some(attribute),
                Some(Err(source)) => {
                    errors.push(ManifestError::InvalidArtifact {
                        owner: spec.source().qualified_name(),
                        source,
                    });
                    None
                }
                None => None,
            };
            artifacts.push(artifact);
        }

        if errors.is_empty() {
            Ok(artifacts)
        } else {
            Err(ManifestError::from_errors(errors))
        }
    }
}

fn markers_of(spec: &TypeSpec, artifact: Option<ArtifactAttribute>) -> Vec<Marker> {
    let mut markers: Vec<Marker> = artifact.map(Marker::Artifact).into_iter().collect();

    for generator in &spec.generators {
        match generator {
            GeneratorSpec::SkipGeneration => {
                markers.push(Marker::Generator(Arc::new(SkipGeneration)));
            }
        }
    }

    for factory in &spec.global_generators {
        let factory: Arc<dyn GlobalGeneratorFactory> = match factory {
            GlobalGeneratorSpec::FileNameCase { case } => Arc::new(FileNameCase::new(*case)),
            GlobalGeneratorSpec::EnsureTypes {
                types,
                must_be_data_type,
                folder,
            } => {
                let mut ensure = EnsureTypes::new(types.iter().map(|t| SourceType::parse(t)));
                if *must_be_data_type {
                    ensure = ensure.data_types_only();
                }
                if let Some(folder) = folder {
                    ensure = ensure.in_folder(folder.clone());
                }
                Arc::new(ensure)
            }
        };
        markers.push(Marker::GlobalFactory(factory));
    }

    markers.extend(spec.tags.iter().cloned().map(Marker::Other));
    markers
}
