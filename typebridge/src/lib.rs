//! # typebridge
//!
//! Type registration and resolution for cross-language code generation.
//!
//! `typebridge` decides, for every type of a source type system, where its
//! generated artifact goes, under which exported name, which generators take
//! part, and which structural data types are projected into the target
//! language.
//!
//! ## Overview
//!
//! A [`GenerationPlan`] is built once from three inputs:
//!
//! - a [`TypeUniverse`]: every source type with its [`Marker`]s,
//! - a [`StructuralTypes`] system mapping source types onto [`DataType`]s,
//! - [`PlanSettings`]: configured overrides, family aliases and exchange settings.
//!
//! Building runs four sequential passes:
//!
//! | Pass | Input | Output |
//! |------|-------|--------|
//! | configuration | `[[types]]` overrides | seed registration map |
//! | attribute scan | declared markers | merged map, global factories |
//! | global generator initialization | factories | global generators, extended map |
//! | exchangeable set | frozen map | exchangeable result set |
//!
//! Each pass collects every offense before failing, and nothing is committed
//! by a failed pass.
//!
//! The plan then hands out [`ArtifactResolver`]s that resolve
//! [`ArtifactDescriptor`]s lazily, once per type, with alias cycle detection
//! and poisoning of failed types.
//!
//! ## Quick Start
//!
//! ```rust
//! use typebridge::{
//!     ArtifactAttribute, AttributeSpec, DataShape, DataType, GenerationPlan, PlanSettings,
//!     SourceType, StaticUniverse, StructuralCatalog, TypeOverride,
//! };
//!
//! let user = SourceType::new("app", "User");
//!
//! let mut catalog = StructuralCatalog::with_primitives();
//! catalog
//!     .define("user", DataShape::Record { fields: vec![] }, true)
//!     .bind(user.clone(), DataType::new("user"));
//!
//! let universe = StaticUniverse::builder()
//!     .declare(user.clone(), |ty| {
//!         ty.artifact(ArtifactAttribute::new(AttributeSpec::new().folder("models")).unwrap())
//!     })
//!     .build();
//!
//! let settings = PlanSettings {
//!     types: vec![TypeOverride::new("app.User").type_name("Account")],
//!     ..Default::default()
//! };
//!
//! let plan = GenerationPlan::build(&universe, &catalog, &settings).unwrap();
//! let descriptor = plan.resolver().resolve(&user).unwrap();
//!
//! assert_eq!(descriptor.path(), "models/User");
//! assert_eq!(descriptor.location.type_name, "Account");
//! assert!(plan.exchangeable().contains(&DataType::new("user")));
//! ```
//!
//! ## Placement Rules
//!
//! | Field | Default | Excludes |
//! |-------|---------|----------|
//! | `folder` | namespace as path, then type name (`ns/E`) | `same_folder_as`, `same_file_as` |
//! | `file_name` | type name | `same_file_as` |
//! | `type_name` | type name | |
//! | `same_folder_as` | | `folder`, `same_file_as` |
//! | `same_file_as` | | `folder`, `file_name`, `same_folder_as` |
//!
//! Configured values always win over code-declared values, field by field.
//!
//! ## Built-in Generators
//!
//! - [`SkipGeneration`]: cancels generation of its type.
//! - [`FileNameCase`]: rewrites derived file names into a case convention.
//! - [`EnsureTypes`]: registers a list of types on demand.

pub mod attribute;
pub mod builtin;
pub mod data_type;
pub mod descriptor;
pub mod error;
pub mod generator;
pub mod passes;
pub mod plan;
pub mod registry;
pub mod resolution;
pub mod settings;
pub mod types;
pub mod universe;

pub use attribute::{ArtifactAttribute, AttributeSpec};
pub use builtin::{EnsureTypes, FileCase, FileNameCase, SkipGeneration};
pub use data_type::{
    DataShape, DataType, ExchangeableSet, FieldShape, StructuralCatalog, StructuralTypes,
};
pub use descriptor::{ArtifactDescriptor, ArtifactImport, ArtifactLocation, DescriptorBuilder};
pub use error::{AttributeError, GeneratorError, PassError, PlanError, ResolveError, SetupError};
pub use generator::{GeneratorResult, GlobalGenerator, GlobalGeneratorFactory, TypeGenerator};
pub use passes::Registrar;
pub use plan::GenerationPlan;
pub use registry::{RegisteredTypeEntry, RegistrationMap};
pub use resolution::{ArtifactResolver, GenerationContext, ResolutionReport};
pub use settings::{ExchangeSettings, PlanSettings, TypeOverride};
pub use types::SourceType;
pub use universe::{
    Marker, NameResolver, StaticUniverse, TypeDeclaration, TypeResolver, TypeUniverse,
};
