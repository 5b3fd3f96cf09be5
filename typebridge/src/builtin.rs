//! Built-in generators.

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attribute::ArtifactAttribute;
use crate::generator::{GeneratorResult, GlobalGenerator, GlobalGeneratorFactory, TypeGenerator};
use crate::passes::{AttributeMutator, Registrar};
use crate::resolution::GenerationContext;
use crate::types::SourceType;

/// Cancels generation of the type it is bound to.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipGeneration;

impl TypeGenerator for SkipGeneration {
    fn name(&self) -> &str {
        "skip_generation"
    }

    fn generate(&self, ctx: &mut GenerationContext<'_, '_>) -> GeneratorResult {
        ctx.descriptor().cancel_generation();
        Ok(())
    }
}

/// Case convention for file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileCase {
    /// camelCase
    #[serde(rename = "camelCase")]
    Camel,

    /// snake_case
    #[serde(rename = "snake_case")]
    Snake,

    /// PascalCase
    #[serde(rename = "PascalCase")]
    Pascal,

    /// SCREAMING_SNAKE_CASE
    #[serde(rename = "SCREAMING_SNAKE_CASE")]
    ScreamingSnake,

    /// kebab-case
    #[serde(rename = "kebab-case")]
    Kebab,
}

impl FileCase {
    pub fn apply(&self, name: &str) -> String {
        match self {
            FileCase::Camel => name.to_case(Case::Camel),
            FileCase::Snake => name.to_case(Case::Snake),
            FileCase::Pascal => name.to_case(Case::Pascal),
            FileCase::ScreamingSnake => name.to_case(Case::UpperSnake),
            FileCase::Kebab => name.to_case(Case::Kebab),
        }
    }
}

/// Global generator rewriting derived file names into a case convention.
///
/// Explicit file names and file aliases are left alone.
#[derive(Debug, Clone, Copy)]
pub struct FileNameCase {
    case: FileCase,
}

impl FileNameCase {
    pub fn new(case: FileCase) -> Self {
        Self { case }
    }
}

impl GlobalGeneratorFactory for FileNameCase {
    fn name(&self) -> &str {
        "file_name_case"
    }

    fn create(&self, _registrar: &mut Registrar<'_>) -> GeneratorResult<Box<dyn GlobalGenerator>> {
        Ok(Box::new(*self))
    }
}

impl GlobalGenerator for FileNameCase {
    fn name(&self) -> &str {
        "file_name_case"
    }

    fn generate(&self, ctx: &mut GenerationContext<'_, '_>) -> GeneratorResult {
        let descriptor = ctx.descriptor();
        let attribute = descriptor.attribute();
        if attribute.file_name().is_some() || attribute.same_file_as().is_some() {
            return Ok(());
        }
        let renamed = self.case.apply(&descriptor.file_name());
        descriptor.set_file_name(renamed)?;
        Ok(())
    }
}

/// Global generator factory that makes sure a list of types is registered.
#[derive(Debug, Clone, Default)]
pub struct EnsureTypes {
    types: Vec<SourceType>,
    must_be_data_type: bool,
    folder: Option<String>,
}

impl EnsureTypes {
    pub fn new(types: impl IntoIterator<Item = SourceType>) -> Self {
        Self {
            types: types.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Require every type to map to an exchangeable data type.
    pub fn data_types_only(mut self) -> Self {
        self.must_be_data_type = true;
        self
    }

    /// Pin every ensured type into `folder`.
    pub fn in_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }
}

impl GlobalGeneratorFactory for EnsureTypes {
    fn name(&self) -> &str {
        "ensure_types"
    }

    fn create(&self, registrar: &mut Registrar<'_>) -> GeneratorResult<Box<dyn GlobalGenerator>> {
        let folder = self.folder.clone().unwrap_or_default();
        let pin = |attribute: &mut ArtifactAttribute| attribute.set_folder(folder.clone());
        let mutator: Option<AttributeMutator<'_>> = if self.folder.is_some() {
            Some(&pin)
        } else {
            None
        };

        let registered = self
            .types
            .iter()
            .filter(|source| registrar.ensure_register(source, self.must_be_data_type, mutator))
            .count();
        debug!(requested = self.types.len(), registered, "ensured types");

        Ok(Box::new(Inert))
    }
}

/// The generator produced by [`EnsureTypes`]; its work is done at creation.
struct Inert;

impl GlobalGenerator for Inert {
    fn name(&self) -> &str {
        "ensure_types"
    }

    fn generate(&self, _ctx: &mut GenerationContext<'_, '_>) -> GeneratorResult {
        Ok(())
    }
}
