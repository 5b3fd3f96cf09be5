//! The type universe: every source type together with its markers.
//!
//! Markers are a closed set of capabilities attached to a type at
//! composition time. The universe is built once, before any pass runs.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::attribute::ArtifactAttribute;
use crate::generator::{GlobalGeneratorFactory, TypeGenerator};
use crate::types::{family_of, SourceType};

/// A capability attached to a source type.
#[derive(Clone)]
pub enum Marker {
    /// Declares where the type's artifact goes.
    Artifact(ArtifactAttribute),
    /// A generator bound to this type.
    Generator(Arc<dyn TypeGenerator>),
    /// A factory for a generator that takes part in every type's resolution.
    GlobalFactory(Arc<dyn GlobalGeneratorFactory>),
    /// A marker with no meaning for generation planning.
    Other(String),
}

impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::Artifact(attr) => f.debug_tuple("Artifact").field(attr).finish(),
            Marker::Generator(g) => f.debug_tuple("Generator").field(&g.name()).finish(),
            Marker::GlobalFactory(g) => f.debug_tuple("GlobalFactory").field(&g.name()).finish(),
            Marker::Other(tag) => f.debug_tuple("Other").field(tag).finish(),
        }
    }
}

/// A source type and the markers declared on it.
#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    pub source: SourceType,
    pub markers: Vec<Marker>,
}

/// Enumerable source of type declarations.
pub trait TypeUniverse {
    /// Every declaration, in a stable order.
    fn declarations(&self) -> &[TypeDeclaration];

    /// Whether `source` is part of the universe.
    fn contains(&self, source: &SourceType) -> bool {
        self.declarations().iter().any(|d| &d.source == source)
    }
}

/// Resolves configured type names into source types.
pub trait TypeResolver {
    fn resolve_by_name(&self, name: &str) -> Option<SourceType>;
}

/// An in-memory type universe.
#[derive(Debug, Clone, Default)]
pub struct StaticUniverse {
    declarations: Vec<TypeDeclaration>,
    index: HashMap<SourceType, usize>,
}

impl StaticUniverse {
    pub fn builder() -> UniverseBuilder {
        UniverseBuilder::default()
    }

    /// Declaration of `source`, if it is part of the universe.
    pub fn get(&self, source: &SourceType) -> Option<&TypeDeclaration> {
        self.index.get(source).map(|&i| &self.declarations[i])
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

impl TypeUniverse for StaticUniverse {
    fn declarations(&self) -> &[TypeDeclaration] {
        &self.declarations
    }

    fn contains(&self, source: &SourceType) -> bool {
        self.index.contains_key(source)
    }
}

/// Builder for a [`StaticUniverse`].
///
/// ```rust
/// use typebridge::{ArtifactAttribute, AttributeSpec, SourceType, StaticUniverse};
///
/// let universe = StaticUniverse::builder()
///     .declare(SourceType::new("app", "User"), |ty| {
///         ty.artifact(ArtifactAttribute::new(AttributeSpec::new().folder("models")).unwrap())
///     })
///     .declare(SourceType::new("app", "Role"), |ty| ty)
///     .build();
/// assert_eq!(universe.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct UniverseBuilder {
    declarations: Vec<TypeDeclaration>,
}

impl UniverseBuilder {
    /// Declare a type and its markers.
    ///
    /// Declaring the same type twice appends the markers to the first declaration.
    pub fn declare(
        mut self,
        source: SourceType,
        markers: impl FnOnce(DeclarationBuilder) -> DeclarationBuilder,
    ) -> Self {
        let built = markers(DeclarationBuilder::default()).into_markers();
        match self.declarations.iter_mut().find(|d| d.source == source) {
            Some(existing) => existing.markers.extend(built),
            None => self.declarations.push(TypeDeclaration {
                source,
                markers: built,
            }),
        }
        self
    }

    /// Add an already assembled declaration.
    pub fn declaration(mut self, declaration: TypeDeclaration) -> Self {
        match self
            .declarations
            .iter_mut()
            .find(|d| d.source == declaration.source)
        {
            Some(existing) => existing.markers.extend(declaration.markers),
            None => self.declarations.push(declaration),
        }
        self
    }

    /// Index the declarations in declaration order.
    pub fn build(self) -> StaticUniverse {
        let index = self
            .declarations
            .iter()
            .enumerate()
            .map(|(i, d)| (d.source.clone(), i))
            .collect();
        StaticUniverse {
            declarations: self.declarations,
            index,
        }
    }
}

/// Collects the markers of one declaration.
///
/// The artifact attribute has a single slot. Raw markers added through
/// [`DeclarationBuilder::marker`] are kept as given, so a declaration can
/// still carry several artifact annotations and fail the scanner.
#[derive(Debug, Default)]
pub struct DeclarationBuilder {
    artifact: Option<ArtifactAttribute>,
    markers: Vec<Marker>,
}

impl DeclarationBuilder {
    /// Set the artifact attribute, replacing any earlier one.
    pub fn artifact(mut self, attribute: ArtifactAttribute) -> Self {
        self.artifact = Some(attribute);
        self
    }

    /// Attach a per-type generator.
    pub fn generator(mut self, generator: impl TypeGenerator + 'static) -> Self {
        self.markers.push(Marker::Generator(Arc::new(generator)));
        self
    }

    /// Attach a global generator factory.
    pub fn global_factory(mut self, factory: impl GlobalGeneratorFactory + 'static) -> Self {
        self.markers.push(Marker::GlobalFactory(Arc::new(factory)));
        self
    }

    /// Attach a marker.
    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    fn into_markers(self) -> Vec<Marker> {
        self.artifact
            .map(Marker::Artifact)
            .into_iter()
            .chain(self.markers)
            .collect()
    }
}

/// Two-stage name resolver: direct qualified name, then named family.
///
/// Family names are qualified names with the generic argument list removed,
/// so `app.Page` finds `app.Page<T>`. Explicit family aliases can map any
/// other name onto a type.
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    direct: HashMap<String, SourceType>,
    families: HashMap<String, SourceType>,
}

impl NameResolver {
    /// Index every type of a universe.
    pub fn from_universe(universe: &dyn TypeUniverse) -> Self {
        let mut resolver = Self::default();
        for declaration in universe.declarations() {
            let source = &declaration.source;
            resolver.direct.insert(source.qualified_name(), source.clone());
            resolver
                .families
                .entry(source.family_name())
                .or_insert_with(|| source.clone());
        }
        resolver
    }

    /// Register an explicit family alias.
    pub fn with_family(mut self, alias: impl Into<String>, target: SourceType) -> Self {
        self.families.insert(alias.into(), target);
        self
    }
}

impl TypeResolver for NameResolver {
    fn resolve_by_name(&self, name: &str) -> Option<SourceType> {
        let name = name.trim();
        self.direct
            .get(name)
            .or_else(|| self.families.get(name))
            .or_else(|| self.families.get(&family_of(name)))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeSpec;

    fn universe() -> StaticUniverse {
        StaticUniverse::builder()
            .declare(SourceType::new("app", "User"), |ty| ty)
            .declare(SourceType::new("app", "Page<T>"), |ty| ty)
            .declare(SourceType::new("", "Root"), |ty| ty.marker(Marker::Other("doc".into())))
            .build()
    }

    #[test]
    fn test_direct_resolution() {
        let resolver = NameResolver::from_universe(&universe());
        assert_eq!(
            resolver.resolve_by_name("app.User"),
            Some(SourceType::new("app", "User"))
        );
        assert_eq!(resolver.resolve_by_name("Root"), Some(SourceType::new("", "Root")));
    }

    #[test]
    fn test_family_resolution() {
        let resolver = NameResolver::from_universe(&universe());
        let page = Some(SourceType::new("app", "Page<T>"));
        assert_eq!(resolver.resolve_by_name("app.Page"), page);
        assert_eq!(resolver.resolve_by_name("app.Page<app.User>"), page);
    }

    #[test]
    fn test_explicit_family_alias() {
        let resolver = NameResolver::from_universe(&universe())
            .with_family("Account", SourceType::new("app", "User"));
        assert_eq!(
            resolver.resolve_by_name("Account"),
            Some(SourceType::new("app", "User"))
        );
        assert_eq!(resolver.resolve_by_name("app.Missing"), None);
    }

    #[test]
    fn test_repeated_declaration_merges_markers() {
        let universe = StaticUniverse::builder()
            .declare(SourceType::new("a", "T"), |ty| ty.marker(Marker::Other("x".into())))
            .declare(SourceType::new("a", "T"), |ty| ty.marker(Marker::Other("y".into())))
            .build();
        assert_eq!(universe.len(), 1);
        assert_eq!(
            universe
                .get(&SourceType::new("a", "T"))
                .map(|d| d.markers.len()),
            Some(2)
        );
    }

    #[test]
    fn test_artifact_slot_keeps_last_attribute() {
        let folder =
            |name: &str| ArtifactAttribute::new(AttributeSpec::new().folder(name)).unwrap();
        let source = SourceType::new("a", "T");
        let universe = StaticUniverse::builder()
            .declare(source.clone(), |ty| {
                ty.artifact(folder("first"))
                    .marker(Marker::Other("doc".into()))
                    .artifact(folder("second"))
            })
            .build();

        let markers = &universe.get(&source).unwrap().markers;
        let artifacts: Vec<_> = markers
            .iter()
            .filter_map(|m| match m {
                Marker::Artifact(attribute) => Some(attribute),
                _ => None,
            })
            .collect();
        assert_eq!(markers.len(), 2);
        assert_eq!(artifacts, vec![&folder("second")]);
    }
}
