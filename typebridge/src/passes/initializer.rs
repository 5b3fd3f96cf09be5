//! Pass 3: instantiate global generators and let them register extra types.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::attribute::ArtifactAttribute;
use crate::data_type::StructuralTypes;
use crate::error::{AttributeError, PassError, SetupError};
use crate::generator::{run_guarded, GlobalGenerator, GlobalGeneratorFactory};
use crate::passes::scanner::probe_data_type;
use crate::registry::{RegisteredTypeEntry, RegistrationMap};
use crate::types::SourceType;

pub(crate) const PASS_NAME: &str = "global generator initialization";

/// Mutation applied to a type's attribute by [`Registrar::ensure_register`].
pub type AttributeMutator<'f> = &'f dyn Fn(&mut ArtifactAttribute) -> Result<(), AttributeError>;

/// Registration context handed to global generator factories.
pub struct Registrar<'a> {
    map: &'a mut RegistrationMap,
    types: &'a dyn StructuralTypes,
    factory: &'a str,
    failures: Vec<SetupError>,
}

impl<'a> Registrar<'a> {
    fn new(map: &'a mut RegistrationMap, types: &'a dyn StructuralTypes, factory: &'a str) -> Self {
        Self {
            map,
            types,
            factory,
            failures: Vec::new(),
        }
    }

    /// Read-only view of the registrations so far.
    pub fn entries(&self) -> &RegistrationMap {
        self.map
    }

    /// The structural type system.
    pub fn types(&self) -> &dyn StructuralTypes {
        self.types
    }

    /// Make sure `source` is registered.
    ///
    /// An already registered type only has `mutator` applied to its
    /// attribute. A new type is probed for its data type first; registration
    /// fails only when `must_be_data_type` is set and no exchangeable data
    /// type exists. Returns whether the type is registered afterwards.
    pub fn ensure_register(
        &mut self,
        source: &SourceType,
        must_be_data_type: bool,
        mutator: Option<AttributeMutator<'_>>,
    ) -> bool {
        if let Some(entry) = self.map.get(source) {
            let attribute = entry.attribute.clone();
            return match self.mutate(source, attribute, mutator) {
                Some(attribute) => {
                    if let Some(entry) = self.map.get_mut(source) {
                        entry.attribute = attribute;
                    }
                    true
                }
                None => false,
            };
        }

        let data_type = probe_data_type(self.types, source);
        if must_be_data_type && data_type.is_none() {
            self.fail(SetupError::MissingDataType {
                source_type: source.clone(),
            });
            return false;
        }

        let Some(attribute) = self.mutate(source, None, mutator) else {
            return false;
        };

        debug!(factory = self.factory, type_name = %source, ?data_type, "registered on demand");
        self.map.insert(
            source.clone(),
            RegisteredTypeEntry {
                attribute,
                generators: Vec::new(),
                data_type,
            },
        );
        true
    }

    /// Apply a mutator. `None` signals failure; `Some(attr)` is the new attribute.
    fn mutate(
        &mut self,
        source: &SourceType,
        current: Option<ArtifactAttribute>,
        mutator: Option<AttributeMutator<'_>>,
    ) -> Option<Option<ArtifactAttribute>> {
        let Some(mutator) = mutator else {
            return Some(current);
        };

        let had_attribute = current.is_some();
        let mut attribute = current.unwrap_or_default();
        if let Err(err) = mutator(&mut attribute) {
            self.fail(SetupError::InvalidAttribute {
                type_name: source.qualified_name(),
                source: err,
            });
            return None;
        }

        if had_attribute || attribute != ArtifactAttribute::empty() {
            Some(Some(attribute))
        } else {
            Some(None)
        }
    }

    fn fail(&mut self, err: SetupError) {
        error!(factory = self.factory, "{}", err);
        self.failures.push(err);
    }
}

/// Global generators in discovery order.
pub type GlobalGenerators = Vec<Arc<dyn GlobalGenerator>>;

/// Runs every discovered factory.
pub struct GlobalInitializer<'a> {
    types: &'a dyn StructuralTypes,
}

impl<'a> GlobalInitializer<'a> {
    pub fn new(types: &'a dyn StructuralTypes) -> Self {
        Self { types }
    }

    /// Instantiate every factory in order.
    ///
    /// A failing factory does not stop the others; the pass fails after all
    /// have run. On failure `map` is left untouched.
    pub fn initialize(
        &self,
        factories: &[Arc<dyn GlobalGeneratorFactory>],
        map: &mut RegistrationMap,
    ) -> Result<GlobalGenerators, PassError> {
        let mut working = map.clone();
        let mut generators = GlobalGenerators::new();
        let mut errors = Vec::new();

        for factory in factories {
            let before = working.len();
            let mut registrar = Registrar::new(&mut working, self.types, factory.name());
            let created = run_guarded(|| factory.create(&mut registrar));
            let failures = registrar.failures;

            match created {
                Ok(generator) if failures.is_empty() => {
                    debug!(
                        factory = factory.name(),
                        generator = generator.name(),
                        registered = working.len() - before,
                        "global generator created"
                    );
                    generators.push(Arc::from(generator));
                }
                Ok(_) => {
                    error!(
                        factory = factory.name(),
                        "global generator factory rejected registrations"
                    );
                    errors.extend(failures);
                }
                Err(err) => {
                    error!(
                        factory = factory.name(),
                        error = %err,
                        "global generator factory failed"
                    );
                    errors.extend(failures);
                    errors.push(SetupError::FactoryFailed {
                        factory: factory.name().to_string(),
                        message: err.message,
                    });
                }
            }
        }

        if !errors.is_empty() {
            return Err(PassError::new(PASS_NAME, errors));
        }

        info!(
            factories = factories.len(),
            generators = generators.len(),
            registered = working.len(),
            "initialized global generators"
        );
        *map = working;
        Ok(generators)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeSpec;
    use crate::data_type::{DataShape, DataType, StructuralCatalog};
    use crate::error::GeneratorError;
    use crate::generator::GeneratorResult;
    use crate::resolution::GenerationContext;

    struct Inert;

    impl GlobalGenerator for Inert {
        fn name(&self) -> &str {
            "inert"
        }

        fn generate(&self, _ctx: &mut GenerationContext<'_, '_>) -> GeneratorResult {
            Ok(())
        }
    }

    /// Factory driven by a closure over the registrar.
    struct Demands<F>(&'static str, F);

    impl<F> GlobalGeneratorFactory for Demands<F>
    where
        F: Fn(&mut Registrar<'_>) -> GeneratorResult + Send + Sync,
    {
        fn name(&self) -> &str {
            self.0
        }

        fn create(
            &self,
            registrar: &mut Registrar<'_>,
        ) -> GeneratorResult<Box<dyn GlobalGenerator>> {
            (self.1)(registrar)?;
            Ok(Box::new(Inert))
        }
    }

    fn catalog() -> StructuralCatalog {
        let mut catalog = StructuralCatalog::with_primitives();
        catalog.define("g", DataShape::Record { fields: vec![] }, true);
        catalog.bind(SourceType::new("ns", "G"), DataType::new("g"));
        catalog
    }

    fn ty(name: &str) -> SourceType {
        SourceType::new("ns", name)
    }

    fn factory<F>(name: &'static str, f: F) -> Arc<dyn GlobalGeneratorFactory>
    where
        F: Fn(&mut Registrar<'_>) -> GeneratorResult + Send + Sync + 'static,
    {
        Arc::new(Demands(name, f))
    }

    #[test]
    fn test_ensure_register_new_data_type() {
        let catalog = catalog();
        let mut map = RegistrationMap::new();
        let factories = vec![factory("f", |r: &mut Registrar<'_>| {
            assert!(r.ensure_register(&ty("G"), true, None));
            Ok(())
        })];

        let generators = GlobalInitializer::new(&catalog)
            .initialize(&factories, &mut map)
            .unwrap();
        assert_eq!(generators.len(), 1);
        assert_eq!(map.get(&ty("G")).unwrap().data_type, Some(DataType::new("g")));
    }

    #[test]
    fn test_ensure_register_requires_data_type() {
        let catalog = catalog();
        let mut map = RegistrationMap::new();
        let factories = vec![factory("f", |r: &mut Registrar<'_>| {
            assert!(!r.ensure_register(&ty("F"), true, None));
            Ok(())
        })];

        let err = GlobalInitializer::new(&catalog)
            .initialize(&factories, &mut map)
            .err().expect("expected error");
        assert_eq!(err.errors, vec![SetupError::MissingDataType { source_type: ty("F") }]);
        assert!(err.to_string().contains("ns.F"));
        assert!(map.is_empty());
    }

    #[test]
    fn test_ensure_register_is_idempotent_and_mutates_attribute_only() {
        let catalog = catalog();
        let mut map = RegistrationMap::new();
        map.insert(
            ty("G"),
            RegisteredTypeEntry::new()
                .with_attribute(ArtifactAttribute::new(AttributeSpec::new().folder("old")).unwrap())
                .with_data_type(DataType::new("g")),
        );
        let factories = vec![factory("f", |r: &mut Registrar<'_>| {
            let mutator = |attr: &mut ArtifactAttribute| attr.set_folder("new");
            assert!(r.ensure_register(&ty("G"), false, Some(&mutator)));
            assert!(r.ensure_register(&ty("G"), false, None));
            Ok(())
        })];

        GlobalInitializer::new(&catalog)
            .initialize(&factories, &mut map)
            .unwrap();
        let entry = map.get(&ty("G")).unwrap();
        assert_eq!(entry.attribute.as_ref().and_then(|a| a.folder()), Some("new"));
        assert_eq!(entry.data_type, Some(DataType::new("g")));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_non_structural_type_registers_without_data_type() {
        let catalog = catalog();
        let mut map = RegistrationMap::new();
        let factories = vec![factory("f", |r: &mut Registrar<'_>| {
            assert!(r.ensure_register(&ty("Plain"), false, None));
            Ok(())
        })];

        GlobalInitializer::new(&catalog)
            .initialize(&factories, &mut map)
            .unwrap();
        let entry = map.get(&ty("Plain")).unwrap();
        assert!(entry.attribute.is_none());
        assert!(entry.data_type.is_none());
    }

    #[test]
    fn test_every_factory_runs_and_errors_accumulate() {
        let catalog = catalog();
        let mut map = RegistrationMap::new();
        let factories = vec![
            factory("broken", |_: &mut Registrar<'_>| Err(GeneratorError::new("no luck"))),
            factory("panicky", |_: &mut Registrar<'_>| panic!("factory exploded")),
            factory("fine", |r: &mut Registrar<'_>| {
                r.ensure_register(&ty("G"), true, None);
                Ok(())
            }),
        ];

        let err = GlobalInitializer::new(&catalog)
            .initialize(&factories, &mut map)
            .err().expect("expected error");
        assert_eq!(
            err.errors,
            vec![
                SetupError::FactoryFailed {
                    factory: "broken".into(),
                    message: "no luck".into()
                },
                SetupError::FactoryFailed {
                    factory: "panicky".into(),
                    message: "panicked: factory exploded".into()
                },
            ]
        );
        assert!(map.is_empty());
    }
}
