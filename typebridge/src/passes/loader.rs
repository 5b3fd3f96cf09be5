//! Pass 1: turn configured per-type overrides into seed registrations.

use tracing::{error, info};

use crate::attribute::{ArtifactAttribute, AttributeSpec};
use crate::data_type::StructuralTypes;
use crate::error::{PassError, SetupError};
use crate::registry::{RegisteredTypeEntry, RegistrationMap};
use crate::settings::TypeOverride;
use crate::types::SourceType;
use crate::universe::TypeResolver;

pub(crate) const PASS_NAME: &str = "configuration";

/// Loads configured overrides into a fresh registration map.
pub struct ConfigurationLoader<'a> {
    resolver: &'a dyn TypeResolver,
    types: &'a dyn StructuralTypes,
}

impl<'a> ConfigurationLoader<'a> {
    pub fn new(resolver: &'a dyn TypeResolver, types: &'a dyn StructuralTypes) -> Self {
        Self { resolver, types }
    }

    /// Process every entry, collecting all offenses.
    ///
    /// The returned map covers exactly the configured types. If any entry is
    /// invalid, nothing is returned but the full list of errors.
    pub fn load(&self, overrides: &[TypeOverride]) -> Result<RegistrationMap, PassError> {
        let mut map = RegistrationMap::new();
        let mut errors = Vec::new();

        for entry in overrides {
            match self.load_entry(entry, &map) {
                Ok((source, registered)) => {
                    map.insert(source, registered);
                }
                Err(entry_errors) => {
                    let serialized = serde_json::to_string(entry).unwrap_or_default();
                    for err in &entry_errors {
                        error!(entry = %serialized, error = %err, "invalid type configuration");
                    }
                    errors.extend(entry_errors);
                }
            }
        }

        if !errors.is_empty() {
            return Err(PassError::new(PASS_NAME, errors));
        }

        info!(
            configured = overrides.len(),
            with_data_type = map.data_types().count(),
            "loaded type configuration"
        );
        Ok(map)
    }

    fn load_entry(
        &self,
        entry: &TypeOverride,
        map: &RegistrationMap,
    ) -> Result<(SourceType, RegisteredTypeEntry), Vec<SetupError>> {
        let mut errors = Vec::new();

        let source = self.resolve(&entry.target, &mut errors);
        let same_folder_as = entry
            .same_folder_as
            .as_deref()
            .and_then(|name| self.resolve(name, &mut errors));
        let same_file_as = entry
            .same_file_as
            .as_deref()
            .and_then(|name| self.resolve(name, &mut errors));

        let Some(source) = source else {
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        if map.contains(&source) {
            return Err(vec![SetupError::DuplicateConfiguration {
                source_type: source,
            }]);
        }

        let attribute = ArtifactAttribute::new(AttributeSpec {
            folder: entry.folder.clone(),
            file_name: entry.file_name.clone(),
            type_name: entry.type_name.clone(),
            same_folder_as,
            same_file_as,
        })
        .map_err(|source_err| {
            vec![SetupError::InvalidAttribute {
                type_name: source.qualified_name(),
                source: source_err,
            }]
        })?;

        let mut registered = RegisteredTypeEntry::new().with_attribute(attribute);

        if let Some(data_type) = self.types.find_by_type(&source) {
            if !self.types.is_exchangeable(&data_type) {
                return Err(vec![SetupError::NonExchangeable {
                    source_type: source,
                    data_type,
                }]);
            }
            registered.data_type = Some(self.types.non_nullable(&data_type));
        }

        Ok((source, registered))
    }

    fn resolve(&self, name: &str, errors: &mut Vec<SetupError>) -> Option<SourceType> {
        let resolved = self.resolver.resolve_by_name(name);
        if resolved.is_none() {
            errors.push(SetupError::UnresolvableName {
                name: name.to_string(),
            });
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::{DataShape, DataType, StructuralCatalog};
    use crate::universe::{NameResolver, StaticUniverse};

    struct Fixture {
        resolver: NameResolver,
        catalog: StructuralCatalog,
    }

    fn fixture() -> Fixture {
        let universe = StaticUniverse::builder()
            .declare(SourceType::new("app", "User"), |ty| ty)
            .declare(SourceType::new("app", "Money"), |ty| ty)
            .declare(SourceType::new("app", "Service"), |ty| ty)
            .build();

        let mut catalog = StructuralCatalog::with_primitives();
        catalog.define("user", DataShape::Record { fields: vec![] }, true);
        catalog.define("money", DataShape::Primitive, false);
        catalog.bind(SourceType::new("app", "User"), DataType::new("user").nullable());
        catalog.bind(SourceType::new("app", "Money"), DataType::new("money"));

        Fixture {
            resolver: NameResolver::from_universe(&universe),
            catalog,
        }
    }

    #[test]
    fn test_loads_configured_types_only() {
        let f = fixture();
        let loader = ConfigurationLoader::new(&f.resolver, &f.catalog);
        let map = loader
            .load(&[TypeOverride::new("app.Service").folder("svc")])
            .unwrap();

        assert_eq!(map.len(), 1);
        let entry = map.get(&SourceType::new("app", "Service")).unwrap();
        assert_eq!(entry.attribute.as_ref().and_then(|a| a.folder()), Some("svc"));
        assert_eq!(entry.data_type, None);
    }

    #[test]
    fn test_data_type_is_normalized() {
        let f = fixture();
        let loader = ConfigurationLoader::new(&f.resolver, &f.catalog);
        let map = loader.load(&[TypeOverride::new("app.User")]).unwrap();

        let entry = map.get(&SourceType::new("app", "User")).unwrap();
        assert_eq!(entry.data_type, Some(DataType::new("user")));
    }

    #[test]
    fn test_collects_every_error() {
        let f = fixture();
        let loader = ConfigurationLoader::new(&f.resolver, &f.catalog);
        let err = loader
            .load(&[
                TypeOverride::new("app.Missing"),
                TypeOverride::new("app.Money"),
                TypeOverride::new("app.Service").same_file_as("app.Gone"),
                TypeOverride::new("app.User").folder(""),
            ])
            .unwrap_err();

        assert_eq!(err.pass, PASS_NAME);
        assert_eq!(err.errors.len(), 4);
        assert!(matches!(
            err.errors[0],
            SetupError::UnresolvableName { ref name } if name == "app.Missing"
        ));
        assert!(matches!(err.errors[1], SetupError::NonExchangeable { .. }));
        assert!(matches!(
            err.errors[2],
            SetupError::UnresolvableName { ref name } if name == "app.Gone"
        ));
        assert!(matches!(err.errors[3], SetupError::InvalidAttribute { .. }));
    }

    #[test]
    fn test_rejects_same_file_as_with_file_name() {
        let f = fixture();
        let loader = ConfigurationLoader::new(&f.resolver, &f.catalog);
        let err = loader
            .load(&[
                TypeOverride::new("app.Service").folder("ok"),
                TypeOverride::new("app.User")
                    .file_name("user.out")
                    .same_file_as("app.Service"),
            ])
            .unwrap_err();

        assert_eq!(err.errors.len(), 1);
        assert!(matches!(
            &err.errors[0],
            SetupError::InvalidAttribute { type_name, .. } if type_name == "app.User"
        ));
    }

    #[test]
    fn test_duplicate_configuration() {
        let f = fixture();
        let loader = ConfigurationLoader::new(&f.resolver, &f.catalog);
        let err = loader
            .load(&[
                TypeOverride::new("app.Service").folder("a"),
                TypeOverride::new("app.Service").folder("b"),
            ])
            .unwrap_err();

        assert_eq!(
            err.errors,
            vec![SetupError::DuplicateConfiguration {
                source_type: SourceType::new("app", "Service")
            }]
        );
    }
}
