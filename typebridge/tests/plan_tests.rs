//! Integration tests for typebridge.
//!
//! These tests build complete generation plans and verify the end-to-end
//! behavior of the setup passes and the resolution protocol.

use std::sync::Arc;

use typebridge::{
    ArtifactAttribute, AttributeError, AttributeSpec, DataShape, DataType, EnsureTypes, FieldShape,
    GenerationContext, GenerationPlan, GeneratorResult, Marker, PlanSettings, ResolveError,
    SetupError, SourceType, StaticUniverse, StructuralCatalog, StructuralTypes, TypeGenerator,
    TypeOverride,
};

fn ty(name: &str) -> SourceType {
    SourceType::new("ns", name)
}

fn attr(spec: AttributeSpec) -> ArtifactAttribute {
    ArtifactAttribute::new(spec).unwrap()
}

/// A generator that does nothing; it only makes its type "touched".
struct Noop;

impl TypeGenerator for Noop {
    fn name(&self) -> &str {
        "noop"
    }

    fn generate(&self, _ctx: &mut GenerationContext<'_, '_>) -> GeneratorResult {
        Ok(())
    }
}

// =============================================================================
// Setup Pass Scenarios
// =============================================================================

#[test]
fn test_scenario_mixed_sources() {
    let mut catalog = StructuralCatalog::with_primitives();
    catalog
        .define("a", DataShape::Record { fields: vec![] }, true)
        .bind(ty("A"), DataType::new("a"));

    let universe = StaticUniverse::builder()
        .declare(ty("A"), |t| t.generator(Noop))
        .declare(ty("B"), |t| t.artifact(attr(AttributeSpec::new().folder("x"))))
        .declare(ty("C"), |t| t)
        .build();
    let settings = PlanSettings {
        types: vec![TypeOverride::new("ns.C").folder("y").file_name("c.out")],
        ..Default::default()
    };

    let plan = GenerationPlan::build(&universe, &catalog, &settings).unwrap();
    let entries = plan.entries();

    let a = entries.get(&ty("A")).unwrap();
    assert_eq!(a.data_type, Some(DataType::new("a")));
    assert!(a.attribute.is_none());

    let b = entries.get(&ty("B")).unwrap().attribute.clone().unwrap();
    assert_eq!(b.folder(), Some("x"));
    assert!(entries.get(&ty("B")).unwrap().data_type.is_none());

    let c = entries.get(&ty("C")).unwrap().attribute.clone().unwrap();
    assert_eq!(c.folder(), Some("y"));
    assert_eq!(c.file_name(), Some("c.out"));

    let result: Vec<_> = plan.exchangeable().iter().cloned().collect();
    assert_eq!(result, vec![DataType::new("a")]);
}

#[test]
fn test_scenario_alias_to_derived_default() {
    let universe = StaticUniverse::builder()
        .declare(ty("D"), |t| t)
        .declare(ty("E"), |t| t)
        .build();
    let catalog = StructuralCatalog::with_primitives();
    let settings = PlanSettings {
        types: vec![TypeOverride::new("ns.D").same_folder_as("ns.E")],
        ..Default::default()
    };

    let plan = GenerationPlan::build(&universe, &catalog, &settings).unwrap();
    let descriptor = plan.resolver().resolve(&ty("D")).unwrap();
    assert_eq!(descriptor.location.folder, "ns/E");
}

#[test]
fn test_scenario_ensure_register_non_structural() {
    let universe = StaticUniverse::builder()
        .declare(ty("Registry"), |t| {
            t.global_factory(EnsureTypes::new([ty("F")]).data_types_only())
        })
        .declare(ty("F"), |t| t)
        .build();
    let catalog = StructuralCatalog::with_primitives();

    let err = GenerationPlan::build(&universe, &catalog, &PlanSettings::default()).unwrap_err();
    assert_eq!(
        err.errors(),
        &[SetupError::MissingDataType {
            source_type: ty("F")
        }]
    );
    assert!(err.to_string().contains("ns.F"));
}

#[test]
fn test_configuration_overrides_code() {
    let universe = StaticUniverse::builder()
        .declare(ty("T"), |t| {
            t.artifact(attr(AttributeSpec::new().folder("B").type_name("FromCode")))
        })
        .build();
    let catalog = StructuralCatalog::with_primitives();
    let settings = PlanSettings {
        types: vec![TypeOverride::new("ns.T").folder("A")],
        ..Default::default()
    };

    let plan = GenerationPlan::build(&universe, &catalog, &settings).unwrap();
    let descriptor = plan.resolver().resolve(&ty("T")).unwrap();
    assert_eq!(descriptor.location.folder, "A");
    assert_eq!(descriptor.location.type_name, "FromCode");
}

#[test]
fn test_configured_alias_drops_conflicting_code_folder() {
    let universe = StaticUniverse::builder()
        .declare(ty("T"), |t| t.artifact(attr(AttributeSpec::new().folder("code"))))
        .declare(ty("Home"), |t| t.artifact(attr(AttributeSpec::new().folder("home"))))
        .build();
    let catalog = StructuralCatalog::with_primitives();
    let settings = PlanSettings {
        types: vec![TypeOverride::new("ns.T").same_file_as("ns.Home")],
        ..Default::default()
    };

    let plan = GenerationPlan::build(&universe, &catalog, &settings).unwrap();
    let descriptor = plan.resolver().resolve(&ty("T")).unwrap();
    assert_eq!(descriptor.path(), "home/Home");
}

#[test]
fn test_same_file_as_with_file_name_rejected_before_registration() {
    let universe = StaticUniverse::builder()
        .declare(ty("T"), |t| t.generator(Noop))
        .declare(ty("U"), |t| t)
        .build();
    let catalog = StructuralCatalog::with_primitives();
    let settings = PlanSettings {
        types: vec![TypeOverride::new("ns.T")
            .same_file_as("ns.U")
            .file_name("t.out")],
        ..Default::default()
    };

    let err = GenerationPlan::build(&universe, &catalog, &settings).unwrap_err();
    assert_eq!(
        err.errors(),
        &[SetupError::InvalidAttribute {
            type_name: "ns.T".into(),
            source: AttributeError::Conflict {
                field: "same_file_as",
                other: "file_name",
            },
        }]
    );
}

#[test]
fn test_duplicate_annotation_single_error() {
    let universe = StaticUniverse::builder()
        .declare(ty("Twice"), |t| {
            t.marker(Marker::Artifact(attr(AttributeSpec::new().folder("one"))))
                .marker(Marker::Artifact(attr(AttributeSpec::new().folder("two"))))
        })
        .declare(ty("Fine"), |t| t.artifact(attr(AttributeSpec::new().folder("ok"))))
        .build();
    let catalog = StructuralCatalog::with_primitives();

    let err = GenerationPlan::build(&universe, &catalog, &PlanSettings::default()).unwrap_err();
    assert_eq!(
        err.errors(),
        &[SetupError::DuplicateAnnotation {
            source_type: ty("Twice")
        }]
    );
}

#[test]
fn test_configuration_errors_are_collected() {
    let mut catalog = StructuralCatalog::with_primitives();
    catalog
        .define("secret", DataShape::Record { fields: vec![] }, false)
        .bind(ty("Secret"), DataType::new("secret"));
    let universe = StaticUniverse::builder()
        .declare(ty("Secret"), |t| t)
        .declare(ty("Plain"), |t| t)
        .build();
    let settings = PlanSettings {
        types: vec![
            TypeOverride::new("ns.Missing"),
            TypeOverride::new("ns.Secret"),
            TypeOverride::new("ns.Plain").folder(""),
            TypeOverride::new("ns.Plain"),
        ],
        ..Default::default()
    };

    let err = GenerationPlan::build(&universe, &catalog, &settings).unwrap_err();
    assert_eq!(err.errors().len(), 3);
    assert!(matches!(err.errors()[0], SetupError::UnresolvableName { .. }));
    assert!(matches!(err.errors()[1], SetupError::NonExchangeable { .. }));
    assert!(matches!(
        err.errors()[2],
        SetupError::InvalidAttribute {
            source: AttributeError::EmptyField { field: "folder" },
            ..
        }
    ));
}

#[test]
fn test_code_discovered_non_exchangeable_type_is_demoted() {
    let mut catalog = StructuralCatalog::with_primitives();
    catalog
        .define("secret", DataShape::Record { fields: vec![] }, false)
        .bind(ty("Secret"), DataType::new("secret"));
    let universe = StaticUniverse::builder()
        .declare(ty("Secret"), |t| t.artifact(attr(AttributeSpec::new().folder("s"))))
        .build();

    let plan = GenerationPlan::build(&universe, &catalog, &PlanSettings::default()).unwrap();
    assert!(plan.entry(&ty("Secret")).unwrap().data_type.is_none());
    assert!(plan.exchangeable().is_empty());
}

// =============================================================================
// Exchangeable Set
// =============================================================================

fn shop_catalog() -> StructuralCatalog {
    let mut catalog = StructuralCatalog::with_primitives();
    catalog
        .define("decimal", DataShape::Primitive, true)
        .define(
            "line",
            DataShape::Record {
                fields: vec![
                    FieldShape {
                        name: "sku".into(),
                        ty: DataType::new("string"),
                    },
                    FieldShape {
                        name: "price".into(),
                        ty: DataType::new("decimal"),
                    },
                ],
            },
            true,
        )
        .define(
            "order",
            DataShape::Record {
                fields: vec![FieldShape {
                    name: "lines".into(),
                    ty: DataType::new("lines"),
                }],
            },
            true,
        )
        .define(
            "lines",
            DataShape::List {
                element: DataType::new("line"),
            },
            true,
        )
        .bind(ty("Order"), DataType::new("order"))
        .bind(ty("Line"), DataType::new("line"));
    catalog
}

#[test]
fn test_exchangeable_closure_and_exclusion() {
    let catalog = shop_catalog();
    let universe = StaticUniverse::builder()
        .declare(ty("Order"), |t| t.generator(Noop))
        .declare(ty("Line"), |t| t)
        .build();
    let mut settings = PlanSettings::default();
    settings.exchange.exclude.push("decimal".into());

    let plan = GenerationPlan::build(&universe, &catalog, &settings).unwrap();
    let names: Vec<_> = plan.exchangeable().iter().map(|d| d.name().to_string()).collect();
    assert_eq!(names, vec!["line", "lines", "order", "string"]);
    assert!(plan.exchangeable().is_subset(catalog.universe()));
}

#[test]
fn test_exchange_disabled() {
    let catalog = shop_catalog();
    let universe = StaticUniverse::builder()
        .declare(ty("Order"), |t| t.generator(Noop))
        .build();
    let mut settings = PlanSettings::default();
    settings.exchange.enabled = false;

    let plan = GenerationPlan::build(&universe, &catalog, &settings).unwrap();
    assert!(plan.exchangeable().is_empty());

    let descriptor = plan.resolver().resolve(&ty("Order")).unwrap();
    assert!(descriptor.data_type.is_none());
    assert!(descriptor.imports.is_empty());
}

// =============================================================================
// Resolution
// =============================================================================

#[test]
fn test_resolution_is_cached() {
    let catalog = shop_catalog();
    let universe = StaticUniverse::builder()
        .declare(ty("Order"), |t| t.generator(Noop))
        .build();
    let plan = GenerationPlan::build(&universe, &catalog, &PlanSettings::default()).unwrap();

    let mut resolver = plan.resolver();
    let first = resolver.resolve(&ty("Order")).unwrap();
    let second = resolver.resolve(&ty("Order")).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_alias_cycle_reports_path() {
    let universe = StaticUniverse::builder()
        .declare(ty("X"), |t| t)
        .declare(ty("Y"), |t| t)
        .build();
    let catalog = StructuralCatalog::with_primitives();
    let settings = PlanSettings {
        types: vec![
            TypeOverride::new("ns.X").same_folder_as("ns.Y"),
            TypeOverride::new("ns.Y").same_folder_as("ns.X"),
        ],
        ..Default::default()
    };

    let plan = GenerationPlan::build(&universe, &catalog, &settings).unwrap();
    let report = plan.resolve_all();
    assert_eq!(report.failed.len(), 2);
    for (_, err) in &report.failed {
        let message = err.to_string();
        assert!(message.contains("ns.X"), "{}", message);
        assert!(message.contains("ns.Y"), "{}", message);
    }
}

#[test]
fn test_long_acyclic_alias_chain() {
    const LENGTH: usize = 3000;
    let link = |i: usize| ty(&format!("Link{}", i));
    let universe = (0..LENGTH)
        .fold(StaticUniverse::builder(), |builder, i| {
            let spec = if i + 1 == LENGTH {
                AttributeSpec::new().folder("tail")
            } else {
                AttributeSpec::new().same_folder_as(link(i + 1))
            };
            builder.declare(link(i), |t| t.artifact(attr(spec)))
        })
        .build();
    let catalog = StructuralCatalog::with_primitives();

    let plan = GenerationPlan::build(&universe, &catalog, &PlanSettings::default()).unwrap();
    let report = plan.resolve_all();

    assert!(report.failed.is_empty());
    assert_eq!(report.resolved.len(), LENGTH);
    for descriptor in &report.resolved {
        assert_eq!(descriptor.location.folder, "tail");
        assert_eq!(descriptor.location.file_name, descriptor.location.source.name());
    }
}

#[test]
fn test_mixed_alias_chain() {
    let universe = StaticUniverse::builder()
        .declare(ty("A"), |t| t.artifact(attr(AttributeSpec::new().same_file_as(ty("B")))))
        .declare(ty("B"), |t| t.artifact(attr(AttributeSpec::new().same_folder_as(ty("C")))))
        .declare(ty("C"), |t| t.artifact(attr(AttributeSpec::new().folder("x"))))
        .build();
    let catalog = StructuralCatalog::with_primitives();

    let plan = GenerationPlan::build(&universe, &catalog, &PlanSettings::default()).unwrap();
    let mut resolver = plan.resolver();

    let a = resolver.resolve(&ty("A")).unwrap();
    assert_eq!(a.path(), "x/B");
    assert_eq!(a.location.type_name, "A");

    let b = resolver.resolve(&ty("B")).unwrap();
    assert_eq!(b.path(), "x/B");
    assert_eq!(b.location.type_name, "B");

    assert_eq!(resolver.resolve(&ty("C")).unwrap().path(), "x/C");
}

#[test]
fn test_structural_imports_follow_lists() {
    let catalog = shop_catalog();
    let universe = StaticUniverse::builder()
        .declare(ty("Order"), |t| t.artifact(attr(AttributeSpec::new().folder("orders"))))
        .declare(ty("Line"), |t| t.artifact(attr(AttributeSpec::new().folder("lines"))))
        .build();

    let plan = GenerationPlan::build(&universe, &catalog, &PlanSettings::default()).unwrap();
    let order = plan.resolver().resolve(&ty("Order")).unwrap();

    assert_eq!(order.data_type, Some(DataType::new("order")));
    assert_eq!(order.imports.len(), 1);
    assert_eq!(order.imports[0].source, ty("Line"));
    assert_eq!(order.imports[0].folder, "lines");
}

#[test]
fn test_same_file_types_do_not_import_each_other() {
    let catalog = shop_catalog();
    let universe = StaticUniverse::builder()
        .declare(ty("Order"), |t| {
            t.artifact(attr(AttributeSpec::new().folder("shop").file_name("models")))
        })
        .declare(ty("Line"), |t| t.artifact(attr(AttributeSpec::new().same_file_as(ty("Order")))))
        .build();

    let plan = GenerationPlan::build(&universe, &catalog, &PlanSettings::default()).unwrap();
    let order = plan.resolver().resolve(&ty("Order")).unwrap();
    assert!(order.imports.is_empty());
}

#[test]
fn test_dangling_alias() {
    let universe = StaticUniverse::builder()
        .declare(ty("T"), |t| {
            t.artifact(attr(AttributeSpec::new().same_folder_as(SourceType::new("other", "Gone"))))
        })
        .build();
    let catalog = StructuralCatalog::with_primitives();

    let plan = GenerationPlan::build(&universe, &catalog, &PlanSettings::default()).unwrap();
    assert_eq!(
        plan.resolver().resolve(&ty("T")).unwrap_err(),
        ResolveError::DanglingAlias {
            source_type: ty("T"),
            target: SourceType::new("other", "Gone"),
        }
    );
}
