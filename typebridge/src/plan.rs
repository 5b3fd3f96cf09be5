//! The frozen generation plan.
//!
//! Building a plan runs the setup passes in order over a single owned
//! registration map. Once built, the plan is read-only and can hand out any
//! number of [`ArtifactResolver`]s.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::{error, info};

use crate::data_type::{DataType, ExchangeableSet, StructuralTypes};
use crate::error::{PassError, PlanError, SetupError};
use crate::passes::{
    loader, AttributeScanner, ConfigurationLoader, ExchangeableSetBuilder, GlobalGenerators,
    GlobalInitializer,
};
use crate::registry::{RegisteredTypeEntry, RegistrationMap};
use crate::resolution::{ArtifactResolver, ResolutionReport};
use crate::settings::PlanSettings;
use crate::types::SourceType;
use crate::universe::{NameResolver, TypeResolver, TypeUniverse};

/// Everything the resolution protocol needs, frozen after setup.
pub struct GenerationPlan {
    types: Vec<SourceType>,
    known: HashSet<SourceType>,
    entries: RegistrationMap,
    global_generators: GlobalGenerators,
    exchangeable: ExchangeableSet,
    references: HashMap<DataType, Vec<DataType>>,
    owners: HashMap<DataType, SourceType>,
}

impl GenerationPlan {
    /// Build a plan, resolving configured names against the universe and
    /// the configured family aliases.
    pub fn build(
        universe: &dyn TypeUniverse,
        types: &dyn StructuralTypes,
        settings: &PlanSettings,
    ) -> Result<Self, PlanError> {
        let mut resolver = NameResolver::from_universe(universe);
        let mut errors = Vec::new();

        for (alias, target) in &settings.families {
            let resolved = resolver.resolve_by_name(target);
            match resolved {
                Some(source) => resolver = resolver.with_family(alias.clone(), source),
                None => {
                    let err = SetupError::UnresolvableName {
                        name: target.clone(),
                    };
                    error!(family = %alias, "{}", err);
                    errors.push(err);
                }
            }
        }

        if !errors.is_empty() {
            return Err(PassError::new(loader::PASS_NAME, errors).into());
        }

        Self::build_with_resolver(universe, types, &resolver, settings)
    }

    /// Build a plan with a caller-supplied name resolver.
    pub fn build_with_resolver(
        universe: &dyn TypeUniverse,
        types: &dyn StructuralTypes,
        resolver: &dyn TypeResolver,
        settings: &PlanSettings,
    ) -> Result<Self, PlanError> {
        info!(
            declarations = universe.declarations().len(),
            configured = settings.types.len(),
            universe = types.universe().len(),
            "building generation plan"
        );

        let mut entries = ConfigurationLoader::new(resolver, types).load(&settings.types)?;
        let factories = AttributeScanner::new(types).scan(universe, &mut entries)?;
        let global_generators = GlobalInitializer::new(types).initialize(&factories, &mut entries)?;
        let exchangeable = ExchangeableSetBuilder::new(types, &settings.exchange).build(&entries);

        let mut order: Vec<SourceType> = universe
            .declarations()
            .iter()
            .map(|d| d.source.clone())
            .collect();
        let mut known: HashSet<SourceType> = order.iter().cloned().collect();
        for (source, _) in entries.iter() {
            if known.insert(source.clone()) {
                order.push(source.clone());
            }
        }

        let mut owners = HashMap::new();
        for (source, entry) in entries.iter() {
            if let Some(data_type) = &entry.data_type {
                owners
                    .entry(data_type.non_nullable())
                    .or_insert_with(|| source.clone());
            }
        }
        let mut references = HashMap::new();
        for data_type in exchangeable.iter() {
            references.insert(data_type.clone(), types.references(data_type));
            if let Some(owner) = types.owner_of(data_type).filter(|o| known.contains(o)) {
                owners.entry(data_type.clone()).or_insert(owner);
            }
        }

        info!(
            types = order.len(),
            registered = entries.len(),
            global_generators = global_generators.len(),
            exchangeable = exchangeable.len(),
            "generation plan ready"
        );

        Ok(Self {
            types: order,
            known,
            entries,
            global_generators,
            exchangeable,
            references,
            owners,
        })
    }

    /// Every resolvable type: the universe in declaration order, then any
    /// type registered on demand.
    pub fn types(&self) -> &[SourceType] {
        &self.types
    }

    /// Whether `source` is part of the universe or was registered.
    pub fn knows(&self, source: &SourceType) -> bool {
        self.known.contains(source)
    }

    pub fn entries(&self) -> &RegistrationMap {
        &self.entries
    }

    /// Frozen registration of `source`.
    pub fn entry(&self, source: &SourceType) -> Option<&RegisteredTypeEntry> {
        self.entries.get(source)
    }

    /// Global generators in factory order.
    pub fn global_generators(&self) -> &GlobalGenerators {
        &self.global_generators
    }

    /// The exchangeable result set.
    pub fn exchangeable(&self) -> &ExchangeableSet {
        &self.exchangeable
    }

    /// Data types directly referenced by an exchangeable data type.
    pub fn references(&self, data_type: &DataType) -> &[DataType] {
        self.references
            .get(&data_type.non_nullable())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The planned type owning an exchangeable data type.
    pub fn owner_of(&self, data_type: &DataType) -> Option<&SourceType> {
        self.owners.get(&data_type.non_nullable())
    }

    /// A fresh resolver with empty caches.
    pub fn resolver(&self) -> ArtifactResolver<'_> {
        ArtifactResolver::new(self)
    }

    /// Resolve every type with a fresh resolver.
    pub fn resolve_all(&self) -> ResolutionReport {
        self.resolver().resolve_all()
    }
}

impl fmt::Debug for GenerationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationPlan")
            .field("types", &self.types)
            .field("entries", &self.entries)
            .field(
                "global_generators",
                &self
                    .global_generators
                    .iter()
                    .map(|g| g.name())
                    .collect::<Vec<_>>(),
            )
            .field("exchangeable", &self.exchangeable)
            .finish()
    }
}
