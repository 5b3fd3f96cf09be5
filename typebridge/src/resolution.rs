//! Lazy, cached per-type resolution of artifact descriptors.
//!
//! Resolution happens in two layers. The location layer runs the seed,
//! generator and alias steps through an explicit state machine per type:
//!
//! ```text
//! Unseen -> Resolving -> Resolved
//!                     -> Errored
//! ```
//!
//! Re-entering a `Resolving` type is an alias cycle. The descriptor layer
//! adds the structural step on top of a resolved location; it only needs the
//! locations of referenced types, so mutually referencing records never look
//! like a cycle.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, error, trace};

use crate::attribute::ArtifactAttribute;
use crate::data_type::DataType;
use crate::descriptor::{ArtifactDescriptor, ArtifactImport, ArtifactLocation, DescriptorBuilder};
use crate::error::ResolveError;
use crate::generator::{run_guarded, GeneratorResult};
use crate::plan::GenerationPlan;
use crate::registry::RegisteredTypeEntry;
use crate::types::SourceType;

/// Per-type location state. Absence from the map means `Unseen`.
#[derive(Debug, Clone)]
enum LocationState {
    Resolving,
    Resolved(Arc<ArtifactLocation>),
    Errored(ResolveError),
}

/// What a generator sees while one type is being resolved.
pub struct GenerationContext<'c, 'p> {
    source: &'c SourceType,
    entry: Option<&'p RegisteredTypeEntry>,
    builder: &'c mut DescriptorBuilder,
    resolver: &'c mut ArtifactResolver<'p>,
}

impl<'c, 'p> GenerationContext<'c, 'p> {
    /// The type being resolved.
    pub fn source(&self) -> &SourceType {
        self.source
    }

    /// The registered data type of the type being resolved.
    pub fn data_type(&self) -> Option<&DataType> {
        self.entry.and_then(|entry| entry.data_type.as_ref())
    }

    /// The mutable descriptor of the type being resolved.
    pub fn descriptor(&mut self) -> &mut DescriptorBuilder {
        &mut *self.builder
    }

    /// The frozen plan.
    pub fn plan(&self) -> &'p GenerationPlan {
        self.resolver.plan
    }

    /// Resolve another type's location.
    ///
    /// Asking for a type that is currently being resolved, including the
    /// current one, is reported as a cycle.
    pub fn location_of(
        &mut self,
        other: &SourceType,
    ) -> Result<Arc<ArtifactLocation>, ResolveError> {
        self.resolver.dependency_location(self.source, other)
    }
}

/// Outcome of resolving every type of a plan.
#[derive(Debug, Clone, Default)]
pub struct ResolutionReport {
    /// Successfully resolved descriptors, in plan order.
    pub resolved: Vec<Arc<ArtifactDescriptor>>,
    /// Failed types with their errors, in plan order.
    pub failed: Vec<(SourceType, ResolveError)>,
}

impl ResolutionReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Descriptor of a resolved type.
    pub fn get(&self, source: &SourceType) -> Option<&Arc<ArtifactDescriptor>> {
        self.resolved.iter().find(|d| d.source() == source)
    }
}

/// Resolves artifact descriptors against a frozen [`GenerationPlan`].
///
/// Results are cached for the lifetime of the resolver: resolving a type a
/// second time returns the same `Arc` or the same error.
pub struct ArtifactResolver<'p> {
    plan: &'p GenerationPlan,
    locations: HashMap<SourceType, LocationState>,
    descriptors: HashMap<SourceType, Result<Arc<ArtifactDescriptor>, ResolveError>>,
    stack: Vec<SourceType>,
}

impl<'p> ArtifactResolver<'p> {
    pub fn new(plan: &'p GenerationPlan) -> Self {
        Self {
            plan,
            locations: HashMap::new(),
            descriptors: HashMap::new(),
            stack: Vec::new(),
        }
    }

    /// Resolve the full descriptor of `source`.
    pub fn resolve(
        &mut self,
        source: &SourceType,
    ) -> Result<Arc<ArtifactDescriptor>, ResolveError> {
        if let Some(cached) = self.descriptors.get(source) {
            trace!(type_name = %source, "descriptor cache hit");
            return cached.clone();
        }

        let result = self.build_descriptor(source);
        if let Err(err) = &result {
            error!(type_name = %source, error = %err, "failed to resolve artifact descriptor");
        }
        self.descriptors.insert(source.clone(), result.clone());
        result
    }

    /// Resolve only the location of `source`.
    pub fn location_of(
        &mut self,
        source: &SourceType,
    ) -> Result<Arc<ArtifactLocation>, ResolveError> {
        self.resolve_location(source)
    }

    /// Resolve every type of the plan, collecting each outcome.
    pub fn resolve_all(&mut self) -> ResolutionReport {
        let plan = self.plan;
        let mut report = ResolutionReport::default();
        for source in plan.types() {
            match self.resolve(source) {
                Ok(descriptor) => report.resolved.push(descriptor),
                Err(err) => report.failed.push((source.clone(), err)),
            }
        }
        debug!(
            resolved = report.resolved.len(),
            failed = report.failed.len(),
            "resolved all types"
        );
        report
    }

    fn build_descriptor(
        &mut self,
        source: &SourceType,
    ) -> Result<Arc<ArtifactDescriptor>, ResolveError> {
        let plan = self.plan;
        let location = self.resolve_location(source)?;

        let data_type = plan
            .entry(source)
            .and_then(|entry| entry.data_type.clone())
            .filter(|dt| plan.exchangeable().contains(dt));

        let imports = match &data_type {
            Some(dt) if location.generate => self.structural_imports(source, &location, dt)?,
            _ => Vec::new(),
        };

        Ok(Arc::new(ArtifactDescriptor {
            location: ArtifactLocation::clone(&location),
            data_type,
            imports,
        }))
    }

    /// Artifacts owning the data types referenced by `data_type`.
    ///
    /// References to shapes without an owner (lists, inline unions) are
    /// followed through to whatever owned shapes they contain.
    fn structural_imports(
        &mut self,
        source: &SourceType,
        location: &ArtifactLocation,
        data_type: &DataType,
    ) -> Result<Vec<ArtifactImport>, ResolveError> {
        let plan = self.plan;
        let mut imports = BTreeMap::new();
        let mut seen = HashSet::from([data_type.non_nullable()]);
        let mut queue: Vec<DataType> = plan.references(data_type).to_vec();

        while let Some(next) = queue.pop() {
            let next = next.non_nullable();
            if !plan.exchangeable().contains(&next) || !seen.insert(next.clone()) {
                continue;
            }

            match plan.owner_of(&next) {
                Some(owner) if owner == source => {}
                Some(owner) => {
                    let dependency = self.dependency_location(source, owner)?;
                    if !dependency.same_file(location) {
                        imports.insert(
                            owner.clone(),
                            ArtifactImport {
                                source: owner.clone(),
                                folder: dependency.folder.clone(),
                                file_name: dependency.file_name.clone(),
                                type_name: dependency.type_name.clone(),
                            },
                        );
                    }
                }
                None => queue.extend(plan.references(&next).iter().cloned()),
            }
        }

        Ok(imports.into_values().collect())
    }

    /// Resolve the location of `source`.
    ///
    /// Alias chains are walked with a loop over an explicit chain of prepared
    /// frames, then finished from the tail back to `source`, so alias depth
    /// never becomes call depth.
    fn resolve_location(
        &mut self,
        source: &SourceType,
    ) -> Result<Arc<ArtifactLocation>, ResolveError> {
        if let Some(cached) = self.cached_location(source) {
            return cached;
        }

        if !self.plan.knows(source) {
            let err = ResolveError::UnknownType {
                source_type: source.clone(),
            };
            self.locations.insert(source.clone(), LocationState::Errored(err.clone()));
            return Err(err);
        }

        let mut chain: Vec<(PendingLocation, SourceType)> = Vec::new();
        let mut current = source.clone();
        let mut outcome = loop {
            trace!(type_name = %current, depth = self.stack.len(), "resolving location");
            self.locations.insert(current.clone(), LocationState::Resolving);
            self.stack.push(current.clone());

            let pending = match self.prepare(&current) {
                Ok(pending) => pending,
                Err(err) => break self.leave(&current, Err(err)),
            };
            let Some(target) = pending.alias_target().cloned() else {
                break self.leave(&current, Ok(pending.finish(None)));
            };

            match self.locations.get(&target) {
                Some(LocationState::Resolved(location)) => {
                    let location = Arc::clone(location);
                    break self.leave(&current, Ok(pending.finish(Some(&location))));
                }
                Some(LocationState::Errored(_)) => {
                    let err = ResolveError::Poisoned {
                        source_type: current.clone(),
                        dependency: target,
                    };
                    break self.leave(&current, Err(err));
                }
                Some(LocationState::Resolving) => {
                    let err = self.cycle_error(&target);
                    let err = dependency_error(&current, &target, err);
                    break self.leave(&current, Err(err));
                }
                None => {
                    chain.push((pending, target.clone()));
                    current = target;
                }
            }
        };

        while let Some((pending, target)) = chain.pop() {
            let alias = pending.source().clone();
            let result = match outcome {
                Ok(location) => Ok(pending.finish(Some(&location))),
                Err(err) => Err(dependency_error(&alias, &target, err)),
            };
            outcome = self.leave(&alias, result);
        }
        outcome
    }

    fn cached_location(
        &self,
        source: &SourceType,
    ) -> Option<Result<Arc<ArtifactLocation>, ResolveError>> {
        match self.locations.get(source)? {
            LocationState::Resolved(location) => Some(Ok(Arc::clone(location))),
            LocationState::Errored(err) => Some(Err(err.clone())),
            LocationState::Resolving => Some(Err(self.cycle_error(source))),
        }
    }

    /// Pop `source` off the resolving stack and record its outcome.
    fn leave(
        &mut self,
        source: &SourceType,
        result: Result<Arc<ArtifactLocation>, ResolveError>,
    ) -> Result<Arc<ArtifactLocation>, ResolveError> {
        self.stack.pop();
        match &result {
            Ok(location) => {
                debug!(
                    type_name = %source,
                    path = %location.path(),
                    generate = location.generate,
                    "resolved location"
                );
                self.locations
                    .insert(source.clone(), LocationState::Resolved(Arc::clone(location)));
            }
            Err(err) => {
                error!(type_name = %source, error = %err, "type resolution failed");
                self.locations.insert(source.clone(), LocationState::Errored(err.clone()));
            }
        }
        result
    }

    /// Steps (A) to (C): seed the builder and run every generator.
    fn prepare(&mut self, source: &SourceType) -> Result<PendingLocation, ResolveError> {
        let plan = self.plan;
        let entry = plan.entry(source);

        // (A) seed
        let mut builder =
            DescriptorBuilder::seed(source.clone(), entry.and_then(|e| e.attribute.as_ref()));
        self.check_aliases(source, builder.attribute())?;

        // (B) per-type generators, then (C) global generators
        let mut failed = Vec::new();
        let mut invoked = Vec::new();
        for generator in entry.map(|e| e.generators.as_slice()).unwrap_or_default() {
            invoked.push(generator.name().to_string());
            if !self.invoke(source, entry, &mut builder, generator.name(), |ctx| {
                generator.generate(ctx)
            }) {
                failed.push(generator.name().to_string());
            }
        }
        for generator in plan.global_generators() {
            invoked.push(generator.name().to_string());
            if !self.invoke(source, entry, &mut builder, generator.name(), |ctx| {
                generator.generate(ctx)
            }) {
                failed.push(generator.name().to_string());
            }
        }
        if !failed.is_empty() {
            return Err(ResolveError::GeneratorFailed {
                source_type: source.clone(),
                generators: failed,
            });
        }

        // (D) starts with the final alias targets
        self.check_aliases(source, builder.attribute())?;
        Ok(PendingLocation { builder, invoked })
    }

    /// Run one generator callback. Returns whether it succeeded.
    fn invoke<F>(
        &mut self,
        source: &SourceType,
        entry: Option<&'p RegisteredTypeEntry>,
        builder: &mut DescriptorBuilder,
        name: &str,
        call: F,
    ) -> bool
    where
        F: FnOnce(&mut GenerationContext<'_, 'p>) -> GeneratorResult,
    {
        let depth = self.stack.len();
        let outcome = {
            let mut ctx = GenerationContext {
                source,
                entry,
                builder: &mut *builder,
                resolver: &mut *self,
            };
            run_guarded(|| call(&mut ctx))
        };
        self.unwind_to(depth);

        match outcome {
            Ok(()) => true,
            Err(err) => {
                error!(type_name = %source, generator = name, error = %err, "generator failed");
                false
            }
        }
    }

    /// Location of `dependency` as needed by `source`.
    fn dependency_location(
        &mut self,
        source: &SourceType,
        dependency: &SourceType,
    ) -> Result<Arc<ArtifactLocation>, ResolveError> {
        if let Some(LocationState::Errored(_)) = self.locations.get(dependency) {
            return Err(ResolveError::Poisoned {
                source_type: source.clone(),
                dependency: dependency.clone(),
            });
        }

        self.resolve_location(dependency)
            .map_err(|err| dependency_error(source, dependency, err))
    }

    fn check_aliases(
        &self,
        source: &SourceType,
        attribute: &ArtifactAttribute,
    ) -> Result<(), ResolveError> {
        match attribute.alias_targets().find(|target| !self.plan.knows(target)) {
            Some(target) => Err(ResolveError::DanglingAlias {
                source_type: source.clone(),
                target: target.clone(),
            }),
            None => Ok(()),
        }
    }

    fn cycle_error(&self, reentered: &SourceType) -> ResolveError {
        let start = self
            .stack
            .iter()
            .position(|t| t == reentered)
            .unwrap_or(0);
        let mut cycle = self.stack[start..].to_vec();
        cycle.push(reentered.clone());
        ResolveError::AliasCycle { cycle }
    }

    /// Forget resolutions interrupted by a panicking generator.
    fn unwind_to(&mut self, depth: usize) {
        for abandoned in self.stack.drain(depth..) {
            self.locations.remove(&abandoned);
        }
    }
}

/// A type whose generators have run and whose alias target, if any, is
/// still to be located.
struct PendingLocation {
    builder: DescriptorBuilder,
    invoked: Vec<String>,
}

impl PendingLocation {
    fn source(&self) -> &SourceType {
        self.builder.source()
    }

    /// `same_file_as` wins over `same_folder_as`.
    fn alias_target(&self) -> Option<&SourceType> {
        let attribute = self.builder.attribute();
        attribute.same_file_as().or(attribute.same_folder_as())
    }

    fn finish(self, target: Option<&ArtifactLocation>) -> Arc<ArtifactLocation> {
        let builder = self.builder;
        let (folder, file_name) = match target {
            Some(target) if builder.attribute().same_file_as().is_some() => {
                (target.folder.clone(), target.file_name.clone())
            }
            Some(target) => (target.folder.clone(), builder.file_name()),
            None => (builder.folder(), builder.file_name()),
        };

        Arc::new(ArtifactLocation {
            source: builder.source().clone(),
            folder,
            file_name,
            type_name: builder.type_name(),
            generate: !builder.is_cancelled(),
            generators: self.invoked,
        })
    }
}

/// The error `source` reports when locating `dependency` failed with `err`.
///
/// Members of an alias cycle keep the cycle; everyone else is poisoned.
fn dependency_error(
    source: &SourceType,
    dependency: &SourceType,
    err: ResolveError,
) -> ResolveError {
    match err {
        ResolveError::AliasCycle { cycle } if cycle.contains(source) => {
            ResolveError::AliasCycle { cycle }
        }
        err @ ResolveError::UnknownType { .. } => err,
        _ => ResolveError::Poisoned {
            source_type: source.clone(),
            dependency: dependency.clone(),
        },
    }
}
