//! Generator extension points.
//!
//! Generators customize the artifact descriptor of the types they take part
//! in. Per-type generators are bound to one type through a
//! [`Marker::Generator`](crate::universe::Marker::Generator); global
//! generators are created once per plan by a [`GlobalGeneratorFactory`] and
//! run for every type.
//!
//! A generator fails by returning an error or by panicking. Either way the
//! failure is logged and counted against the type being resolved; it never
//! propagates to the caller.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::GeneratorError;
use crate::passes::initializer::Registrar;
use crate::resolution::GenerationContext;

/// Result type for generator callbacks.
pub type GeneratorResult<T = ()> = Result<T, GeneratorError>;

/// Generation logic bound to a single source type.
pub trait TypeGenerator: Send + Sync {
    /// Name used in diagnostics and descriptors.
    fn name(&self) -> &str;

    /// Adjust the descriptor of the type being resolved.
    fn generate(&self, ctx: &mut GenerationContext<'_, '_>) -> GeneratorResult;
}

/// Generation logic that takes part in every type's resolution.
pub trait GlobalGenerator: Send + Sync {
    /// Name used in diagnostics and descriptors.
    fn name(&self) -> &str;

    /// Adjust the descriptor of the type being resolved.
    fn generate(&self, ctx: &mut GenerationContext<'_, '_>) -> GeneratorResult;
}

/// Creates a global generator, registering any types it needs on the way.
pub trait GlobalGeneratorFactory: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Instantiate the generator.
    fn create(&self, registrar: &mut Registrar<'_>) -> GeneratorResult<Box<dyn GlobalGenerator>>;
}

/// Run a generator callback, converting a panic into a [`GeneratorError`].
pub(crate) fn run_guarded<T>(f: impl FnOnce() -> GeneratorResult<T>) -> GeneratorResult<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(GeneratorError::new(format!(
            "panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}
