//! The four sequential setup passes.
//!
//! 1. [`loader`]: configured overrides seed the registration map.
//! 2. [`scanner`]: code-declared markers are merged in, global factories collected.
//! 3. [`initializer`]: global generators are created and may register more types.
//! 4. [`exchangeable`]: the exchangeable result set is computed from the frozen map.
//!
//! Each pass consumes the previous pass's output. Later passes override earlier
//! per-field decisions, so the order is fixed.

pub mod exchangeable;
pub mod initializer;
pub mod loader;
pub mod scanner;

pub use exchangeable::ExchangeableSetBuilder;
pub use initializer::{AttributeMutator, GlobalGenerators, GlobalInitializer, Registrar};
pub use loader::ConfigurationLoader;
pub use scanner::{AttributeScanner, DiscoveredFactories};
