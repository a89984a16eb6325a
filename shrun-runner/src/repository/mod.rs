//! Repository layer
//!
//! Repositories own stored scripts. The batch orchestrator only ever reads
//! from them; creation and removal exist for the front-ends that load scripts.
//!
//! All repositories are trait-based to enable testing and substitution.

mod scripts;

// Re-export traits
pub use scripts::ScriptRepository;

// Re-export implementations
pub use scripts::InMemoryScriptRepository;

pub use scripts::RepositoryError;
