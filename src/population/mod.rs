//! Population engine.
//!
//! A generic, domain-agnostic evolution engine. Users describe their
//! candidate solutions by implementing [`Chromosome`]; the engine owns a
//! [`Population`] of them and advances it one generation at a time with
//! truncation selection, additive mutation of the fittest prefix, and
//! concurrent recombination.
//!
//! # Generation
//!
//! 1. **Sort**: descending fitness, truncated to `max_population`
//! 2. **Mutate**: one mutant per chromosome of the best-fit prefix
//! 3. **Recombine**: `floor(len * repopulation_rate)` offspring, one task each,
//!    collected through a bounded channel before the generation continues
//! 4. **Kill** (opt-in): random removal of a `death_rate` fraction
//! 5. **Sort**
//!
//! # Key Types
//!
//! - [`PopulationConfig`]: engine constants (cap, rates, composition policy)
//! - [`Population`]: the current generation and its operators
//! - [`EvolutionRunner`]: evolve-until-target driver loop
//! - [`EvolutionError`]: failures that end a generation

mod config;
mod engine;
mod error;
mod fanout;
mod runner;
mod types;

pub use config::{Composition, ConfigError, PopulationConfig};
pub use engine::Population;
pub use error::EvolutionError;
pub use runner::{EvolutionResult, EvolutionRunner, GenerationStats, RunLimits};
pub use types::{Chromosome, Score};
