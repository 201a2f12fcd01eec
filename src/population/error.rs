//! Engine errors.

use super::config::ConfigError;

/// Errors raised while building or evolving a population.
///
/// Every variant is fatal for the generation that raised it. A generation
/// that merely fails to improve the best fitness is not an error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvolutionError {
    #[error("invalid population configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("recombination needs at least 2 chromosomes, population has {len}")]
    InsufficientPopulation { len: usize },
    #[error("generation deadline expired with {received} of {expected} offspring received")]
    GenerationTimedOut { received: usize, expected: usize },
    #[error("recombination workers stopped with {received} of {expected} offspring delivered")]
    WorkersLost { received: usize, expected: usize },
}
