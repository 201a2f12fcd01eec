//! Generic population engine for evolutionary optimization.
//!
//! Evolves a population of candidate solutions toward a fitness optimum
//! through repeated cycles of truncation selection, mutation and
//! recombination:
//!
//! - **Population engine** ([`population`]): the population type, its
//!   generational operators, the concurrent recombination fan-out, and an
//!   evolve-until-target driver.
//! - **Fitness cache** ([`cache`]): a concurrency-safe memo that chromosome
//!   implementations may share to avoid re-scoring repeated values.
//!
//! # Architecture
//!
//! The engine contains no problem-specific logic. Encodings, fitness
//! functions and operators live in the caller's [`population::Chromosome`]
//! implementation; higher fitness is always better.

pub mod cache;
pub mod population;
