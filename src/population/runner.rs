//! Driver loop: evolve until a target fitness is reached.
//!
//! [`EvolutionRunner`] repeatedly calls [`Population::evolve`] and stops as
//! soon as the best chromosome reaches the caller's target, a limit is hit,
//! or the run is cancelled.

use super::engine::Population;
use super::error::EvolutionError;
use super::types::{Chromosome, Score};
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Optional stopping conditions besides the target fitness.
///
/// The default imposes no limit: the run continues until the target is
/// reached or the run is cancelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunLimits {
    /// Maximum number of generations.
    pub max_generations: Option<usize>,

    /// Wall-clock limit in milliseconds, checked before each generation.
    pub time_limit_ms: Option<u64>,
}

impl RunLimits {
    /// Sets the maximum number of generations.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = Some(n);
        self
    }

    /// Sets the wall-clock limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }
}

/// Snapshot reported after every generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationStats {
    /// Generation number, starting at 1.
    pub generation: usize,

    /// Fitness of the best chromosome.
    pub best_fitness: f64,

    /// Fitness of the worst surviving chromosome.
    pub worst_fitness: f64,

    /// Population size after the final sort.
    pub population_size: usize,
}

impl GenerationStats {
    fn of<C: Chromosome>(population: &Population<C>) -> Option<Self> {
        let best = population.best_fit()?;
        let worst = population.worst_fit()?;
        Some(Self {
            generation: population.generation(),
            best_fitness: best.fitness().to_f64(),
            worst_fitness: worst.fitness().to_f64(),
            population_size: population.len(),
        })
    }
}

/// Result of a driver run.
#[derive(Debug, Clone)]
pub struct EvolutionResult<C: Chromosome> {
    /// The best chromosome at the end of the run.
    pub best: C,

    /// Best fitness (same as `best.fitness()`).
    pub best_fitness: C::Score,

    /// Number of generations executed by this run.
    pub generations: usize,

    /// Whether the best fitness reached the target.
    pub reached_target: bool,

    /// Whether the run was cancelled externally.
    pub cancelled: bool,

    /// Best fitness before the first generation and after each one.
    pub fitness_history: Vec<f64>,
}

/// Executes the evolve-until-optimum loop.
///
/// # Usage
///
/// ```ignore
/// let mut population = Population::from_factory(config, 10_000, RandomString::random)?;
/// let result = EvolutionRunner::run(&mut population, 0, &RunLimits::default())?;
/// println!("found champion after {} generations", result.generations);
/// ```
pub struct EvolutionRunner;

impl EvolutionRunner {
    /// Evolves `population` until its best fitness is at least `target`.
    pub fn run<C: Chromosome + Clone>(
        population: &mut Population<C>,
        target: C::Score,
        limits: &RunLimits,
    ) -> Result<EvolutionResult<C>, EvolutionError> {
        Self::run_observed(population, target, limits, None, |_, _| {})
    }

    /// Evolves `population` with an optional cancellation flag and a
    /// per-generation observer.
    ///
    /// The observer receives the generation's statistics and the sorted
    /// population, so it can report the best chromosome. If `cancel` is set
    /// to `true`, the run stops before the next generation starts.
    ///
    /// # Errors
    ///
    /// Any [`EvolutionError`] from a generation ends the run; there is no
    /// partial-generation recovery.
    pub fn run_observed<C, F>(
        population: &mut Population<C>,
        target: C::Score,
        limits: &RunLimits,
        cancel: Option<Arc<AtomicBool>>,
        mut on_generation: F,
    ) -> Result<EvolutionResult<C>, EvolutionError>
    where
        C: Chromosome + Clone,
        F: FnMut(&GenerationStats, &Population<C>),
    {
        let started = Instant::now();
        let time_limit = limits.time_limit_ms.map(Duration::from_millis);

        population.sort();
        let mut best_fitness = current_best(population)?;
        let mut fitness_history = vec![best_fitness.to_f64()];
        let mut reached_target = reaches(best_fitness, target);
        let mut generations = 0usize;
        let mut cancelled = false;

        while !reached_target {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }
            }
            if limits.max_generations.is_some_and(|max| generations >= max) {
                break;
            }
            if time_limit.is_some_and(|limit| started.elapsed() >= limit) {
                break;
            }

            population.evolve()?;
            generations += 1;

            best_fitness = current_best(population)?;
            fitness_history.push(best_fitness.to_f64());
            if let Some(stats) = GenerationStats::of(population) {
                on_generation(&stats, &*population);
            }
            reached_target = reaches(best_fitness, target);
        }

        if reached_target {
            log::info!("found champion after {generations} generations");
        }

        let best = population
            .best_fit()
            .cloned()
            .ok_or(EvolutionError::InsufficientPopulation { len: 0 })?;

        Ok(EvolutionResult {
            best,
            best_fitness,
            generations,
            reached_target,
            cancelled,
            fitness_history,
        })
    }
}

fn current_best<C: Chromosome>(population: &Population<C>) -> Result<C::Score, EvolutionError> {
    population
        .best_fit()
        .map(|best| best.fitness())
        .ok_or(EvolutionError::InsufficientPopulation {
            len: population.len(),
        })
}

fn reaches<S: Score>(fitness: S, target: S) -> bool {
    fitness.total_cmp(&target) != CmpOrdering::Less
}

// ============================================================================
// Tests
// ============================================================================
