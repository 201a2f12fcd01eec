//! Core trait definitions for the population engine.
//!
//! [`Chromosome`] is the contract between the generic engine and a
//! problem-specific solution representation. [`Score`] is the fitness type
//! a chromosome reports.

use rand::Rng;
use std::cmp::Ordering;

/// Marker trait for fitness scores.
///
/// Scores must be cheaply copyable and totally ordered. **Higher is better**:
/// the engine always keeps the maximum. For minimization problems, negate the
/// cost (a perfect solution then scores `0`).
///
/// Built-in implementations exist for the signed integer types, `f32` and
/// `f64`. Floats are ordered with IEEE 754 `totalOrder`, so `NaN` never
/// breaks a sort.
pub trait Score: PartialOrd + Copy + Send + Sync + std::fmt::Debug + 'static {
    /// Total ordering used by the engine when sorting.
    fn total_cmp(&self, other: &Self) -> Ordering;

    /// Converts the score to `f64` for logging and statistics.
    fn to_f64(self) -> f64;
}

macro_rules! impl_integer_score {
    ($($t:ty),*) => {
        $(
            impl Score for $t {
                fn total_cmp(&self, other: &Self) -> Ordering {
                    self.cmp(other)
                }

                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_integer_score!(i8, i16, i32, i64, isize);

impl Score for f64 {
    fn total_cmp(&self, other: &Self) -> Ordering {
        f64::total_cmp(self, other)
    }

    fn to_f64(self) -> f64 {
        self
    }
}

impl Score for f32 {
    fn total_cmp(&self, other: &Self) -> Ordering {
        f32::total_cmp(self, other)
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

/// A candidate solution evolved by a [`Population`](super::Population).
///
/// Chromosomes are immutable values: both operators return a **new**
/// chromosome and leave the receiver (and the peer) untouched. Recombination
/// runs on several threads at once, hence the `Send + Sync` bound.
///
/// # Contract
///
/// - [`fitness`](Chromosome::fitness) is a pure function of the value.
///   Implementations may memoize it (see [`FitnessCache`](crate::cache::FitnessCache)),
///   but the cache must tolerate concurrent readers.
/// - [`recombine`](Chromosome::recombine) yields exactly one offspring of the
///   same representation. Recombining a chromosome with itself is legal.
/// - [`mutate`](Chromosome::mutate) never fails and returns a different value.
///
/// A panic inside any operator is a programming error; it propagates out of
/// the engine and aborts the run.
///
/// # Implementing
///
/// ```ignore
/// #[derive(Clone)]
/// struct Bits(Vec<bool>);
///
/// impl Chromosome for Bits {
///     type Score = i32;
///
///     fn fitness(&self) -> i32 {
///         self.0.iter().filter(|&&b| b).count() as i32
///     }
///
///     fn recombine<R: Rng>(&self, peer: &Self, rng: &mut R) -> Self {
///         let split = rng.random_range(0..self.0.len());
///         let mut bits = self.0[..split].to_vec();
///         bits.extend_from_slice(&peer.0[split..]);
///         Bits(bits)
///     }
///
///     fn mutate<R: Rng>(&self, rng: &mut R) -> Self {
///         Bits((0..self.0.len()).map(|_| rng.random_bool(0.5)).collect())
///     }
/// }
/// ```
pub trait Chromosome: Send + Sync + Sized {
    /// The fitness type. Must implement [`Score`].
    type Score: Score;

    /// Returns the fitness of this chromosome. Higher is better.
    fn fitness(&self) -> Self::Score;

    /// Produces one offspring from `self` and `peer`.
    ///
    /// The split or blend policy (e.g. a single crossover point) belongs to
    /// the implementation.
    fn recombine<R: Rng>(&self, peer: &Self, rng: &mut R) -> Self;

    /// Produces a mutated variant.
    ///
    /// May be an entirely new random chromosome or a perturbation of `self`.
    fn mutate<R: Rng>(&self, rng: &mut R) -> Self;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_ordering() {
        assert_eq!(Score::total_cmp(&5i32, &3), Ordering::Greater);
        assert_eq!(Score::total_cmp(&-2i16, &-2), Ordering::Equal);
        assert_eq!(Score::total_cmp(&i64::MIN, &0), Ordering::Less);
    }

    #[test]
    fn test_float_nan_is_ordered() {
        // totalOrder puts positive NaN above every number
        assert_eq!(Score::total_cmp(&f64::NAN, &f64::INFINITY), Ordering::Greater);
        assert_eq!(Score::total_cmp(&1.0f32, &2.0), Ordering::Less);
    }

    #[test]
    fn test_to_f64() {
        assert_eq!(Score::to_f64(-825i16), -825.0);
        assert_eq!(Score::to_f64(0.5f32), 0.5);
    }
}
