//! Permutation sources used by the session builder.
//!
//! Every random choice the core makes goes through [`Shuffler`], so tests can
//! swap in a fixed permutation and assert exact layouts.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Source of permutations of `0..len`.
pub trait Shuffler {
    /// Return a permutation of `0..len`. Element `i` of the result names the
    /// input position that lands in output position `i`.
    fn permutation(&mut self, len: usize) -> Vec<usize>;
}

/// Uniform Fisher-Yates permutations drawn from an [`Rng`].
pub struct RandomShuffler<R> {
    rng: R,
}

impl<R: Rng> RandomShuffler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomShuffler<StdRng> {
    /// A reproducible shuffler; the same seed yields the same sessions.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// A shuffler seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> Shuffler for RandomShuffler<R> {
    fn permutation(&mut self, len: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..len).collect();
        order.shuffle(&mut self.rng);
        order
    }
}

/// Always returns the identity permutation.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityShuffler;

impl Shuffler for IdentityShuffler {
    fn permutation(&mut self, len: usize) -> Vec<usize> {
        (0..len).collect()
    }
}

/// Replays a queue of prepared permutations, then falls back to identity.
#[derive(Debug, Default, Clone)]
pub struct ScriptedShuffler {
    queue: VecDeque<Vec<usize>>,
}

impl ScriptedShuffler {
    pub fn new(permutations: impl IntoIterator<Item = Vec<usize>>) -> Self {
        Self {
            queue: permutations.into_iter().collect(),
        }
    }
}

impl Shuffler for ScriptedShuffler {
    fn permutation(&mut self, len: usize) -> Vec<usize> {
        self.queue.pop_front().unwrap_or_else(|| (0..len).collect())
    }
}

impl<F> Shuffler for F
where
    F: FnMut(usize) -> Vec<usize>,
{
    fn permutation(&mut self, len: usize) -> Vec<usize> {
        self(len)
    }
}

/// Whether `perm` is a permutation of `0..len`.
pub fn is_permutation(perm: &[usize], len: usize) -> bool {
    if perm.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &i in perm {
        if i >= len || seen[i] {
            return false;
        }
        seen[i] = true;
    }
    true
}
