//! Effect selection policies

use rand::Rng;

/// How the next effect is chosen from the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Fresh uniform draw on every attempt
    UniformRandom,
    /// Walk the catalog in order, moving on only after a confirmed effect
    RoundRobin,
}

/// Chooses catalog indices
///
/// The round-robin cursor is only moved by [`EffectSelector::advance`], which
/// the arbiter calls after a confirmed effect. A failed attempt therefore
/// retries the same index instead of skipping it.
#[derive(Debug, Clone)]
pub struct EffectSelector {
    policy: SelectionPolicy,
    len: usize,
    next_index: usize,
}

impl EffectSelector {
    /// Create a selector over a catalog of `len` effects
    pub fn new(policy: SelectionPolicy, len: usize) -> Self {
        Self {
            policy,
            len: len.max(1),
            next_index: 0,
        }
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Index of the effect to attempt, always in `0..len`
    pub fn select<G: Rng + ?Sized>(&self, rng: &mut G) -> usize {
        match self.policy {
            SelectionPolicy::UniformRandom => rng.random_range(0..self.len),
            SelectionPolicy::RoundRobin => self.next_index,
        }
    }

    /// Move the round-robin cursor to the next effect.
    ///
    /// No-op for the random policy.
    pub fn advance(&mut self) {
        if self.policy == SelectionPolicy::RoundRobin {
            self.next_index = (self.next_index + 1) % self.len;
        }
    }

    /// Round-robin cursor
    pub fn next_index(&self) -> usize {
        self.next_index
    }
}
