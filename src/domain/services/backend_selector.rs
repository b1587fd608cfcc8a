//! Backend Selector
//!
//! Picks which backend a direct query goes to. Selection is uniform so that
//! repeated direct queries spread across every backend of a hostgroup, which
//! is what makes proxy-vs-direct result comparisons meaningful.

use crate::domain::entities::BackendCandidate;
use rand::seq::SliceRandom;
use rand::Rng;

pub struct BackendSelector;

impl BackendSelector {
    /// Pick one candidate uniformly at random.
    ///
    /// Returns None if there are no candidates.
    pub fn pick(candidates: &[BackendCandidate]) -> Option<BackendCandidate> {
        Self::pick_with(candidates, &mut rand::thread_rng())
    }

    /// Same as [`pick`](Self::pick) with a caller-supplied RNG.
    pub fn pick_with<R: Rng + ?Sized>(
        candidates: &[BackendCandidate],
        rng: &mut R,
    ) -> Option<BackendCandidate> {
        candidates.choose(rng).cloned()
    }
}
