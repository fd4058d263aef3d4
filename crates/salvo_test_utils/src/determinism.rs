//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a game produces identical results
//! given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays, snapshots and the server's authority all rest on the phase
//! machine being 100% deterministic. Sources of non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`salvo_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Players, entities and pending actions live in ordered collections.
//!
//! - **System randomness**: Every die comes from the injected roller, and
//!   the seeded roller's stream position is part of every snapshot.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Scripted dice pin every roll of a single rule
//! 2. **Property tests**: Random seeds and paths must still replay exactly
//! 3. **Integration tests**: Whole scenarios are reproducible
//! 4. **Parallel tests**: Running N games on N threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use salvo_core::dice::SeededDice;
use salvo_core::game::Game;
use salvo_core::replay::ReplayInput;
use salvo_core::snapshot::Snapshot;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps applied per run.
    pub steps: usize,
}

impl DeterminismResult {
    fn from_hashes(hashes: Vec<u64>, steps: usize) -> Self {
        Self {
            is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
            hashes,
            steps,
        }
    }

    /// Get all unique hashes (should be 1 for a deterministic game).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Game is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a stepped process multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to apply step `i`
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: usize,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, usize),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for i in 0..steps {
            step(&mut state, i);
        }

        hashes.push(hash(&state));
    }

    DeterminismResult::from_hashes(hashes, steps)
}

/// Feed the same inputs to `runs` freshly built games and compare final
/// state hashes.
///
/// # Example
///
/// ```ignore
/// use salvo_test_utils::{determinism, fixtures};
///
/// let mut game = fixtures::duel();
/// let inputs = fixtures::play_until_round(&mut game, 4);
/// determinism::verify_game_determinism(3, fixtures::duel, &inputs)
///     .assert_deterministic();
/// ```
pub fn verify_game_determinism<F>(runs: usize, setup: F, inputs: &[ReplayInput]) -> DeterminismResult
where
    F: Fn() -> Game<SeededDice>,
{
    verify_determinism(
        runs,
        inputs.len(),
        setup,
        |game: &mut Game<SeededDice>, i| {
            inputs[i].apply(game);
        },
        |game: &Game<SeededDice>| game.state_hash(),
    )
}

/// Result of parallel game runs.
#[derive(Debug, Clone)]
pub struct ParallelRunResult {
    /// Final state hash from each game.
    pub hashes: Vec<u64>,
    /// Number of inputs applied to each game.
    pub inputs: usize,
    /// Number of games run.
    pub num_games: usize,
}

impl ParallelRunResult {
    /// Check if all games produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all games matched.
    ///
    /// # Panics
    ///
    /// Panics if games produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel games diverged!\n\
                 Games: {}\n\
                 Inputs: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_games,
                self.inputs,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run N games on scoped threads and collect their final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling
/// variations or different memory layouts.
///
/// # Panics
///
/// Panics if a game thread panics.
pub fn run_parallel_games<F>(setup: F, num_games: usize, inputs: &[ReplayInput]) -> ParallelRunResult
where
    F: Fn() -> Game<SeededDice> + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_games)
            .map(|_| {
                s.spawn(|| {
                    let mut game = setup();
                    for input in inputs {
                        input.apply(&mut game);
                    }
                    game.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("game thread panicked"))
            .collect()
    });

    ParallelRunResult {
        hashes,
        inputs: inputs.len(),
        num_games,
    }
}

/// Compare two games input by input, finding the first divergence.
///
/// # Returns
///
/// `None` if the games stay identical, `Some(n)` if they differ after the
/// `n`-th input (0 meaning they already differ before any input).
pub fn find_first_divergence<F>(setup: F, inputs: &[ReplayInput]) -> Option<usize>
where
    F: Fn() -> Game<SeededDice>,
{
    let mut a = setup();
    let mut b = setup();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for (i, input) in inputs.iter().enumerate() {
        let events_a = input.apply(&mut a);
        let events_b = input.apply(&mut b);

        if events_a != events_b || a.state_hash() != b.state_hash() {
            tracing::debug!(input = i + 1, ?input, "games diverged");
            return Some(i + 1);
        }
    }

    None
}

/// Verify that a snapshot taken partway through a game continues exactly
/// like the original.
///
/// Applies the first `split` inputs, round-trips a snapshot through
/// bincode, then feeds the remaining inputs to both the original and the
/// restored game. Returns `true` if they end identical.
pub fn verify_snapshot_determinism<F>(setup: F, inputs: &[ReplayInput], split: usize) -> bool
where
    F: Fn() -> Game<SeededDice>,
{
    let mut original = setup();
    let split = split.min(inputs.len());
    for input in &inputs[..split] {
        input.apply(&mut original);
    }

    let restored = original
        .snapshot()
        .to_bytes()
        .and_then(|bytes| Snapshot::<SeededDice>::from_bytes(&bytes))
        .and_then(|snapshot| Game::from_snapshot(snapshot, original.catalog_handle()));
    let Ok(mut restored) = restored else {
        return false;
    };
    if restored.state_hash() != original.state_hash() {
        return false;
    }

    for input in &inputs[split..] {
        let a = input.apply(&mut original);
        let b = input.apply(&mut restored);
        if a != b {
            return false;
        }
    }
    original.state_hash() == restored.state_hash() && original.dice() == restored.dice()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
