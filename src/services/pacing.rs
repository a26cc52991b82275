// src/services/pacing.rs

//! Randomized delays between and around requests.
//!
//! All randomness in the tracker flows through [`Jitter`], and every wait goes
//! through a [`Sleeper`]. Both are injected so a run can be replayed with a
//! fixed seed and tests can observe pauses without actually sleeping.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{DelayRange, PacingConfig};

/// Why the tracker is waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    /// Politeness delay before every request
    BeforeRequest,
    /// Backoff after HTTP 403
    Forbidden,
    /// Backoff after HTTP 429
    RateLimited,
    /// Backoff after a failed connection
    ConnectFailure,
    /// Delay between two departments
    BetweenDepartments,
}

impl fmt::Display for Pause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Pause::BeforeRequest => "request delay",
            Pause::Forbidden => "blocked backoff",
            Pause::RateLimited => "rate-limit backoff",
            Pause::ConnectFailure => "connection backoff",
            Pause::BetweenDepartments => "department delay",
        };
        f.write_str(label)
    }
}

/// Something that can wait.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, pause: Pause, duration: Duration);
}

/// Real sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, _pause: Pause, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Seedable randomness source.
#[derive(Debug, Clone)]
pub struct Jitter {
    rng: StdRng,
}

impl Jitter {
    /// Jitter seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic jitter for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded when a seed is given, entropy otherwise.
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }

    /// Uniform duration within `range`, millisecond resolution.
    pub fn delay(&mut self, range: DelayRange) -> Duration {
        Duration::from_millis(self.rng.gen_range(range.min_ms..=range.max_ms))
    }

    /// Uniform index into a collection of `len` items. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Uniform address octet in `[1, 255]`.
    pub fn octet(&mut self) -> u8 {
        self.rng.gen_range(1..=255)
    }
}

/// Draws delays from the configured ranges and sleeps them.
pub struct Pacer<S> {
    sleeper: S,
    jitter: Jitter,
    pacing: PacingConfig,
}

impl<S: Sleeper> Pacer<S> {
    pub fn new(sleeper: S, jitter: Jitter, pacing: PacingConfig) -> Self {
        Self {
            sleeper,
            jitter,
            pacing,
        }
    }

    /// Range a given pause is drawn from.
    pub fn range_for(&self, pause: Pause) -> DelayRange {
        match pause {
            Pause::BeforeRequest => self.pacing.request_delay,
            Pause::Forbidden => self.pacing.forbidden_backoff,
            Pause::RateLimited => self.pacing.rate_limited_backoff,
            Pause::ConnectFailure => self.pacing.connect_backoff,
            Pause::BetweenDepartments => self.pacing.department_delay,
        }
    }

    /// Sleep a jittered duration for `pause` and return how long it was.
    pub async fn pause(&mut self, pause: Pause) -> Duration {
        let duration = self.jitter.delay(self.range_for(pause));
        self.sleeper.sleep(pause, duration).await;
        duration
    }

    pub fn jitter_mut(&mut self) -> &mut Jitter {
        &mut self.jitter
    }
}
