//! Service layer for the tracker.
//!
//! This module contains the polling client:
//! - Request identity rotation (`IdentityPool`, `SpoofedOrigin`)
//! - Delay jitter and sleeping (`Jitter`, `Pacer`, `Sleeper`)
//! - The HTTP seam (`CountTransport`, `HttpTransport`)
//! - The retry state machine (`RetryingFetcher`)

mod fetcher;
mod identity;
mod pacing;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use fetcher::{RetryingFetcher, Verdict, classify, parse_total};
pub use identity::{IdentityPool, SpoofedOrigin};
pub use pacing::{Jitter, Pacer, Pause, Sleeper, TokioSleeper};
pub use transport::{CountRequest, CountTransport, HttpTransport, RawResponse, TransportError};
