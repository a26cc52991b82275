// src/services/identity.rs

//! Request identity rotation.

use std::net::Ipv4Addr;

use crate::error::{AppError, Result};
use crate::models::IdentityProfile;
use crate::services::Jitter;

/// Fixed pool of client identities. Read-only once built.
#[derive(Debug, Clone)]
pub struct IdentityPool {
    identities: Vec<IdentityProfile>,
}

impl IdentityPool {
    /// Build a pool; at least one identity is required.
    pub fn new(identities: Vec<IdentityProfile>) -> Result<Self> {
        if identities.is_empty() {
            return Err(AppError::config("identity pool needs at least one profile"));
        }
        Ok(Self { identities })
    }

    /// Pick one identity uniformly at random. No affinity between calls.
    pub fn select(&self, jitter: &mut Jitter) -> &IdentityProfile {
        &self.identities[jitter.index(self.identities.len())]
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

/// Per-request forwarded-address headers, freshly randomized each time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpoofedOrigin {
    forwarded_for: Ipv4Addr,
    real_ip: Ipv4Addr,
    connecting_ip: Ipv4Addr,
}

impl SpoofedOrigin {
    pub fn random(jitter: &mut Jitter) -> Self {
        let mut addr = || {
            Ipv4Addr::new(jitter.octet(), jitter.octet(), jitter.octet(), jitter.octet())
        };
        Self {
            forwarded_for: addr(),
            real_ip: addr(),
            connecting_ip: addr(),
        }
    }

    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("x-forwarded-for", self.forwarded_for.to_string()),
            ("x-real-ip", self.real_ip.to_string()),
            ("cf-connecting-ip", self.connecting_ip.to_string()),
        ]
    }
}
