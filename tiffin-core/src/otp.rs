//! In-memory store of pending one-time passcode challenges.
//!
//! Every identifier has at most one pending challenge. A challenge leaves the
//! store when it is verified, when it expires, or when a newer challenge is
//! issued for the same identifier. Expiry is checked against the clock on
//! every lookup; the background reclaim only frees memory.

use crate::passcode::Passcode;
use dashmap::DashMap;
use std::{
    sync::{Arc, Weak},
    time::Duration,
};
use tokio::time::Instant;

#[derive(Debug)]
struct Challenge {
    secret: Passcode,
    expires_at: Instant,
}

impl Challenge {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Process-wide store of pending challenges, keyed by identifier (email).
///
/// Cloning is cheap and every clone shares the same challenges.
#[derive(Debug, Clone, Default)]
pub struct OtpStore {
    challenges: Arc<DashMap<String, Challenge>>,
}

impl OtpStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new challenge for `identifier`, valid for `ttl`.
    ///
    /// Replaces any challenge already pending for that identifier. The
    /// returned passcode is the only copy handed out; delivering it is up
    /// to the caller.
    pub fn issue(&self, identifier: &str, ttl: Duration) -> Passcode {
        let secret = Passcode::generate();
        self.store(identifier, secret.clone(), ttl);
        secret
    }

    pub(crate) fn store(&self, identifier: &str, secret: Passcode, ttl: Duration) {
        let expires_at = Instant::now() + ttl;

        let replaced = self
            .challenges
            .insert(identifier.to_string(), Challenge { secret, expires_at })
            .is_some();

        metrics::increment_counter!("tiffin_otp_challenges_issued");
        tracing::debug!(identifier, ?ttl, replaced, "Issued verification challenge");

        self.schedule_reclaim(identifier, expires_at);
    }

    /// Check `candidate` against the challenge pending for `identifier`.
    ///
    /// Returns `true` at most once per issued challenge: a match removes the
    /// challenge in the same step. Absent, expired and mismatched challenges
    /// all return `false` and leave the store untouched.
    pub fn verify(&self, identifier: &str, candidate: &str) -> bool {
        let now = Instant::now();

        let verified = self
            .challenges
            .remove_if(identifier, |_, challenge| {
                !challenge.is_expired(now) && challenge.secret.matches(candidate)
            })
            .is_some();

        if verified {
            metrics::increment_counter!("tiffin_otp_challenges_verified");
            tracing::debug!(identifier, "Verification challenge passed");
        } else {
            metrics::increment_counter!("tiffin_otp_challenges_failed");
            tracing::debug!(identifier, "Verification challenge failed");
        }

        verified
    }

    /// Whether `identifier` currently has an unexpired challenge.
    pub fn is_pending(&self, identifier: &str) -> bool {
        let now = Instant::now();
        self.challenges
            .get(identifier)
            .map(|challenge| !challenge.is_expired(now))
            .unwrap_or_default()
    }

    /// Number of challenges held, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    /// Whether the store holds no challenges at all.
    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }

    fn schedule_reclaim(&self, identifier: &str, expires_at: Instant) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::trace!(identifier, "No runtime for reclaiming, relying on lookup expiry");
            return;
        };

        let challenges = Arc::downgrade(&self.challenges);
        let identifier = identifier.to_string();

        runtime.spawn(async move {
            tokio::time::sleep_until(expires_at).await;
            reclaim(challenges, &identifier);
        });
    }
}

/// Drop the challenge for `identifier` if it is still there and has expired.
///
/// By the time this runs the challenge may have been verified or replaced by
/// a newer one; both leave nothing to do.
fn reclaim(challenges: Weak<DashMap<String, Challenge>>, identifier: &str) {
    let Some(challenges) = challenges.upgrade() else {
        return;
    };

    let now = Instant::now();
    if challenges
        .remove_if(identifier, |_, challenge| challenge.is_expired(now))
        .is_some()
    {
        tracing::trace!(identifier, "Reclaimed expired verification challenge");
    }
}
