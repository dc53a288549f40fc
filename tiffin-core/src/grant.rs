//! Grants recording that an identifier recently passed a challenge.
//!
//! A grant carries no payload and does not expire on its own; it lives until
//! a privileged action consumes it or the process exits.

use dashmap::DashSet;
use std::sync::Arc;

/// Process-wide set of granted identifiers.
///
/// Cloning is cheap and every clone shares the same grants.
#[derive(Debug, Clone, Default)]
pub struct GrantStore {
    grants: Arc<DashSet<String>>,
}

impl GrantStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `identifier` as granted. Granting twice is the same as granting once.
    pub fn grant(&self, identifier: &str) {
        self.grants.insert(identifier.to_string());
        metrics::increment_counter!("tiffin_grants_issued");
        tracing::debug!(identifier, "Recorded verification grant");
    }

    /// Spend the grant for `identifier`.
    ///
    /// Call this before the privileged action runs, not after: the grant is
    /// spent by the attempt, whatever the outcome of the action.
    pub fn consume(&self, identifier: &str) -> bool {
        let consumed = self.grants.remove(identifier).is_some();

        if consumed {
            metrics::increment_counter!("tiffin_grants_consumed");
            tracing::debug!(identifier, "Consumed verification grant");
        }

        consumed
    }

    /// Check for a grant without spending it.
    pub fn is_granted(&self, identifier: &str) -> bool {
        self.grants.contains(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    #[test]
    fn test_grant_consumed_once() {
        let grants = GrantStore::new();
        grants.grant("b@x.com");

        assert!(grants.consume("b@x.com"));
        assert!(!grants.consume("b@x.com"));
    }

    #[test]
    fn test_consume_without_grant() {
        let grants = GrantStore::new();

        assert!(!grants.consume("b@x.com"));
        assert!(!grants.is_granted("b@x.com"));
    }

    #[test]
    fn test_grant_is_idempotent() {
        let grants = GrantStore::new();
        grants.grant("b@x.com");
        grants.grant("b@x.com");

        assert!(grants.consume("b@x.com"));
        assert!(!grants.consume("b@x.com"));
    }

    #[test]
    fn test_is_granted_does_not_spend() {
        let grants = GrantStore::new();
        grants.grant("b@x.com");

        assert!(grants.is_granted("b@x.com"));
        assert!(grants.is_granted("b@x.com"));
        assert!(grants.consume("b@x.com"));
        assert!(!grants.is_granted("b@x.com"));
    }

    #[test]
    fn test_clones_share_grants() {
        let grants = GrantStore::new();
        let other = grants.clone();
        grants.grant("b@x.com");

        assert!(other.consume("b@x.com"));
        assert!(!grants.is_granted("b@x.com"));
    }

    #[test]
    fn test_concurrent_consume_has_single_winner() {
        const CALLERS: usize = 16;

        let grants = GrantStore::new();

        for _ in 0..200 {
            grants.grant("b@x.com");

            let barrier = Barrier::new(CALLERS);
            let results: Vec<bool> = std::thread::scope(|scope| {
                let handles: Vec<_> = (0..CALLERS)
                    .map(|_| {
                        scope.spawn(|| {
                            barrier.wait();
                            grants.consume("b@x.com")
                        })
                    })
                    .collect();

                handles
                    .into_iter()
                    .map(|handle| handle.join().unwrap())
                    .collect()
            });

            assert_eq!(results.iter().filter(|consumed| **consumed).count(), 1);
            assert!(!grants.is_granted("b@x.com"));
        }
    }
}
