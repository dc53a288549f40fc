//! Server setup for local development & easier integration testing

use super::{AccountStore, ServerSetup, VerificationCodeSender};
use crate::models::user::{AccountExists, NewUser, User};
use anyhow::Result;
use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::{
    atomic::{AtomicI32, Ordering},
    Arc,
};

/// Implementation of `ServerSetup` for local environments.
/// This allows you to run the server without postgres or a mail provider.
#[derive(Debug, Clone)]
pub struct LocalSetup;

impl ServerSetup for LocalSetup {
    type AccountStore = InMemoryAccountStore;
    type VerificationCodeSender = LogCodeSender;
}

/// A `VerificationCodeSender` that doesn't actually send emails,
/// but instead logs them via tracing.
#[derive(Debug, Clone, Default)]
pub struct LogCodeSender;

#[async_trait]
impl VerificationCodeSender for LogCodeSender {
    async fn send_code(&self, email: &str, code: &str) -> Result<()> {
        tracing::info!(email, code, "verification code (not emailed in local setup)");
        Ok(())
    }
}

/// An `AccountStore` keeping users in process memory, keyed by email.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountStore {
    inner: Arc<State>,
}

#[derive(Debug, Default)]
struct State {
    next_id: AtomicI32,
    users: DashMap<String, User>,
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.inner.users.get(email).map(|user| user.value().clone()))
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        match self.inner.users.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AccountExists.into()),
            Entry::Vacant(entry) => {
                let now = chrono::Utc::now().naive_utc();
                let record = User {
                    id: self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1,
                    email: user.email,
                    full_name: user.full_name,
                    phone_number: user.phone_number,
                    password_hash: user.password_hash,
                    is_verified: user.is_verified,
                    inserted_at: now,
                    updated_at: now,
                };
                entry.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<bool> {
        let Some(mut user) = self.inner.users.get_mut(email) else {
            return Ok(false);
        };

        user.password_hash = password_hash.to_string();
        user.updated_at = chrono::Utc::now().naive_utc();

        Ok(true)
    }

    async fn list(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self
            .inner
            .users
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        users.sort_by_key(|user| user.id);
        Ok(users)
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use testresult::TestResult;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            full_name: "Oedipa Maas".to_string(),
            phone_number: "555-0100".to_string(),
            password_hash: "hash".to_string(),
            is_verified: true,
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_create_and_find() -> TestResult {
        let store = InMemoryAccountStore::default();
        let created = store.create(new_user("oedipa@trystero.com")).await?;

        let found = store.find_by_email("oedipa@trystero.com").await?;

        assert_eq!(found.map(|user| user.id), Some(created.id));
        assert_matches!(store.find_by_email("nobody@trystero.com").await?, None);

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_duplicate_email_is_rejected() -> TestResult {
        let store = InMemoryAccountStore::default();
        store.create(new_user("oedipa@trystero.com")).await?;

        let err = store
            .create(new_user("oedipa@trystero.com"))
            .await
            .unwrap_err();

        assert!(err.downcast_ref::<AccountExists>().is_some());

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_update_password() -> TestResult {
        let store = InMemoryAccountStore::default();
        store.create(new_user("oedipa@trystero.com")).await?;

        assert!(store.update_password("oedipa@trystero.com", "new").await?);
        assert!(!store.update_password("nobody@trystero.com", "new").await?);

        let user = store.find_by_email("oedipa@trystero.com").await?.unwrap();
        assert_eq!(user.password_hash, "new");

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_list_is_ordered_by_id() -> TestResult {
        let store = InMemoryAccountStore::default();
        for email in ["c@x.com", "a@x.com", "b@x.com"] {
            store.create(new_user(email)).await?;
        }

        let emails: Vec<String> = store
            .list()
            .await?
            .into_iter()
            .map(|user| user.email)
            .collect();

        assert_eq!(emails, vec!["c@x.com", "a@x.com", "b@x.com"]);

        Ok(())
    }
}
