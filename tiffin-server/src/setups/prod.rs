//! Production server setup code

use crate::{
    db::{self, schema::users, Pool},
    models::user::{AccountExists, NewUser, User},
    settings,
    setups::{AccountStore, ServerSetup, VerificationCodeSender},
};
use anyhow::Result;
use async_trait::async_trait;
use diesel::{
    result::{DatabaseErrorKind, Error as DieselError},
    ExpressionMethods, QueryDsl, SelectableHelper,
};
use diesel_async::{
    pooled_connection::{PoolableConnection, RecyclingMethod},
    RunQueryDsl,
};
use mailgun_rs::{EmailAddress, Mailgun, MailgunRegion, Message};
use std::collections::HashMap;

/// Production implementation of `ServerSetup`.
/// Stores users in postgres and sends codes through mailgun, both configured
/// in `settings.toml`.
#[derive(Clone, Debug, Default)]
pub struct ProdSetup;

impl ServerSetup for ProdSetup {
    type AccountStore = PgAccountStore;
    type VerificationCodeSender = EmailVerificationCodeSender;
}

/// An `AccountStore` backed by the `users` table.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: Pool,
}

impl std::fmt::Debug for PgAccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgAccountStore")
            .field("state", &self.pool.state())
            .finish()
    }
}

impl PgAccountStore {
    /// Wrap an existing connection pool
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut conn = db::connect(&self.pool).await?;

        let user = users::table
            .filter(users::email.eq(email))
            .select(User::as_select())
            .first(&mut conn)
            .await;

        match user {
            Ok(user) => Ok(Some(user)),
            Err(DieselError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        let mut conn = db::connect(&self.pool).await?;

        let created = diesel::insert_into(users::table)
            .values(&user)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await;

        match created {
            Ok(user) => Ok(user),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Err(AccountExists.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<bool> {
        let mut conn = db::connect(&self.pool).await?;

        let updated = diesel::update(users::table.filter(users::email.eq(email)))
            .set((
                users::password_hash.eq(password_hash),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await?;

        Ok(updated > 0)
    }

    async fn list(&self) -> Result<Vec<User>> {
        let mut conn = db::connect(&self.pool).await?;

        let all = users::table
            .order(users::id.asc())
            .select(User::as_select())
            .load(&mut conn)
            .await?;

        Ok(all)
    }

    async fn is_healthy(&self) -> bool {
        match db::connect(&self.pool).await {
            Ok(mut conn) => conn.ping(&RecyclingMethod::Fast).await.is_ok(),
            Err(e) => {
                tracing::warn!(?e, "Account store unreachable");
                false
            }
        }
    }
}

#[derive(Debug, Clone)]
/// Sends verification codes over email
pub struct EmailVerificationCodeSender {
    settings: settings::Mailgun,
}

impl EmailVerificationCodeSender {
    /// Create a new EmailVerificationCodeSender
    pub fn new(settings: settings::Mailgun) -> Self {
        Self { settings }
    }

    fn sender(&self) -> EmailAddress {
        EmailAddress::name_address(&self.settings.from_name, &self.settings.from_address)
    }

    fn message(&self, email: &str, code: &str) -> Message {
        let template_vars = HashMap::from([("code".to_string(), code.to_string())]);

        Message {
            to: vec![EmailAddress::address(email)],
            subject: self.settings.subject.clone(),
            template: self.settings.template.clone(),
            template_vars,
            ..Default::default()
        }
    }
}

#[async_trait]
impl VerificationCodeSender for EmailVerificationCodeSender {
    async fn send_code(&self, email: &str, code: &str) -> Result<()> {
        let message = self.message(email, code);

        tracing::debug!(
            to = email,
            subject = message.subject,
            template = message.template,
            "Sending verification email"
        );

        let client = Mailgun {
            message,
            api_key: self.settings.api_key.clone(),
            domain: self.settings.domain.clone(),
        };

        client.async_send(MailgunRegion::US, &self.sender()).await?;

        Ok(())
    }
}
