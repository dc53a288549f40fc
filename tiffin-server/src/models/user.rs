//! User Model
use crate::db::schema::users;
use chrono::NaiveDateTime;
use diesel::{pg::Pg, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User Record
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(Pg))]
pub struct User {
    /// Internal Database Identifier
    pub id: i32,
    /// Email address, unique per user
    pub email: String,
    /// Full name
    pub full_name: String,
    /// Contact phone number
    pub phone_number: String,
    /// Argon2id PHC string
    pub password_hash: String,
    /// Whether the email address was verified with a passcode
    pub is_verified: bool,
    /// Inserted at timestamp
    pub inserted_at: NaiveDateTime,
    /// Updated at timestamp
    pub updated_at: NaiveDateTime,
}

/// New User (for creating users)
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    /// Email address, unique per user
    pub email: String,
    /// Full name
    pub full_name: String,
    /// Contact phone number
    pub phone_number: String,
    /// Argon2id PHC string
    pub password_hash: String,
    /// Whether the email address was verified with a passcode
    pub is_verified: bool,
}

/// Raised when creating a user whose email is already taken.
#[derive(thiserror::Error, Debug, Clone, Copy)]
#[error("User with this email already exists")]
pub struct AccountExists;

/// Public view of a user, as returned by the API
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// Internal identifier
    pub id: i32,
    /// Email address
    pub email: String,
    /// Full name
    pub full_name: String,
    /// Contact phone number
    pub phone_number: String,
    /// Whether the email address was verified
    pub is_verified: bool,
    /// When the account was created
    #[schema(value_type = String, example = "2024-03-01T12:00:00")]
    pub created_at: NaiveDateTime,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            phone_number: user.phone_number,
            is_verified: user.is_verified,
            created_at: user.inserted_at,
        }
    }
}

/// Response to a completed registration
#[derive(Deserialize, Serialize, Clone, Debug, ToSchema)]
pub struct UserCreatedResponse {
    /// What happened
    pub message: String,
    /// The new user
    pub user: UserResponse,
}

/// Response listing users
#[derive(Deserialize, Serialize, Clone, Debug, ToSchema)]
pub struct UsersResponse {
    /// What happened
    pub message: String,
    /// Every known user
    pub users: Vec<UserResponse>,
}
