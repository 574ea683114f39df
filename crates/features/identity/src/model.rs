use chrono::{DateTime, NaiveDate, Utc};
use vpms_database::rusqlite::types::Type;
use vpms_database::rusqlite::{self, Row};
use vpms_derive::api_model;
use vpms_domain::types::UserRole;

/// Account row as stored in `users`.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: Option<String>,
    pub address: String,
    pub pin_code: String,
    pub role: UserRole,
    pub is_active: bool,
    pub bio: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub scheduled_delete_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) const USER_COLUMNS: &str = "id, full_name, email, password_hash, phone_number, address, \
     pin_code, role, is_active, bio, date_of_birth, scheduled_delete_at, created_at, updated_at";

impl User {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let role: String = row.get(7)?;
        let role = role
            .parse::<UserRole>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

        Ok(Self {
            id: row.get(0)?,
            full_name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            phone_number: row.get(4)?,
            address: row.get(5)?,
            pin_code: row.get(6)?,
            role,
            is_active: row.get(8)?,
            bio: row.get(9)?,
            date_of_birth: row.get(10)?,
            scheduled_delete_at: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }
}

/// Fields needed to insert a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: Option<String>,
    pub address: String,
    pub pin_code: String,
    pub role: UserRole,
}

/// Public view of an account (never includes the password hash).
#[api_model]
#[derive(Clone, PartialEq)]
pub struct UserView {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub address: String,
    pub pin_code: String,
    pub role: UserRole,
    pub is_active: bool,
    pub bio: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub scheduled_delete_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            phone_number: user.phone_number,
            address: user.address,
            pin_code: user.pin_code,
            role: user.role,
            is_active: user.is_active,
            bio: user.bio,
            date_of_birth: user.date_of_birth,
            scheduled_delete_at: user.scheduled_delete_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[api_model]
pub struct SignUpRequest {
    /// 3 to 50 characters
    pub full_name: String,
    pub email: String,
    pub password: String,
    /// Must equal `password`
    pub confirm_password: String,
    /// 10 to 15 characters
    pub phone_number: String,
    pub address: String,
    /// 6 to 10 characters
    pub pin_code: String,
}

#[api_model]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Result of sign-up and login: the session cookie is set alongside.
#[api_model]
pub struct AuthResponse {
    pub message: String,
    /// Landing page for the account's role
    pub redirect: String,
    pub user: UserView,
}

#[api_model]
pub struct ProfileUpdate {
    pub full_name: String,
    pub bio: Option<String>,
    /// `YYYY-MM-DD`
    pub date_of_birth: Option<String>,
}

/// Body of `POST /api/users`.
#[api_model]
pub struct CreateUserRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub pin_code: Option<String>,
}

/// Body of `PUT /api/user/{id}`. An empty or missing password keeps the current one.
#[api_model]
pub struct UpdateUserRequest {
    pub full_name: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub pin_code: Option<String>,
    pub password: Option<String>,
}

/// Row of the admin users table.
#[api_model(deny_unknown_fields = false)]
pub struct AdminUserRow {
    #[serde(flatten)]
    pub user: UserView,
    pub vehicles: i64,
    pub reservations: i64,
    pub active_reservations: i64,
}
