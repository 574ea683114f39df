use std::borrow::Cow;
use vpms_database::DatabaseError;
use vpms_kernel::security::PasswordError;

/// A specialized [`IdentityError`] enum of this crate.
#[vpms_derive::vpms_error]
pub enum IdentityError {
    /// Configuration errors (bootstrap admin, grace period).
    #[error("Identity config error{}: {message}", format_context(.context))]
    Config { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Identity storage error{}: {source}", format_context(.context))]
    Database {
        #[source]
        source: DatabaseError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Identity credential error{}: {source}", format_context(.context))]
    Password {
        #[source]
        source: PasswordError,
        context: Option<Cow<'static, str>>,
    },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal identity error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl From<IdentityError> for vpms_kernel::server::ApiError {
    fn from(err: IdentityError) -> Self {
        Self::Internal { message: err.to_string().into(), context: None }
    }
}
