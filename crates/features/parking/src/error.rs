use std::borrow::Cow;
use vpms_database::DatabaseError;

/// A specialized [`ParkingError`] enum of this crate.
#[vpms_derive::vpms_error]
pub enum ParkingError {
    /// Invalid billing settings.
    #[error("Parking config error{}: {message}", format_context(.context))]
    Config { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Parking storage error{}: {source}", format_context(.context))]
    Database {
        #[source]
        source: DatabaseError,
        context: Option<Cow<'static, str>>,
    },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal parking error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl From<ParkingError> for vpms_kernel::server::ApiError {
    fn from(err: ParkingError) -> Self {
        Self::Internal { message: err.to_string().into(), context: None }
    }
}
