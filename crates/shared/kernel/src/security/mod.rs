//! Credentials and browser sessions.

mod cookie;
mod password;
mod session;

pub use cookie::{clear_session_cookie, session_cookie};
pub use password::{PasswordError, hash_password, verify_password};
pub use session::{Session, SessionStore};
