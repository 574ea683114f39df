use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level server configuration.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfigInner {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
    pub parking: ParkingConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(flatten, default)]
    inner: Arc<ApiConfigInner>,
}

impl Deref for ApiConfig {
    type Target = ApiConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ApiConfig {
    fn deref_mut(&mut self) -> &mut ApiConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// HTTP listener.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub ssl: Option<SslConfig>,
}

/// TLS certificate/key paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// `SQLite` location; `:memory:` keeps everything in RAM.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub session: SessionConfig,
    pub admin: AdminConfig,
}

/// Session cookie and in-memory session store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_seconds: u64,
    pub capacity: u64,
    /// Adds the `Secure` attribute; enable behind HTTPS.
    pub secure: bool,
}

/// Account created on startup when the database has no admin yet.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
    pub address: String,
    pub pin_code: String,
}

/// Allowed browser origins. Empty means any origin.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for rolling log files; `None` logs to the console only.
    pub dir: Option<PathBuf>,
    pub level: String,
    pub max_files: usize,
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParkingConfig {
    /// Days a soft-deleted account can still log in and cancel the deletion.
    pub deletion_grace_days: u32,
    /// Period of the background task purging expired accounts.
    pub purge_interval_seconds: u64,
    /// Shortest billed stay, in hours.
    pub minimum_billable_hours: f64,
    /// Largest accepted difference between a payment and the bill.
    pub payment_tolerance: f64,
}

// --- Default ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self { address: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: 5000, ssl: None }
    }
}

impl Default for SslConfig {
    fn default() -> Self {
        Self { cert: PathBuf::from("cert.pem"), key: PathBuf::from("key.pem") }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "vpms.db".to_owned() }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "vpms_session".to_owned(),
            ttl_seconds: 86_400,
            capacity: 10_000,
            secure: false,
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            id: "@sharib123".to_owned(),
            full_name: "Sharib Ahmad".to_owned(),
            email: "sharib@gmail.com".to_owned(),
            password: "admin123".to_owned(),
            phone_number: "1234567890".to_owned(),
            address: "123 Admin St, Admin City".to_owned(),
            pin_code: "123456".to_owned(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { dir: Some(PathBuf::from("logs")), level: "info".to_owned(), max_files: 3, json: false }
    }
}

impl Default for ParkingConfig {
    fn default() -> Self {
        Self {
            deletion_grace_days: 7,
            purge_interval_seconds: 3600,
            minimum_billable_hours: 0.01,
            payment_tolerance: 0.005,
        }
    }
}
