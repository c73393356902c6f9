use std::time::Duration;

/// Runtime configuration, read once at startup and passed explicitly into the
/// lifecycle manager and auth gate. Nothing in the request path reads the
/// environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_url: String,

    /// External base URL embedded in verification links.
    pub public_base_url: String,

    pub jwt_secret: String,

    /// Session token validity window.
    pub session_ttl: Duration,

    /// Verification token validity window.
    pub verification_ttl: Duration,

    /// PBKDF2 iterations for the server-side password hash.
    pub password_iterations: u32,

    /// When true, login additionally requires an active subscription.
    pub require_subscription: bool,

    pub mailer: MailerConfig,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub api_url: String,
    pub api_key: String,
    pub sender_email: String,
    pub sender_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_url: String,
    pub api_key: String,
}

const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;
const DEFAULT_VERIFICATION_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_PASSWORD_ITERATIONS: u32 = 100_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{0} is not a valid value: {1}")]
    Invalid(&'static str, String),
}

pub fn normalize_env_value(raw: String) -> String {
    let trimmed = raw.trim();

    if let Some(inner) = trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        return inner.trim().to_string();
    }
    if let Some(inner) = trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        return inner.trim().to_string();
    }

    trimmed.to_string()
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(normalize_env_value)
        .filter(|s| !s.is_empty())
}

fn require_env(key: &'static str) -> Result<String, ConfigError> {
    env_string(key).ok_or(ConfigError::Missing(key))
}

fn env_secs(key: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match env_string(key) {
        None => Ok(Duration::from_secs(default)),
        Some(v) => v
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::Invalid(key, e.to_string())),
    }
}

fn env_bool(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env_string(key) {
        None => Ok(default),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::Invalid(key, other.to_string())),
        },
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: env_string("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:5000".to_string()),
            database_url: require_env("DATABASE_URL")?,
            public_base_url: env_string("PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://localhost:5000".to_string()),
            jwt_secret: require_env("JWT_SECRET")?,
            session_ttl: env_secs("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?,
            verification_ttl: env_secs("VERIFICATION_TTL_SECS", DEFAULT_VERIFICATION_TTL_SECS)?,
            password_iterations: DEFAULT_PASSWORD_ITERATIONS,
            require_subscription: env_bool("REQUIRE_SUBSCRIPTION", false)?,
            mailer: MailerConfig {
                api_url: env_string("BREVO_API_URL")
                    .unwrap_or_else(|| "https://api.brevo.com/v3/smtp/email".to_string()),
                api_key: require_env("BREVO_API_KEY")?,
                sender_email: require_env("BREVO_SENDER_EMAIL")?,
                sender_name: env_string("BREVO_SENDER_NAME"),
            },
            gateway: GatewayConfig {
                api_url: env_string("PAYMENT_API_URL")
                    .unwrap_or_else(|| "https://api.sandbox.paypal.com/v2/checkout/orders".to_string()),
                api_key: require_env("PAYMENT_API_KEY")?,
            },
        })
    }
}

#[cfg(test)]
impl AppConfig {
    pub fn testing() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            database_url: "sqlite::memory:".to_string(),
            public_base_url: "http://localhost:5000".to_string(),
            jwt_secret: "test-jwt-secret".to_string(),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            verification_ttl: Duration::from_secs(DEFAULT_VERIFICATION_TTL_SECS),
            // Keep tests fast; production default is 100k.
            password_iterations: 1_000,
            require_subscription: false,
            mailer: MailerConfig {
                api_url: "http://localhost:1/unused".to_string(),
                api_key: "test".to_string(),
                sender_email: "noreply@verigate.test".to_string(),
                sender_name: Some("Verigate".to_string()),
            },
            gateway: GatewayConfig {
                api_url: "http://localhost:1/unused".to_string(),
                api_key: "test".to_string(),
            },
        }
    }
}
