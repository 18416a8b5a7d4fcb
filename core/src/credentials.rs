use std::fmt;

use crate::error::ConfigError;

pub const API_KEY_ENV: &str = "ETSY_API_KEY";
pub const SHOP_ID_ENV: &str = "ETSY_SHOP_ID";
pub const ACCESS_TOKEN_ENV: &str = "ETSY_ACCESS_TOKEN";

/// Explicitly supplied credential values (CLI flags or an embedding host).
/// Every field wins over its environment variable when set.
#[derive(Clone, Debug, Default)]
pub struct CredentialConfig {
    pub api_key: Option<String>,
    pub shop_id: Option<String>,
    pub access_token: Option<String>,
}

/// Credentials for one server instance. Immutable once resolved; a
/// credential change means building a new server.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    shop_id: Option<String>,
    access_token: Option<String>,
}

impl Credentials {
    /// Resolve from `config`, falling back to the process environment.
    pub fn resolve(config: &CredentialConfig) -> Result<Self, ConfigError> {
        Self::resolve_with(config, |name| std::env::var(name).ok())
    }

    /// Resolve from `config`, falling back to `lookup` for each unset field.
    pub fn resolve_with<F>(config: &CredentialConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |explicit: &Option<String>, env_name: &str| {
            non_blank(explicit.clone()).or_else(|| non_blank(lookup(env_name)))
        };

        let api_key = pick(&config.api_key, API_KEY_ENV)
            .ok_or(ConfigError::MissingCredential { name: API_KEY_ENV })?;

        Ok(Self {
            api_key,
            shop_id: pick(&config.shop_id, SHOP_ID_ENV),
            access_token: pick(&config.access_token, ACCESS_TOKEN_ENV),
        })
    }

    pub fn new(
        api_key: impl Into<String>,
        shop_id: Option<String>,
        access_token: Option<String>,
    ) -> Result<Self, ConfigError> {
        let api_key = non_blank(Some(api_key.into()))
            .ok_or(ConfigError::MissingCredential { name: API_KEY_ENV })?;
        Ok(Self {
            api_key,
            shop_id: non_blank(shop_id),
            access_token: non_blank(access_token),
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn shop_id(&self) -> Option<&str> {
        self.shop_id.as_deref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// True when write operations may be attempted.
    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }
}

// Secrets stay out of logs and panic messages.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("shop_id", &self.shop_id)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
