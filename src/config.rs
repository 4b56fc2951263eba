use thiserror::Error;
use url::Url;

pub const ENV_BASE_URL: &str = "JIRA_BASE_URL";
pub const ENV_USERNAME: &str = "JIRA_USERNAME";
pub const ENV_API_TOKEN: &str = "JIRA_API_TOKEN";
pub const ENV_PROJECT_KEY: &str = "JIRA_PROJECT_KEY";

/// Project used when neither the request nor the environment names one.
pub const FALLBACK_PROJECT_KEY: &str = "SMS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("{var} is not a valid URL ({value}): {reason}")]
    InvalidUrl {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Connection settings for the Jira instance, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub username: String,
    pub api_token: String,
    pub project_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let base_url = get(ENV_BASE_URL).ok_or(ConfigError::Missing(ENV_BASE_URL))?;
        let username = get(ENV_USERNAME).ok_or(ConfigError::Missing(ENV_USERNAME))?;
        let api_token = get(ENV_API_TOKEN).ok_or(ConfigError::Missing(ENV_API_TOKEN))?;
        let project_key =
            get(ENV_PROJECT_KEY).unwrap_or_else(|| FALLBACK_PROJECT_KEY.to_string());

        Ok(Self {
            base_url: normalize_base_url(&base_url)?,
            username,
            api_token,
            project_key,
        })
    }

    /// The API token replaced by asterisks, for logging.
    pub fn masked_token(&self) -> String {
        "*".repeat(self.api_token.len())
    }
}

/// Prefixes `https://` when no scheme is given and strips trailing slashes.
pub fn normalize_base_url(input: &str) -> Result<String, ConfigError> {
    let trimmed = input.trim();
    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = Url::parse(&candidate).map_err(|e| ConfigError::InvalidUrl {
        var: ENV_BASE_URL,
        value: input.to_string(),
        reason: e.to_string(),
    })?;
    if parsed.host_str().is_none() {
        return Err(ConfigError::InvalidUrl {
            var: ENV_BASE_URL,
            value: input.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(candidate.trim_end_matches('/').to_string())
}
