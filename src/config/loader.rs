// Configuration loader with environment variable substitution

use super::types::*;
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file with environment variable substitution
    pub fn load<P: AsRef<Path>>(path: P) -> Result<StoreConfig> {
        let config = Self::read(path)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Parse YAML text, substituting environment variables first
    pub fn parse(content: &str) -> Result<StoreConfig> {
        let config = Self::parse_unvalidated(content)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Read and parse without validating, so overrides can be applied first
    pub(crate) fn read<P: AsRef<Path>>(path: P) -> Result<StoreConfig> {
        let content = std::fs::read_to_string(path.as_ref())
            .context("Failed to read config file")?;
        Self::parse_unvalidated(&content)
    }

    fn parse_unvalidated(content: &str) -> Result<StoreConfig> {
        let content = Self::substitute_env_vars(content);
        serde_yaml::from_str(&content).context("Failed to parse YAML configuration")
    }

    /// Substitute ${VAR} and ${VAR:-default} patterns with environment variables
    ///
    /// Examples:
    /// - ${HOME} -> /home/user
    /// - ${RECORDS_DIR:-/data/records} -> /data/records (if RECORDS_DIR not set)
    fn substitute_env_vars(content: &str) -> String {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let re = PATTERN.get_or_init(|| {
            Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").expect("env var pattern is valid")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str());

            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => match default_value {
                    Some(default) => default.to_string(),
                    // Keep original if no default and var not found
                    None => format!("${{{}}}", var_name),
                },
            }
        })
        .to_string()
    }

    /// Validate configuration
    pub(crate) fn validate(config: &StoreConfig) -> Result<()> {
        if config.backends.is_empty() {
            bail!("backends must list at least one backend");
        }

        for (index, backend) in config.backends.iter().enumerate() {
            match backend {
                BackendSpec::Memory => {}
                BackendSpec::Filesystem(fs) => {
                    if fs.base_path.trim().is_empty() {
                        bail!("backends[{}].base_path cannot be empty", index);
                    }
                }
                BackendSpec::Http(http) => Self::validate_http(index, http)?,
            }
        }

        if config.security.enabled {
            match config.security.token.as_deref() {
                Some(token) if !token.is_empty() && !token.starts_with("${") => {}
                _ => bail!("security.token must be set when security is enabled"),
            }
        }

        if !LOG_LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
            bail!(
                "logging.level must be one of {}",
                LOG_LEVELS.join(", ")
            );
        }

        Ok(())
    }

    fn validate_http(index: usize, http: &HttpConfig) -> Result<()> {
        if !http.resource_url.contains("{id}") {
            bail!("backends[{}].resource_url must contain an {{id}} placeholder", index);
        }

        if let Some(url) = &http.multi_get_url {
            if !url.contains("{ids}") {
                bail!("backends[{}].multi_get_url must contain an {{ids}} placeholder", index);
            }
        }

        let pattern = Regex::new(&http.key_pattern)
            .with_context(|| format!("backends[{}].key_pattern is not a valid regex", index))?;
        if pattern.captures_len() < 2 {
            bail!("backends[{}].key_pattern needs a capture group for the resource id", index);
        }

        Ok(())
    }
}
