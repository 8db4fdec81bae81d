//! Placeholder recognition and secret resolution.
//!
//! Configuration values may reference secrets instead of embedding them:
//!
//! - `${secret:NAME}` - a named secret
//! - `${VAR_NAME}` - an environment variable
//!
//! Validation only *recognises* unresolved placeholders; resolution happens
//! when the configuration is loaded, through a [`SecretResolver`].

use tracing::{info, warn};

const SECRET_PREFIX: &str = "secret:";

/// Check whether a value is still an unresolved `${...}` placeholder.
pub fn is_placeholder(value: &str) -> bool {
    value.len() > 3 && value.starts_with("${") && value.ends_with('}')
}

/// Resolves placeholder strings to concrete values.
///
/// Implementations must return the input unchanged when it is not a
/// placeholder or cannot be resolved.
pub trait SecretResolver: Send + Sync {
    fn resolve(&self, value: &str) -> String;
}

/// Resolver backed by process environment variables.
///
/// `${secret:alerts-webhook}` is looked up as `ALERTS_WEBHOOK`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecretResolver;

impl EnvSecretResolver {
    /// Environment variable name a secret is exposed under.
    pub fn env_name_for_secret(secret_name: &str) -> String {
        secret_name.to_uppercase().replace('-', "_")
    }
}

impl SecretResolver for EnvSecretResolver {
    fn resolve(&self, value: &str) -> String {
        if !is_placeholder(value) {
            return value.to_string();
        }

        let reference = &value[2..value.len() - 1];

        if let Some(secret_name) = reference.strip_prefix(SECRET_PREFIX) {
            let env_name = Self::env_name_for_secret(secret_name);
            return match std::env::var(&env_name) {
                Ok(resolved) if !resolved.is_empty() => {
                    info!("Resolved secret {} from env var {}", secret_name, env_name);
                    resolved
                }
                _ => {
                    warn!("Secret {} not found (checked env var {})", secret_name, env_name);
                    value.to_string()
                }
            };
        }

        match std::env::var(reference) {
            Ok(resolved) => resolved,
            Err(_) => {
                warn!("Environment variable {} not set", reference);
                value.to_string()
            }
        }
    }
}
