//! Server settings from the environment

use std::env;

pub const DEFAULT_MAX_INPUT_SIZE: usize = 8000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Longest accepted query, in characters
    pub max_input_size: usize,
    pub max_steps: usize,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
            max_steps: sigma::DEFAULT_MAX_STEPS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ServerConfig {
    /// `SIGMA_MAX_INPUT_SIZE`, `SIGMA_MAX_STEPS`, `SIGMA_LOG`; unset or
    /// unparsable values keep their defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let number = |key: &str, default: usize| {
            lookup(key)
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(default)
        };
        Self {
            max_input_size: number("SIGMA_MAX_INPUT_SIZE", defaults.max_input_size),
            max_steps: number("SIGMA_MAX_STEPS", defaults.max_steps),
            log_level: lookup("SIGMA_LOG")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.log_level),
        }
    }

    /// Tracing level for `log_level`, `info` when unrecognised
    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg.max_input_size, 8000);
        assert_eq!(cfg.max_steps, 200);
        assert_eq!(cfg.tracing_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[("SIGMA_MAX_INPUT_SIZE", "100"), ("SIGMA_MAX_STEPS", " 5 "), ("SIGMA_LOG", "debug")]);
        assert_eq!(cfg.max_input_size, 100);
        assert_eq!(cfg.max_steps, 5);
        assert_eq!(cfg.tracing_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_garbage_keeps_defaults() {
        let cfg = config(&[("SIGMA_MAX_STEPS", "lots"), ("SIGMA_LOG", "chatty")]);
        assert_eq!(cfg.max_steps, 200);
        assert_eq!(cfg.tracing_level(), tracing::Level::INFO);
    }
}
