//! Runtime configuration for state machines.

/// Environment variable naming the counter namespace.
pub const METRICS_PREFIX_ENV: &str = "QUESTIONNAIRE_METRICS_PREFIX";

pub const DEFAULT_METRICS_PREFIX: &str = "questionnaire";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsmConfig {
    /// Prefix prepended to every counter when rendered.
    pub metrics_prefix: String,
}

impl Default for FsmConfig {
    fn default() -> Self {
        Self {
            metrics_prefix: DEFAULT_METRICS_PREFIX.to_string(),
        }
    }
}

impl FsmConfig {
    /// Read `QUESTIONNAIRE_METRICS_PREFIX`, falling back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup(METRICS_PREFIX_ENV).filter(|v| !v.trim().is_empty()) {
            Some(prefix) => Self {
                metrics_prefix: prefix,
            },
            None => {
                tracing::warn!(
                    env = METRICS_PREFIX_ENV,
                    default = DEFAULT_METRICS_PREFIX,
                    "metrics prefix not set, using default"
                );
                Self::default()
            }
        }
    }
}
