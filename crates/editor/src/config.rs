//! Editor configuration.
//!
//! Defaults match the behaviour users expect from the document editors; every
//! knob can be overridden through `DOCFORGE_*` environment variables.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use docforge_core::PrecisionPolicy;
use docforge_reconcile::{ReconcileSettings, Tolerance};

pub const ENV_EPSILON: &str = "DOCFORGE_EPSILON";
pub const ENV_DEFAULT_QUANTITY: &str = "DOCFORGE_DEFAULT_QUANTITY";
pub const ENV_FIAT_PRECISION: &str = "DOCFORGE_FIAT_PRECISION";
pub const ENV_TOKEN_PRECISION: &str = "DOCFORGE_TOKEN_PRECISION";
pub const ENV_TOKEN_CURRENCIES: &str = "DOCFORGE_TOKEN_CURRENCIES";

/// Largest number of decimals a keystroke pattern is built for.
const MAX_PRECISION: u32 = 18;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Tolerance used for invariant checks and minimal patches.
    pub epsilon: f64,
    pub default_quantity: f64,
    pub fiat_precision: u32,
    pub token_precision: u32,
    pub token_currencies: Vec<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        let precision = PrecisionPolicy::default();
        let settings = ReconcileSettings::default();
        Self {
            epsilon: settings.epsilon,
            default_quantity: settings.default_quantity,
            fiat_precision: precision.fiat_precision,
            token_precision: precision.token_precision,
            token_currencies: precision.token_currencies,
        }
    }
}

impl EditorConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key/value source. Unset keys keep their default;
    /// unparsable values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let token_currencies = match lookup(ENV_TOKEN_CURRENCIES) {
            None => defaults.token_currencies,
            Some(raw) => {
                let codes: Vec<String> = raw
                    .split(',')
                    .map(|c| c.trim().to_ascii_uppercase())
                    .filter(|c| !c.is_empty())
                    .collect();
                if codes.is_empty() {
                    tracing::warn!(key = ENV_TOKEN_CURRENCIES, value = %raw, "no currency codes; using default");
                    defaults.token_currencies
                } else {
                    codes
                }
            }
        };

        Self {
            epsilon: setting(&lookup, ENV_EPSILON, defaults.epsilon, |v| {
                v.is_finite() && *v > 0.0
            }),
            default_quantity: setting(&lookup, ENV_DEFAULT_QUANTITY, defaults.default_quantity, |v| {
                v.is_finite() && *v > 0.0
            }),
            fiat_precision: setting(&lookup, ENV_FIAT_PRECISION, defaults.fiat_precision, |v| {
                *v <= MAX_PRECISION
            }),
            token_precision: setting(&lookup, ENV_TOKEN_PRECISION, defaults.token_precision, |v| {
                *v <= MAX_PRECISION
            }),
            token_currencies,
        }
    }

    pub fn reconcile_settings(&self) -> ReconcileSettings {
        ReconcileSettings {
            epsilon: self.epsilon,
            default_quantity: self.default_quantity,
        }
    }

    pub fn precision_policy(&self) -> PrecisionPolicy {
        PrecisionPolicy {
            fiat_precision: self.fiat_precision,
            token_precision: self.token_precision,
            token_currencies: self.token_currencies.clone(),
        }
    }

    pub fn tolerance(&self) -> Tolerance {
        Tolerance::new(self.epsilon)
    }
}

fn setting<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
    valid: impl Fn(&T) -> bool,
) -> T
where
    T: FromStr + Copy + core::fmt::Debug,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if valid(&value) => value,
        _ => {
            tracing::warn!(key, value = %raw, default = ?default, "invalid configuration value; using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> EditorConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EditorConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = from_pairs(&[]);
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.epsilon, 1e-5);
        assert_eq!(config.default_quantity, 1.0);
        assert_eq!(config.fiat_precision, 2);
        assert_eq!(config.token_precision, 6);
        assert_eq!(config.token_currencies, vec!["USDS", "DAI", "USDC", "MKR"]);
    }

    #[test]
    fn overrides_are_applied() {
        let config = from_pairs(&[
            (ENV_EPSILON, "0.001"),
            (ENV_FIAT_PRECISION, "3"),
            (ENV_TOKEN_CURRENCIES, " eth, usdc ,,"),
        ]);
        assert_eq!(config.epsilon, 0.001);
        assert_eq!(config.fiat_precision, 3);
        assert_eq!(config.token_currencies, vec!["ETH", "USDC"]);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = from_pairs(&[
            (ENV_EPSILON, "-1"),
            (ENV_DEFAULT_QUANTITY, "lots"),
            (ENV_TOKEN_PRECISION, "99"),
            (ENV_TOKEN_CURRENCIES, " , "),
        ]);
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn derived_settings_carry_the_overrides() {
        let config = from_pairs(&[(ENV_DEFAULT_QUANTITY, "2"), (ENV_TOKEN_PRECISION, "8")]);
        assert_eq!(config.reconcile_settings().default_quantity, 2.0);
        let usds = "USDS".parse().unwrap();
        assert_eq!(config.precision_policy().precision(&usds), 8);
    }

    #[test]
    fn deserializes_partial_json_over_defaults() {
        let config: EditorConfig = serde_json::from_str(r#"{"fiatPrecision": 4}"#).unwrap();
        assert_eq!(config.fiat_precision, 4);
        assert_eq!(config.token_precision, 6);
    }
}
