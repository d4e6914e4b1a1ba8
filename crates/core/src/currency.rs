//! Currency codes and the decimal precision they are edited with.
//!
//! Fiat currencies are edited with cents precision; token-denominated
//! settlement currencies carry six decimals.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Upper-case currency code (`EUR`, `USD`, `USDS`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Currency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        let valid_len = (3..=6).contains(&code.len());
        if !valid_len || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::invalid_id(format!(
                "Currency: expected 3-6 alphanumeric characters, got {s:?}"
            )));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }
}

impl TryFrom<String> for Currency {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CurrencyKind {
    Fiat,
    Token,
}

/// Decides how many decimals a currency is edited with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecisionPolicy {
    pub fiat_precision: u32,
    pub token_precision: u32,
    /// Codes treated as token-denominated (compared case-insensitively).
    pub token_currencies: Vec<String>,
}

impl Default for PrecisionPolicy {
    fn default() -> Self {
        Self {
            fiat_precision: 2,
            token_precision: 6,
            token_currencies: ["USDS", "DAI", "USDC", "MKR"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

impl PrecisionPolicy {
    pub fn kind(&self, currency: &Currency) -> CurrencyKind {
        let is_token = self
            .token_currencies
            .iter()
            .any(|t| t.eq_ignore_ascii_case(currency.as_str()));
        if is_token {
            CurrencyKind::Token
        } else {
            CurrencyKind::Fiat
        }
    }

    pub fn precision(&self, currency: &Currency) -> u32 {
        match self.kind(currency) {
            CurrencyKind::Fiat => self.fiat_precision,
            CurrencyKind::Token => self.token_precision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn currency(code: &str) -> Currency {
        code.parse().unwrap()
    }

    #[test]
    fn codes_are_normalized_to_upper_case() {
        assert_eq!(currency(" eur ").as_str(), "EUR");
    }

    #[test]
    fn malformed_codes_are_rejected() {
        assert!("E".parse::<Currency>().is_err());
        assert!("EU-R".parse::<Currency>().is_err());
        assert!("TOOLONGX".parse::<Currency>().is_err());
    }

    #[test]
    fn fiat_uses_two_decimals_and_tokens_six() {
        let policy = PrecisionPolicy::default();
        assert_eq!(policy.precision(&currency("EUR")), 2);
        assert_eq!(policy.precision(&currency("usds")), 6);
        assert_eq!(policy.kind(&currency("DAI")), CurrencyKind::Token);
    }

    #[test]
    fn deserialization_validates_the_code() {
        let ok: Currency = serde_json::from_str("\"chf\"").unwrap();
        assert_eq!(ok.as_str(), "CHF");
        assert!(serde_json::from_str::<Currency>("\"$\"").is_err());
    }
}
