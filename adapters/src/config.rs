//! Gateway configuration
//!
//! Sources, later ones overriding earlier ones:
//! 1. Built-in defaults
//! 2. `CONFIG_FILE`, or `config/<ENVIRONMENT>` when unset (optional)
//! 3. `BOLETO_GATEWAY_*` environment variables, `__` between nested keys
//!    (`BOLETO_GATEWAY_TIMEOUTS__REGISTER_SECS=20`)

use config::{ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Per-operation timeouts
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Register call
    pub register_secs: u64,
    /// Ticket exchange
    pub token_secs: u64,
    /// Anything else (JPMorgan register)
    pub default_secs: u64,
}

impl TimeoutConfig {
    /// Register timeout
    pub fn register(&self) -> Duration {
        Duration::from_secs(self.register_secs)
    }

    /// Ticket timeout
    pub fn token(&self) -> Duration {
        Duration::from_secs(self.token_secs)
    }

    /// Default timeout
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_secs)
    }
}

/// Bank endpoints
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct BankUrls {
    /// JPMorgan register
    pub jpmorgan: String,
    /// Stone register
    pub stone: String,
    /// Itaú ticket exchange
    pub itau_ticket: String,
    /// Itaú register
    pub itau_register: String,
}

/// Logical certificate names resolved through the certificate provider
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct CertificateNames {
    /// JPMorgan mutual TLS client certificate
    pub jpmorgan_crt: String,
    /// JPMorgan mutual TLS client key
    pub jpmorgan_key: String,
    /// JPMorgan RS256 signing key
    pub jpmorgan_sign_key: String,
}

/// Gateway configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Plain transport without client certificates (sandboxes and tests)
    pub mock_mode: bool,
    /// Skip server certificate verification
    pub accept_invalid_certs: bool,
    /// Itaú environment flag sent in `tipo_ambiente` (1 = test, 2 = production)
    pub itau_environment: String,
    /// Directory read by the file certificate provider
    pub certificates_dir: String,
    /// Timeouts
    pub timeouts: TimeoutConfig,
    /// Endpoints
    pub urls: BankUrls,
    /// Certificate names
    pub certificates: CertificateNames,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            mock_mode: false,
            accept_invalid_certs: false,
            itau_environment: "1".to_string(),
            certificates_dir: "./certificates".to_string(),
            timeouts: TimeoutConfig {
                register_secs: 30,
                token_secs: 10,
                default_secs: 40,
            },
            urls: BankUrls {
                jpmorgan: "https://apigatewayqaf.jpmorgan.com/tsapi/v1/boletos".to_string(),
                stone: "https://sandbox-api.openbank.stone.com.br/api/v1/barcode_payment_invoices"
                    .to_string(),
                itau_ticket: "https://oauth.itau.com.br/identity/connect/token".to_string(),
                itau_register:
                    "https://gerador-boletos.itau.com.br/router-gateway-app/public/codigo_barras/registro"
                        .to_string(),
            },
            certificates: CertificateNames {
                jpmorgan_crt: "jpmorgan_crt".to_string(),
                jpmorgan_key: "jpmorgan_key".to_string(),
                jpmorgan_sign_key: "jpmorgan_sign_key".to_string(),
            },
        }
    }
}

impl GatewayConfig {
    /// Load configuration from defaults, optional file and environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let defaults = Self::default();

        let mut builder = config::Config::builder()
            .set_default("mock_mode", defaults.mock_mode)?
            .set_default("accept_invalid_certs", defaults.accept_invalid_certs)?
            .set_default("itau_environment", defaults.itau_environment)?
            .set_default("certificates_dir", defaults.certificates_dir)?
            .set_default("timeouts.register_secs", defaults.timeouts.register_secs)?
            .set_default("timeouts.token_secs", defaults.timeouts.token_secs)?
            .set_default("timeouts.default_secs", defaults.timeouts.default_secs)?
            .set_default("urls.jpmorgan", defaults.urls.jpmorgan)?
            .set_default("urls.stone", defaults.urls.stone)?
            .set_default("urls.itau_ticket", defaults.urls.itau_ticket)?
            .set_default("urls.itau_register", defaults.urls.itau_register)?
            .set_default("certificates.jpmorgan_crt", defaults.certificates.jpmorgan_crt)?
            .set_default("certificates.jpmorgan_key", defaults.certificates.jpmorgan_key)?
            .set_default(
                "certificates.jpmorgan_sign_key",
                defaults.certificates.jpmorgan_sign_key,
            )?;

        if let Ok(config_file) = env::var("CONFIG_FILE") {
            builder = builder.add_source(File::with_name(&config_file).required(false));
        } else {
            builder = builder.add_source(
                File::with_name(&format!("config/{}", environment)).required(false),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("BOLETO_GATEWAY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Ok(mock) = env::var("MOCK_BANKS") {
            builder = builder.set_override("mock_mode", mock == "true" || mock == "1")?;
        }

        builder.build()?.try_deserialize()
    }

    /// Reject configurations that would fail on the first request
    pub fn validate(&self) -> Result<(), String> {
        if self.timeouts.register_secs == 0
            || self.timeouts.token_secs == 0
            || self.timeouts.default_secs == 0
        {
            return Err("Timeouts must be greater than zero".to_string());
        }

        let urls = [
            ("jpmorgan", &self.urls.jpmorgan),
            ("stone", &self.urls.stone),
            ("itau_ticket", &self.urls.itau_ticket),
            ("itau_register", &self.urls.itau_register),
        ];
        if let Some((name, _)) = urls.iter().find(|(_, url)| url.trim().is_empty()) {
            return Err(format!("URL for {} is required", name));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeouts.token(), Duration::from_secs(10));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = GatewayConfig::default();
        config.timeouts.token_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let mut config = GatewayConfig::default();
        config.urls.stone = " ".to_string();
        assert_eq!(config.validate().unwrap_err(), "URL for stone is required");
    }

    #[test]
    fn test_from_env_uses_defaults() {
        let config = GatewayConfig::from_env().unwrap();
        assert!(config.validate().is_ok());
        assert!(!config.urls.jpmorgan.is_empty());
    }
}
