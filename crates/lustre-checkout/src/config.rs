//! # Checkout Configuration
//!
//! Upload limits and balance policy for the checkout services.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     LUSTRE_BULK_MAX_ROWS=1000                                          │
//! │     LUSTRE_BALANCE_WARNING_DAYS=14                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/lustre-store/checkout.toml (Linux)                       │
//! │     ~/Library/Application Support/com.lustre.store/checkout.toml       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     .csv, 5 MB, 500 rows, ₹500 - ₹50,000                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # checkout.toml
//! [bulk_order]
//! allowed_extensions = [".csv"]
//! max_file_size_mb = 5
//! max_rows = 500
//! min_amount = 500      # rupees
//! max_amount = 50000    # rupees
//!
//! [balance]
//! expiry_warning_days = 30
//! validity_months = 12
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use lustre_core::bulk_order::BulkOrderLimits;
use lustre_core::money::Money;
use lustre_core::{
    GIFT_CARD_AMOUNT_STEP, GIFT_CARD_VALIDITY_MONTHS, MAX_GIFT_CARD_AMOUNT, MIN_GIFT_CARD_AMOUNT,
};

use crate::error::{ConfigError, ConfigResult};

const CONFIG_FILE_NAME: &str = "checkout.toml";

// =============================================================================
// Bulk Order Settings
// =============================================================================

/// Limits for bulk order uploads. Amounts are whole rupees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkOrderSettings {
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    #[serde(default = "default_max_rows")]
    pub max_rows: usize,

    #[serde(default = "default_min_amount")]
    pub min_amount: i64,

    #[serde(default = "default_max_amount")]
    pub max_amount: i64,
}

fn default_allowed_extensions() -> Vec<String> {
    vec![".csv".to_string()]
}

fn default_max_file_size_mb() -> u64 {
    5
}

fn default_max_rows() -> usize {
    500
}

fn default_min_amount() -> i64 {
    MIN_GIFT_CARD_AMOUNT
}

fn default_max_amount() -> i64 {
    MAX_GIFT_CARD_AMOUNT
}

impl Default for BulkOrderSettings {
    fn default() -> Self {
        BulkOrderSettings {
            allowed_extensions: default_allowed_extensions(),
            max_file_size_mb: default_max_file_size_mb(),
            max_rows: default_max_rows(),
            min_amount: default_min_amount(),
            max_amount: default_max_amount(),
        }
    }
}

impl BulkOrderSettings {
    /// The limits the CSV validator runs with.
    pub fn limits(&self) -> BulkOrderLimits {
        BulkOrderLimits {
            allowed_extensions: self
                .allowed_extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            max_file_size_mb: self.max_file_size_mb,
            max_rows: self.max_rows,
            min_amount: Money::from_major_units(self.min_amount),
            max_amount: Money::from_major_units(self.max_amount),
        }
    }
}

// =============================================================================
// Balance Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSettings {
    /// Balances expiring within this many days are flagged to the shopper.
    #[serde(default = "default_expiry_warning_days")]
    pub expiry_warning_days: i64,

    /// Lifetime of balance credited from a gift card. 0 = never expires.
    #[serde(default = "default_validity_months")]
    pub validity_months: u32,
}

fn default_expiry_warning_days() -> i64 {
    30
}

fn default_validity_months() -> u32 {
    GIFT_CARD_VALIDITY_MONTHS
}

impl Default for BalanceSettings {
    fn default() -> Self {
        BalanceSettings {
            expiry_warning_days: default_expiry_warning_days(),
            validity_months: default_validity_months(),
        }
    }
}

// =============================================================================
// Main Checkout Configuration
// =============================================================================

/// Complete checkout configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutConfig {
    #[serde(default)]
    pub bulk_order: BulkOrderSettings,

    #[serde(default)]
    pub balance: BalanceSettings,
}

impl CheckoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (checkout.toml)
    /// 3. Environment variables
    ///
    /// An explicit `config_path` must exist; the default path may not.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        let explicit = config_path.is_some();
        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading checkout config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else if explicit {
                return Err(ConfigError::NotFound(path));
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load checkout config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::SaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Checkout config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        let bulk = &self.bulk_order;

        if bulk.allowed_extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "allowed_extensions must not be empty".into(),
            ));
        }
        if let Some(ext) = bulk.allowed_extensions.iter().find(|e| !e.starts_with('.')) {
            return Err(ConfigError::Invalid(format!(
                "extension must start with '.', got: {}",
                ext
            )));
        }

        if bulk.max_file_size_mb == 0 {
            return Err(ConfigError::Invalid(
                "max_file_size_mb must be greater than 0".into(),
            ));
        }
        if bulk.max_rows == 0 {
            return Err(ConfigError::Invalid("max_rows must be greater than 0".into()));
        }

        if bulk.max_amount > Money::MAX_MAJOR_UNITS {
            return Err(ConfigError::Invalid(format!(
                "max_amount must not exceed {}, got {}",
                Money::MAX_MAJOR_UNITS,
                bulk.max_amount
            )));
        }
        if bulk.min_amount <= 0 || bulk.min_amount > bulk.max_amount {
            return Err(ConfigError::Invalid(format!(
                "amount range must satisfy 0 < min <= max, got {}..={}",
                bulk.min_amount, bulk.max_amount
            )));
        }
        let step = GIFT_CARD_AMOUNT_STEP;
        if bulk.min_amount % step != 0 || bulk.max_amount % step != 0 {
            return Err(ConfigError::Invalid(format!(
                "amount bounds must be multiples of {}",
                step
            )));
        }

        if self.balance.expiry_warning_days < 0 {
            return Err(ConfigError::Invalid(
                "expiry_warning_days must not be negative".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(exts) = var("LUSTRE_BULK_ALLOWED_EXTENSIONS") {
            self.bulk_order.allowed_extensions = exts
                .split(',')
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect();
        }

        override_parsed(&var, "LUSTRE_BULK_MAX_FILE_SIZE_MB", &mut self.bulk_order.max_file_size_mb);
        override_parsed(&var, "LUSTRE_BULK_MAX_ROWS", &mut self.bulk_order.max_rows);
        override_parsed(&var, "LUSTRE_BULK_MIN_AMOUNT", &mut self.bulk_order.min_amount);
        override_parsed(&var, "LUSTRE_BULK_MAX_AMOUNT", &mut self.bulk_order.max_amount);
        override_parsed(&var, "LUSTRE_BALANCE_WARNING_DAYS", &mut self.balance.expiry_warning_days);
        override_parsed(&var, "LUSTRE_BALANCE_VALIDITY_MONTHS", &mut self.balance.validity_months);
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "lustre", "store")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn bulk_order_limits(&self) -> BulkOrderLimits {
        self.bulk_order.limits()
    }
}

fn override_parsed<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) {
    let Some(raw) = var(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => {
            debug!(key = %key, value = %raw, "Overriding checkout config from environment");
            *target = value;
        }
        Err(_) => warn!(key = %key, value = %raw, "Ignoring unparsable environment override"),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
