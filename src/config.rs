//! Runtime configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! [limits]
//! max_record_bytes = 16777216
//! record_alignment = 8
//!
//! [batch]
//! capacity_records = 16
//!
//! [registry]
//! kinds = ["mouse", "keyboard", "hid"]
//! ```

use crate::device::DeviceKind;
use crate::error::ConfigError;
use crate::layout::POINTER_ALIGN;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest record the decoder will allocate for (16 MiB).
pub const DEFAULT_MAX_RECORD_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub limits: DecodeLimits,
    pub batch: BatchConfig,
    pub registry: RegistryConfig,
}

/// Bounds applied while decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecodeLimits {
    /// Sizes above this are rejected as unreasonable.
    pub max_record_bytes: u64,
    /// Stride alignment between batched records. Must be a power of two.
    pub record_alignment: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
            record_alignment: POINTER_ALIGN,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// How many minimum-size records each `GetRawInputBuffer` call has room for.
    pub capacity_records: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            capacity_records: 16,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Device kinds kept on refresh. Others are skipped before any per-device query.
    pub kinds: Vec<DeviceKind>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            kinds: vec![DeviceKind::Mouse, DeviceKind::Keyboard, DeviceKind::Hid],
        }
    }
}

impl RegistryConfig {
    pub fn keeps(&self, kind: DeviceKind) -> bool {
        self.kinds.contains(&kind)
    }
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Config = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let align = self.limits.record_alignment;
        if align == 0 || !align.is_power_of_two() {
            return Err(ConfigError::Invalid(format!(
                "record_alignment must be a power of two, got {align}"
            )));
        }
        if self.limits.max_record_bytes == 0 {
            return Err(ConfigError::Invalid("max_record_bytes must be non-zero".into()));
        }
        if self.batch.capacity_records == 0 {
            return Err(ConfigError::Invalid("capacity_records must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.limits.max_record_bytes, 16 * 1024 * 1024);
        assert_eq!(cfg.limits.record_alignment, core::mem::size_of::<usize>());
    }

    #[test]
    fn partial_override() {
        let cfg = Config::from_toml_str(
            r#"
            [batch]
            capacity_records = 64

            [registry]
            kinds = ["hid"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.batch.capacity_records, 64);
        assert!(cfg.registry.keeps(DeviceKind::Hid));
        assert!(!cfg.registry.keeps(DeviceKind::Mouse));
        assert_eq!(cfg.limits, DecodeLimits::default());
    }

    #[test]
    fn rejects_bad_alignment() {
        let err = Config::from_toml_str("[limits]\nrecord_alignment = 6\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = Config::from_toml_str("[limits]\nmax_bytes = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = Config::load("/nonexistent/rawinput.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
