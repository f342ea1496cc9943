//! Configuration module
//!
//! Engine settings are read from a TOML file
//! (~/.config/tazkara/config.toml by default). Every section and key
//! is optional; missing keys fall back to the defaults below.

use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::shared::errors::{DomainError, DomainResult};

/// Engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub reservation: ReservationConfig,
    pub payment: PaymentConfig,
    pub cancellation: CancellationPolicy,
}

/// Reservation coordinator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservationConfig {
    /// How long a hold keeps inventory before the sweep may release it
    pub hold_duration_minutes: i64,
    /// How often the expiry sweep runs
    pub sweep_interval_secs: u64,
    /// Bounded wait for per-ticket-type lock acquisition
    pub lock_wait_ms: u64,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            hold_duration_minutes: 15,
            sweep_interval_secs: 60,
            lock_wait_ms: 5000,
        }
    }
}

/// Payment processing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    /// Capture attempts against the gateway before the booking is
    /// cancelled for payment failure
    pub max_attempts: u32,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// When a confirmed booking may still be cancelled
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CancellationPolicy {
    /// Refuse cancellation once any attendee has checked in
    pub forbid_after_check_in: bool,
    /// Refuse cancellation once the event has started
    pub forbid_after_event_start: bool,
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        Self {
            forbid_after_check_in: true,
            forbid_after_event_start: true,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file. Values that would break
    /// the engine at runtime are rejected here, not where they are
    /// first used.
    pub fn load(path: &Path) -> DomainResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Validation(format!("Cannot read config {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&raw).map_err(|e| {
            DomainError::Validation(format!("Cannot parse config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> DomainResult<()> {
        if self.payment.max_attempts == 0 {
            return Err(DomainError::Validation(
                "payment.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.reservation.sweep_interval_secs == 0 {
            return Err(DomainError::Validation(
                "reservation.sweep_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn hold_duration(&self) -> Duration {
        Duration::minutes(self.reservation.hold_duration_minutes)
    }

    pub fn sweep_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.reservation.sweep_interval_secs)
    }

    pub fn lock_wait(&self) -> StdDuration {
        StdDuration::from_millis(self.reservation.lock_wait_ms)
    }
}

/// Default config file location: `~/.config/tazkara/config.toml`.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tazkara")
        .join("config.toml")
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = EngineConfig::default();
        assert_eq!(config.reservation.hold_duration_minutes, 15);
        assert_eq!(config.reservation.sweep_interval_secs, 60);
        assert_eq!(config.payment.max_attempts, 3);
        assert!(config.cancellation.forbid_after_check_in);
        assert!(config.cancellation.forbid_after_event_start);
    }

    #[test]
    fn partial_toml_keeps_defaults_for_the_rest() {
        let config: EngineConfig = toml::from_str(
            r#"
            [reservation]
            hold_duration_minutes = 5

            [payment]
            max_attempts = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.reservation.hold_duration_minutes, 5);
        assert_eq!(config.reservation.sweep_interval_secs, 60);
        assert_eq!(config.payment.max_attempts, 5);
    }

    #[test]
    fn duration_accessors() {
        let config = EngineConfig::default();
        assert_eq!(config.hold_duration(), Duration::minutes(15));
        assert_eq!(config.sweep_interval(), StdDuration::from_secs(60));
        assert_eq!(config.lock_wait(), StdDuration::from_millis(5000));
    }

    #[test]
    fn load_missing_file_fails_with_validation() {
        let result = EngineConfig::load(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    fn load_toml(body: &str) -> DomainResult<EngineConfig> {
        let path = std::env::temp_dir().join(format!("tazkara-config-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, body).unwrap();
        let result = EngineConfig::load(&path);
        std::fs::remove_file(&path).ok();
        result
    }

    #[test]
    fn load_rejects_zero_retry_budget() {
        let result = load_toml(
            r#"
            [payment]
            max_attempts = 0
            "#,
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn load_rejects_zero_sweep_interval() {
        let result = load_toml(
            r#"
            [reservation]
            sweep_interval_secs = 0
            "#,
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn default_path_ends_with_crate_dir() {
        let path = default_config_path();
        assert!(path.ends_with("tazkara/config.toml"));
    }
}
