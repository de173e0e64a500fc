//! Configuration for the annotation engine

use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub readiness: ReadinessConfig,
}

/// Retry budget for waiting on a freshly created render surface.
///
/// A surface reports not-ready between creation and first layout. Callers
/// poll `readiness_check` up to `max_attempts` times, doubling the delay
/// after each miss.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadinessConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            readiness: ReadinessConfig {
                max_attempts: 5,
                initial_delay_ms: 50,
            },
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = EngineConfig::default();
        EngineConfig {
            readiness: ReadinessConfig {
                max_attempts: env::var("MARGINALIA_READINESS_ATTEMPTS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.readiness.max_attempts),
                initial_delay_ms: env::var("MARGINALIA_READINESS_DELAY_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.readiness.initial_delay_ms),
            },
        }
    }
}

impl ReadinessConfig {
    /// Delay to sleep after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.initial_delay_ms.saturating_mul(factor))
    }
}
