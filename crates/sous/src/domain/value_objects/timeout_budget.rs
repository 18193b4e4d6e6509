//! TimeoutBudget - Layered per-tier wait limits
//!
//! Three strictly increasing durations govern how long each tier waits on
//! one chat turn: the agent's model call, the gateway's wait on the agent,
//! and the client's wait on the gateway. The gateway and telemetry layers
//! never cancel in-flight work at their limit, they only stop waiting, so
//! `agent_processing < gateway < ui` must hold: an inner tier always gives
//! up before the tier outside it does.

use std::time::Duration;

use crate::domain::value_objects::Environment;

pub const DEFAULT_AGENT_PROCESSING: Duration = Duration::from_secs(30);
pub const DEFAULT_GATEWAY: Duration = Duration::from_secs(45);
pub const DEFAULT_UI: Duration = Duration::from_secs(60);
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 2;
pub const DEFAULT_RETRY_DELAY_BASE: Duration = Duration::from_millis(1000);

/// Relaxation applied to every tier outside production.
const NON_PRODUCTION_SCALE: f64 = 1.5;

/// Process-wide, read-only wait limits and retry parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutBudget {
    pub agent_processing: Duration,
    pub gateway: Duration,
    pub ui: Duration,
    pub retry_attempts: u32,
    pub retry_delay_base: Duration,
}

impl Default for TimeoutBudget {
    fn default() -> Self {
        Self {
            agent_processing: DEFAULT_AGENT_PROCESSING,
            gateway: DEFAULT_GATEWAY,
            ui: DEFAULT_UI,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay_base: DEFAULT_RETRY_DELAY_BASE,
        }
    }
}

impl TimeoutBudget {
    /// Build a validated budget. Ordering violations are a startup
    /// failure, never a request-time one.
    pub fn new(
        agent_processing: Duration,
        gateway: Duration,
        ui: Duration,
        retry_attempts: u32,
        retry_delay_base: Duration,
    ) -> Result<Self, String> {
        let budget = Self {
            agent_processing,
            gateway,
            ui,
            retry_attempts,
            retry_delay_base,
        };
        budget.validate()?;
        Ok(budget)
    }

    fn validate(&self) -> Result<(), String> {
        if self.agent_processing >= self.gateway {
            return Err(format!(
                "Timeout budget violates AGENT_PROCESSING < GATEWAY: {:?} >= {:?}",
                self.agent_processing, self.gateway
            ));
        }
        if self.gateway >= self.ui {
            return Err(format!(
                "Timeout budget violates GATEWAY < UI: {:?} >= {:?}",
                self.gateway, self.ui
            ));
        }
        Ok(())
    }

    /// The budget scaled for a deployment environment. Production runs the
    /// configured limits as-is; everything else is relaxed. The ordering
    /// invariant is re-checked after scaling.
    pub fn scaled_for(&self, env: Environment) -> Result<Self, String> {
        if env.is_production() {
            return Ok(self.clone());
        }

        let scaled = Self {
            agent_processing: self.agent_processing.mul_f64(NON_PRODUCTION_SCALE),
            gateway: self.gateway.mul_f64(NON_PRODUCTION_SCALE),
            ui: self.ui.mul_f64(NON_PRODUCTION_SCALE),
            retry_attempts: self.retry_attempts,
            retry_delay_base: self.retry_delay_base,
        };
        scaled.validate()?;
        Ok(scaled)
    }

    /// Backoff delay before retry attempt `attempt` (0-based): doubles
    /// each attempt from the configured base.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.retry_delay_base * 2u32.saturating_pow(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(TimeoutBudget::default().validate().is_ok());
    }

    #[test]
    fn test_agent_must_be_below_gateway() {
        let result = TimeoutBudget::new(
            Duration::from_secs(45),
            Duration::from_secs(45),
            Duration::from_secs(60),
            2,
            Duration::from_millis(1000),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_gateway_must_be_below_ui() {
        let result = TimeoutBudget::new(
            Duration::from_secs(30),
            Duration::from_secs(60),
            Duration::from_secs(60),
            2,
            Duration::from_millis(1000),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_scaling_preserves_ordering() {
        let budget = TimeoutBudget::default();

        let production = budget.scaled_for(Environment::Production).unwrap();
        assert_eq!(production, budget);

        let development = budget.scaled_for(Environment::Development).unwrap();
        assert!(development.agent_processing > budget.agent_processing);
        assert!(development.agent_processing < development.gateway);
        assert!(development.gateway < development.ui);
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let budget = TimeoutBudget::default();
        assert_eq!(budget.backoff_delay(0), Duration::from_millis(1000));
        assert_eq!(budget.backoff_delay(1), Duration::from_millis(2000));
        assert_eq!(budget.backoff_delay(2), Duration::from_millis(4000));
    }
}
