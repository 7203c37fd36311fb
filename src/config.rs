//! Configuration for the E-LIP bridge
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::error::{ElipError, Result};

/// Main configuration for a bridge session
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Hostname or IP of the E-LIP controller
    pub host: String,

    /// TCP port of the E-LIP controller
    pub port: u16,

    /// Receive buffer hint (bytes). Informational only: reads are sized by
    /// the frame header.
    pub receive_buffer_size: usize,

    /// Upper bound for completing a frame once its first byte has arrived
    pub frame_read_timeout: Duration,

    // -------------------------------------------------------------------------
    // Session Timing
    // -------------------------------------------------------------------------
    /// Period between health check messages while connected
    pub health_check_period: Duration,

    /// Sleep between two session cycles
    pub idle_interval: Duration,

    /// Extra sleep after a transport failure, before the next cycle
    pub retry_cooldown: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 60173,
            receive_buffer_size: 4096,
            frame_read_timeout: Duration::from_secs(1),
            health_check_period: Duration::from_secs(60),
            idle_interval: Duration::from_millis(100),
            retry_cooldown: Duration::from_secs(5),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// `host:port` of the controller
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Number of cycles between two health checks.
    ///
    /// `ceil(health_check_period / idle_interval)`, never less than 1.
    pub fn health_check_cycle(&self) -> u64 {
        let idle = self.idle_interval.as_nanos().max(1);
        let period = self.health_check_period.as_nanos();
        let cycles = (period + idle - 1) / idle;
        u64::try_from(cycles).unwrap_or(u64::MAX).max(1)
    }

    /// Reject configurations the session loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ElipError::Config("host must not be empty".to_string()));
        }
        if self.idle_interval.is_zero() {
            return Err(ElipError::Config(
                "idle interval must be greater than zero".to_string(),
            ));
        }
        // A zero read timeout is rejected by the socket layer
        if self.frame_read_timeout.is_zero() {
            return Err(ElipError::Config(
                "frame read timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the controller hostname
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the controller TCP port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the receive buffer hint (in bytes)
    pub fn receive_buffer_size(mut self, size: usize) -> Self {
        self.config.receive_buffer_size = size;
        self
    }

    /// Set the timeout for completing a partially received frame
    pub fn frame_read_timeout(mut self, timeout: Duration) -> Self {
        self.config.frame_read_timeout = timeout;
        self
    }

    /// Set the health check period
    pub fn health_check_period(mut self, period: Duration) -> Self {
        self.config.health_check_period = period;
        self
    }

    /// Set the idle interval between cycles
    pub fn idle_interval(mut self, interval: Duration) -> Self {
        self.config.idle_interval = interval;
        self
    }

    /// Set the cooldown applied after a transport failure
    pub fn retry_cooldown(mut self, cooldown: Duration) -> Self {
        self.config.retry_cooldown = cooldown;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
