// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Health check types for upstream clients

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

const DEFAULT_HEALTH_CHECK_TIMEOUT_SECONDS: u64 = 5;

/// Health status of an API client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum HealthStatus {
    /// Service is healthy and operational
    Up,
    /// Service is degraded but still functional
    Degraded { reason: String },
    /// Service is down and not functional
    Down { reason: String },
}

impl HealthStatus {
    /// Check if this health status indicates the service is available
    pub fn is_available(&self) -> bool {
        matches!(self, HealthStatus::Up | HealthStatus::Degraded { .. })
    }

    /// Check if this health status indicates the service is completely down
    pub fn is_down(&self) -> bool {
        matches!(self, HealthStatus::Down { .. })
    }

    /// Get a human-readable description of the status
    pub fn description(&self) -> &str {
        match self {
            HealthStatus::Up => "Service is healthy",
            HealthStatus::Degraded { reason } | HealthStatus::Down { reason } => reason,
        }
    }

    /// Classify the status code returned by an upstream health probe
    ///
    /// 2xx is up, 401/403 and 5xx are down, anything else (429 included) is degraded.
    pub fn from_probe_status(status: StatusCode) -> Self {
        if status.is_success() {
            HealthStatus::Up
        } else if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            HealthStatus::Down {
                reason: "Authentication failed".to_string(),
            }
        } else if status.is_server_error() {
            HealthStatus::Down {
                reason: format!("API returned status {}", status.as_u16()),
            }
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            HealthStatus::Degraded {
                reason: "Rate limited".to_string(),
            }
        } else {
            HealthStatus::Degraded {
                reason: format!("API returned status {}", status.as_u16()),
            }
        }
    }
}

/// Health of one upstream client as reported by `/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// The health status
    pub status: HealthStatus,
    /// Probe round trip in milliseconds
    pub response_time_ms: u64,
    /// When the probe finished
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    /// Build a report for a probe that took `response_time`
    pub fn new(status: HealthStatus, response_time: Duration) -> Self {
        Self {
            status,
            response_time_ms: u64::try_from(response_time.as_millis()).unwrap_or(u64::MAX),
            checked_at: Utc::now(),
        }
    }
}

/// Health check configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckConfig {
    /// Timeout for each upstream probe
    pub timeout: Duration,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_HEALTH_CHECK_TIMEOUT_SECONDS),
        }
    }
}
