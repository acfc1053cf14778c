//! Audit recorder configuration.
//!
//! # Environment Variables
//!
//! - `AUDIT_ENABLED`: record sensitive actions (default: true)
//! - `AUDIT_QUEUE_CAPACITY`: bounded queue size between requests and the audit worker (default: 1024)
//! - `AUDIT_EXTRA_SENSITIVE_RESOURCES`: comma separated resource names added to the built-in sensitive list

use std::env;

use crate::{parse_flag, parse_list};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditConfig {
    pub enabled: bool,
    /// Records beyond this many in flight are dropped, never awaited.
    pub queue_capacity: usize,
    pub extra_sensitive_resources: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queue_capacity: 1024,
            extra_sensitive_resources: Vec::new(),
        }
    }
}

impl AuditConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env::var("AUDIT_ENABLED")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.enabled),
            queue_capacity: env::var("AUDIT_QUEUE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|capacity: &usize| *capacity > 0)
                .unwrap_or(defaults.queue_capacity),
            extra_sensitive_resources: env::var("AUDIT_EXTRA_SENSITIVE_RESOURCES")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
        }
    }
}
