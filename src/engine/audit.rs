//! Audit recording.
//!
//! Requests hand records to [`AuditRecorder::record`], which never waits: the
//! record goes into a bounded queue drained by one background worker. A full
//! queue or a failing sink drops the record with a log line; the request is
//! never delayed or failed by auditing.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::Method;
use serde_json::{Map, Value};
use sqlx::PgPool;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{error, info, warn};

use scolaguard_config::AuditConfig;
use scolaguard_models::{AuditRecord, ids::AuditLogId};

use crate::metrics::track_audit_dropped;

/// Resources audited on every request, reads included.
pub const SENSITIVE_RESOURCES: &[&str] = &[
    "users",
    "roles",
    "permissions",
    "payments",
    "fees",
    "grades",
    "modules",
    "audit-logs",
    "settings",
];

/// Keys removed from audited payloads, at any depth.
const REDACTED_KEYS: &[&str] = &[
    "password",
    "token",
    "secret",
    "refresh_token",
    "access_token",
    "api_key",
    "otp",
    "pin",
];

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, record: &AuditRecord) -> anyhow::Result<()>;

    fn name(&self) -> &'static str;
}

/// Writes to the `audit_logs` table.
#[derive(Debug, Clone)]
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn append(&self, record: &AuditRecord) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO audit_logs \
             (id, tenant_id, user_id, action, resource, resource_id, changes, ip_address, user_agent, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(AuditLogId::new())
        .bind(record.tenant_id)
        .bind(record.user_id)
        .bind(&record.action)
        .bind(&record.resource)
        .bind(&record.resource_id)
        .bind(&record.changes)
        .bind(&record.ip_address)
        .bind(&record.user_agent)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

/// Emits records as log events only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn append(&self, record: &AuditRecord) -> anyhow::Result<()> {
        info!(
            target: "audit",
            tenant_id = %record.tenant_id,
            user_id = ?record.user_id,
            action = %record.action,
            resource = %record.resource,
            resource_id = ?record.resource_id,
            "Audit record"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "tracing"
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryAuditSink;

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    /// Keeps records in memory for assertions.
    #[derive(Debug, Clone, Default)]
    pub struct MemoryAuditSink {
        records: Arc<Mutex<Vec<AuditRecord>>>,
        failing: bool,
    }

    impl MemoryAuditSink {
        pub fn new() -> Self {
            Self::default()
        }

        /// A sink whose every append fails.
        pub fn failing() -> Self {
            Self {
                failing: true,
                ..Self::default()
            }
        }

        pub fn records(&self) -> Vec<AuditRecord> {
            self.records
                .lock()
                .map(|records| records.clone())
                .unwrap_or_default()
        }

        /// Polls until at least `count` records arrived or a second passed.
        pub async fn wait_for(&self, count: usize) -> Vec<AuditRecord> {
            for _ in 0..100 {
                let records = self.records();
                if records.len() >= count {
                    return records;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            self.records()
        }
    }

    #[async_trait]
    impl AuditSink for MemoryAuditSink {
        async fn append(&self, record: &AuditRecord) -> anyhow::Result<()> {
            if self.failing {
                anyhow::bail!("audit sink unavailable");
            }
            self.records
                .lock()
                .map_err(|_| anyhow::anyhow!("audit sink poisoned"))?
                .push(record.clone());
            Ok(())
        }

        fn name(&self) -> &'static str {
            "memory"
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditRecorder {
    tx: Option<mpsc::Sender<AuditRecord>>,
    sensitive: Arc<HashSet<String>>,
}

impl AuditRecorder {
    /// Starts the worker. Must be called from within a Tokio runtime.
    pub fn spawn(sink: Arc<dyn AuditSink>, config: &AuditConfig) -> Self {
        if !config.enabled {
            return Self::disabled(config);
        }

        let (tx, mut rx) = mpsc::channel::<AuditRecord>(config.queue_capacity.max(1));
        let sink_name = sink.name();
        tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                let action = record.action.clone();
                let sink = Arc::clone(&sink);
                // A panicking sink only loses the record it was writing.
                let written = tokio::spawn(async move { sink.append(&record).await }).await;
                match written {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        error!(sink = sink_name, %action, error = %e, "Failed to write audit record");
                        track_audit_dropped("sink_error");
                    }
                    Err(e) => {
                        error!(sink = sink_name, %action, error = %e, "Audit sink panicked");
                        track_audit_dropped("sink_panic");
                    }
                }
            }
        });

        Self {
            tx: Some(tx),
            sensitive: Arc::new(sensitive_set(config)),
        }
    }

    pub fn disabled(config: &AuditConfig) -> Self {
        Self {
            tx: None,
            sensitive: Arc::new(sensitive_set(config)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Writes are always sensitive; reads only for listed resources.
    pub fn is_sensitive(&self, method: &Method, resource: &str) -> bool {
        let write = !(*method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS);
        write || self.sensitive.contains(&resource.to_lowercase())
    }

    /// Queues a record without waiting.
    pub fn record(&self, record: AuditRecord) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(record)) => {
                warn!(action = %record.action, "Audit queue full, record dropped");
                track_audit_dropped("queue_full");
            }
            Err(TrySendError::Closed(record)) => {
                warn!(action = %record.action, "Audit worker stopped, record dropped");
                track_audit_dropped("closed");
            }
        }
    }
}

fn sensitive_set(config: &AuditConfig) -> HashSet<String> {
    SENSITIVE_RESOURCES
        .iter()
        .map(|r| r.to_string())
        .chain(
            config
                .extra_sensitive_resources
                .iter()
                .map(|r| r.to_lowercase()),
        )
        .collect()
}

/// Copy of `value` with secret-bearing keys removed.
pub fn sanitize(value: &Value) -> Value {
    match value {
        Value::Object(object) => Value::Object(
            object
                .iter()
                .filter(|(key, _)| !is_redacted(key))
                .map(|(key, value)| (key.clone(), sanitize(value)))
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(sanitize).collect()),
        other => other.clone(),
    }
}

fn is_redacted(key: &str) -> bool {
    REDACTED_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// `POST /api/modules/...` becomes `CREATE_MODULES`.
pub fn action_name(method: &Method, resource: &str) -> String {
    let verb = match *method {
        Method::POST => "CREATE",
        Method::PUT | Method::PATCH => "UPDATE",
        Method::DELETE => "DELETE",
        _ => "READ",
    };
    format!("{verb}_{}", resource.to_uppercase().replace('-', "_"))
}
