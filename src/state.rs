use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use scolaguard_cache::{CacheConfig, RedisCache};
use scolaguard_config::{AuditConfig, CorsConfig, JwtConfig, RegistryConfig};
use scolaguard_db::{PgPool, init_db_pool, run_migrations};
use scolaguard_registry::{
    AccessMatrix, ModuleRegistry, ModuleStore,
    store::{cached::CachedModuleStore, postgres::PgModuleStore},
};

use crate::engine::Engine;
use crate::engine::audit::{AuditRecorder, PgAuditSink};
use crate::engine::roles::PgRoleCatalog;
use crate::router::route_table;

#[derive(Clone, Debug)]
pub struct AppState {
    pub engine: Engine,
    pub audit: AuditRecorder,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    /// Largest request body buffered by the audit and guard layers.
    pub body_limit: usize,
}

impl AppState {
    pub fn registry(&self) -> &ModuleRegistry {
        self.engine.registry()
    }
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let pool = init_db_pool()
        .await
        .context("Failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    let registry_config = RegistryConfig::from_env();
    let store = module_store(pool.clone(), &registry_config).await;
    let registry = ModuleRegistry::new(store, registry_config.clone());

    let engine = Engine::new(
        registry,
        AccessMatrix::standard(),
        Arc::new(PgRoleCatalog::new(pool.clone())),
        route_table(),
    );

    let audit = AuditRecorder::spawn(Arc::new(PgAuditSink::new(pool)), &AuditConfig::from_env());

    Ok(AppState {
        engine,
        audit,
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        body_limit: registry_config.body_limit_bytes,
    })
}

/// Postgres, behind Redis when `REDIS_URL` is set and reachable.
async fn module_store(pool: PgPool, config: &RegistryConfig) -> Arc<dyn ModuleStore> {
    let postgres = PgModuleStore::new(pool);

    let Some(cache_config) = CacheConfig::from_env() else {
        info!("REDIS_URL not set, module cache disabled");
        return Arc::new(postgres);
    };

    let ttl = std::time::Duration::from_secs(config.cache_ttl_seconds);
    match RedisCache::new(&cache_config.redis_url, ttl).await {
        Ok(cache) => {
            info!("Module cache enabled");
            Arc::new(CachedModuleStore::new(postgres, cache))
        }
        Err(e) => {
            warn!(error = %e, "Redis unavailable, module cache disabled");
            Arc::new(postgres)
        }
    }
}
