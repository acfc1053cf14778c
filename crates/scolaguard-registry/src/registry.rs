//! Module enablement and dependency resolution.
//!
//! Dependencies are walked transitively: FINANCES needs INSCRIPTIONS, and if
//! INSCRIPTIONS itself grew a dependency that is off, FINANCES is reported
//! unsatisfied too. Only enabled modules are descended into; a disabled
//! dependency is reported once and its own dependencies are not.
//!
//! A scope with no module rows at all has not been initialized yet. While
//! `bootstrap_enabled` is set, a missing row in such a scope does not count
//! as a missing dependency, so the first modules of a school level can be
//! switched on before `initialize_defaults` ran. Once any row exists the
//! exception no longer applies.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use scolaguard_config::RegistryConfig;
use scolaguard_core::{AppError, AuthzError};
use scolaguard_models::{
    Module, ModuleStatus, ModuleType,
    ids::{SchoolLevelId, TenantId},
};

use crate::catalog;
use crate::store::{ModuleStore, StoreError, StoreResult};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Denied(#[from] AuthzError),

    #[error("module {module} cannot be disabled while {} depend on it", join(.dependents))]
    DependentsEnabled {
        module: ModuleType,
        dependents: Vec<ModuleType>,
    },
}

fn join(modules: &[ModuleType]) -> String {
    modules
        .iter()
        .map(ModuleType::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl RegistryError {
    pub fn into_app_error(self) -> AppError {
        match self {
            Self::Store(err) => err.into_app_error(),
            Self::Denied(err) => err.into(),
            err @ Self::DependentsEnabled { .. } => AppError::conflict(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyCheck {
    pub satisfied: bool,
    /// Every dependency found not enabled, in discovery order.
    pub missing: Vec<ModuleType>,
}

impl DependencyCheck {
    fn from_missing(missing: Vec<ModuleType>) -> Self {
        Self {
            satisfied: missing.is_empty(),
            missing,
        }
    }
}

#[derive(Clone)]
pub struct ModuleRegistry {
    store: Arc<dyn ModuleStore>,
    config: RegistryConfig,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("backend", &self.store.backend_name())
            .field("config", &self.config)
            .finish()
    }
}

impl ModuleRegistry {
    pub fn new(store: Arc<dyn ModuleStore>, config: RegistryConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    #[instrument(skip(self))]
    pub async fn find(
        &self,
        tenant_id: TenantId,
        module_type: ModuleType,
        school_level_id: SchoolLevelId,
    ) -> StoreResult<Option<Module>> {
        self.store
            .find_by_type(tenant_id, module_type, school_level_id)
            .await
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        tenant_id: TenantId,
        school_level_id: SchoolLevelId,
    ) -> StoreResult<Vec<Module>> {
        self.store.list(tenant_id, school_level_id).await
    }

    /// Enabled flag set and status active.
    #[instrument(skip(self))]
    pub async fn is_enabled(
        &self,
        tenant_id: TenantId,
        module_type: ModuleType,
        school_level_id: SchoolLevelId,
    ) -> StoreResult<bool> {
        Ok(self
            .store
            .find_enabled(tenant_id, module_type, school_level_id)
            .await?
            .is_some())
    }

    #[instrument(skip(self))]
    pub async fn dependencies_satisfied(
        &self,
        tenant_id: TenantId,
        module_type: ModuleType,
        school_level_id: SchoolLevelId,
    ) -> StoreResult<DependencyCheck> {
        let declared = match self
            .store
            .find_by_type(tenant_id, module_type, school_level_id)
            .await?
        {
            Some(module) => module.dependencies,
            None => {
                if self.bootstrapping(tenant_id, school_level_id).await? {
                    debug!(%module_type, "Scope not initialized, dependency check skipped");
                    return Ok(DependencyCheck::from_missing(Vec::new()));
                }
                catalog::definition(module_type).dependencies.to_vec()
            }
        };

        let mut visited: HashSet<ModuleType> = HashSet::from([module_type]);
        let mut queue: VecDeque<ModuleType> = declared.into_iter().collect();
        let mut missing = Vec::new();
        // Computed at most once per check.
        let mut bootstrapping: Option<bool> = None;

        while let Some(dependency) = queue.pop_front() {
            if !visited.insert(dependency) {
                continue;
            }

            match self
                .store
                .find_by_type(tenant_id, dependency, school_level_id)
                .await?
            {
                Some(row) if row.is_operational() => queue.extend(row.dependencies),
                Some(_) => missing.push(dependency),
                None => {
                    let bootstrap = match bootstrapping {
                        Some(b) => b,
                        None => {
                            let b = self.bootstrapping(tenant_id, school_level_id).await?;
                            bootstrapping = Some(b);
                            b
                        }
                    };
                    if !bootstrap {
                        missing.push(dependency);
                    }
                }
            }
        }

        Ok(DependencyCheck::from_missing(missing))
    }

    async fn bootstrapping(
        &self,
        tenant_id: TenantId,
        school_level_id: SchoolLevelId,
    ) -> StoreResult<bool> {
        if !self.config.bootstrap_enabled {
            return Ok(false);
        }
        Ok(self.store.list(tenant_id, school_level_id).await?.is_empty())
    }

    /// Fails with `ModuleDisabled` or `DependencyUnsatisfied`, else returns the row.
    #[instrument(skip(self))]
    pub async fn require_operational(
        &self,
        tenant_id: TenantId,
        module_type: ModuleType,
        school_level_id: SchoolLevelId,
    ) -> Result<Module, RegistryError> {
        let Some(module) = self
            .store
            .find_enabled(tenant_id, module_type, school_level_id)
            .await?
        else {
            return Err(AuthzError::ModuleDisabled {
                module: module_type.to_string(),
            }
            .into());
        };

        let check = self
            .dependencies_satisfied(tenant_id, module_type, school_level_id)
            .await?;
        if !check.satisfied {
            return Err(dependency_error(module_type, &check).into());
        }

        Ok(module)
    }

    /// Seeds the default module set. Rows that already exist are returned as
    /// they are, so running this twice yields the same rows.
    #[instrument(skip(self))]
    pub async fn initialize_defaults(
        &self,
        tenant_id: TenantId,
        school_level_id: SchoolLevelId,
    ) -> StoreResult<Vec<Module>> {
        let mut modules = Vec::with_capacity(catalog::definitions().len());
        let mut created = 0usize;

        for definition in catalog::definitions() {
            let module_type = definition.module_type;
            if let Some(existing) = self
                .store
                .find_by_type(tenant_id, module_type, school_level_id)
                .await?
            {
                modules.push(existing);
                continue;
            }

            let new = definition.to_new_module(
                tenant_id,
                school_level_id,
                definition.enabled_by_default,
            );
            match self.store.create(new).await {
                Ok(module) => {
                    created += 1;
                    modules.push(module);
                }
                // Lost a race with a concurrent initialization.
                Err(StoreError::Conflict(_)) => {
                    let existing = self
                        .store
                        .find_by_type(tenant_id, module_type, school_level_id)
                        .await?
                        .ok_or_else(|| StoreError::NotFound(module_type.to_string()))?;
                    modules.push(existing);
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            %tenant_id,
            %school_level_id,
            created,
            total = modules.len(),
            "Default modules initialized"
        );
        Ok(modules)
    }

    /// Enables a module once every dependency is enabled and puts it back to
    /// `Active`. Creates the row from the catalogue when the scope has none for
    /// this type yet.
    #[instrument(skip(self))]
    pub async fn enable(
        &self,
        tenant_id: TenantId,
        module_type: ModuleType,
        school_level_id: SchoolLevelId,
    ) -> Result<Module, RegistryError> {
        let check = self
            .dependencies_satisfied(tenant_id, module_type, school_level_id)
            .await?;
        if !check.satisfied {
            warn!(%module_type, missing = ?check.missing, "Refusing to enable module");
            return Err(dependency_error(module_type, &check).into());
        }

        let module = match self
            .store
            .find_by_type(tenant_id, module_type, school_level_id)
            .await?
        {
            Some(mut module) => {
                module.enabled = true;
                module.status = ModuleStatus::Active;
                self.store.update(&module).await?
            }
            None => {
                let new =
                    catalog::definition(module_type).to_new_module(tenant_id, school_level_id, true);
                self.store.create(new).await?
            }
        };

        info!(%tenant_id, %school_level_id, %module_type, "Module enabled");
        Ok(module)
    }

    /// Disables a module. Refused while an enabled module depends on it.
    #[instrument(skip(self))]
    pub async fn disable(
        &self,
        tenant_id: TenantId,
        module_type: ModuleType,
        school_level_id: SchoolLevelId,
    ) -> Result<Module, RegistryError> {
        let mut module = self
            .store
            .find_by_type(tenant_id, module_type, school_level_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("module {module_type}")))?;

        self.ensure_no_dependents(tenant_id, module_type, school_level_id)
            .await?;

        module.enabled = false;
        let module = self.store.update(&module).await?;
        info!(%tenant_id, %school_level_id, %module_type, "Module disabled");
        Ok(module)
    }

    /// Changes the lifecycle status. Leaving `Active` is refused while an
    /// operational module depends on this one, like [`Self::disable`].
    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        tenant_id: TenantId,
        module_type: ModuleType,
        school_level_id: SchoolLevelId,
        status: ModuleStatus,
    ) -> Result<Module, RegistryError> {
        let mut module = self
            .store
            .find_by_type(tenant_id, module_type, school_level_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("module {module_type}")))?;

        if status != ModuleStatus::Active {
            self.ensure_no_dependents(tenant_id, module_type, school_level_id)
                .await?;
        }

        module.status = status;
        let module = self.store.update(&module).await?;
        info!(%tenant_id, %school_level_id, %module_type, %status, "Module status changed");
        Ok(module)
    }

    async fn ensure_no_dependents(
        &self,
        tenant_id: TenantId,
        module_type: ModuleType,
        school_level_id: SchoolLevelId,
    ) -> Result<(), RegistryError> {
        let dependents: Vec<ModuleType> = self
            .store
            .list(tenant_id, school_level_id)
            .await?
            .into_iter()
            .filter(|m| m.is_operational() && m.dependencies.contains(&module_type))
            .map(|m| m.module_type)
            .collect();
        if dependents.is_empty() {
            return Ok(());
        }
        warn!(%module_type, ?dependents, "Module still has operational dependents");
        Err(RegistryError::DependentsEnabled {
            module: module_type,
            dependents,
        })
    }
}

fn dependency_error(module_type: ModuleType, check: &DependencyCheck) -> AuthzError {
    let missing: BTreeSet<&str> = check.missing.iter().map(ModuleType::as_str).collect();
    AuthzError::DependencyUnsatisfied {
        module: module_type.to_string(),
        missing: missing.into_iter().map(str::to_string).collect(),
    }
}
