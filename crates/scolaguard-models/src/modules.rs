//! Module domain models and DTOs.
//!
//! A module is a functional capability area (scolarite, finances, exams...)
//! that is enabled independently for each tenant and school level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{
    Database, Decode, Encode, FromRow, Type,
    postgres::{PgHasArrayType, PgTypeInfo},
};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::Validate;

use crate::access::AccessLevel;
use crate::context::RequestContext;
use crate::ids::{ModuleId, SchoolLevelId, TenantId};

/// The fixed set of modules a school level can enable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModuleType {
    Scolarite,
    Finances,
    Examens,
    Communication,
    Presences,
    EmploiDuTemps,
    Bibliotheque,
    Transport,
    Cantine,
    RessourcesHumaines,
    Discipline,
    Infirmerie,
    Inscriptions,
    Pedagogie,
    PortailParents,
    Evenements,
    Inventaire,
    Rapports,
    Parametres,
    Orientation,
}

impl ModuleType {
    pub const ALL: [ModuleType; 20] = [
        Self::Scolarite,
        Self::Finances,
        Self::Examens,
        Self::Communication,
        Self::Presences,
        Self::EmploiDuTemps,
        Self::Bibliotheque,
        Self::Transport,
        Self::Cantine,
        Self::RessourcesHumaines,
        Self::Discipline,
        Self::Infirmerie,
        Self::Inscriptions,
        Self::Pedagogie,
        Self::PortailParents,
        Self::Evenements,
        Self::Inventaire,
        Self::Rapports,
        Self::Parametres,
        Self::Orientation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scolarite => "SCOLARITE",
            Self::Finances => "FINANCES",
            Self::Examens => "EXAMENS",
            Self::Communication => "COMMUNICATION",
            Self::Presences => "PRESENCES",
            Self::EmploiDuTemps => "EMPLOI_DU_TEMPS",
            Self::Bibliotheque => "BIBLIOTHEQUE",
            Self::Transport => "TRANSPORT",
            Self::Cantine => "CANTINE",
            Self::RessourcesHumaines => "RESSOURCES_HUMAINES",
            Self::Discipline => "DISCIPLINE",
            Self::Infirmerie => "INFIRMERIE",
            Self::Inscriptions => "INSCRIPTIONS",
            Self::Pedagogie => "PEDAGOGIE",
            Self::PortailParents => "PORTAIL_PARENTS",
            Self::Evenements => "EVENEMENTS",
            Self::Inventaire => "INVENTAIRE",
            Self::Rapports => "RAPPORTS",
            Self::Parametres => "PARAMETRES",
            Self::Orientation => "ORIENTATION",
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseModuleError(pub String);

impl std::error::Error for ParseModuleError {}

impl fmt::Display for ParseModuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown module: {}", self.0)
    }
}

impl FromStr for ModuleType {
    type Err = ParseModuleError;

    /// Accepts `FINANCES`, `finances` and `emploi-du-temps` style spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| ParseModuleError(s.to_string()))
    }
}

// Stored as TEXT so new modules do not need a migration of an enum type.
impl Type<sqlx::Postgres> for ModuleType {
    fn type_info() -> PgTypeInfo {
        <String as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'q> Encode<'q, sqlx::Postgres> for ModuleType {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for ModuleType {
    fn decode(
        value: <sqlx::Postgres as Database>::ValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<'r, sqlx::Postgres>>::decode(value)?;
        Ok(s.parse()?)
    }
}

impl PgHasArrayType for ModuleType {
    fn array_type_info() -> PgTypeInfo {
        <String as PgHasArrayType>::array_type_info()
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    #[default]
    Active,
    Inactive,
    Maintenance,
}

impl ModuleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleStatus {
    type Err = ParseModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "maintenance" => Ok(Self::Maintenance),
            _ => Err(ParseModuleError(s.to_string())),
        }
    }
}

impl Type<sqlx::Postgres> for ModuleStatus {
    fn type_info() -> PgTypeInfo {
        <String as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'q> Encode<'q, sqlx::Postgres> for ModuleStatus {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for ModuleStatus {
    fn decode(
        value: <sqlx::Postgres as Database>::ValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<'r, sqlx::Postgres>>::decode(value)?;
        Ok(s.parse()?)
    }
}

/// A module row for one (tenant, school level, module type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Module {
    pub id: ModuleId,
    pub tenant_id: TenantId,
    pub school_level_id: SchoolLevelId,
    pub module_type: ModuleType,
    pub enabled: bool,
    pub status: ModuleStatus,
    /// Modules that must be enabled for this one to serve requests, in declaration order.
    pub dependencies: Vec<ModuleType>,
    pub required_permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Module {
    /// Enabled AND active. Maintenance or inactive modules refuse traffic.
    pub fn is_operational(&self) -> bool {
        self.enabled && self.status == ModuleStatus::Active
    }
}

/// Insert payload for a module row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewModule {
    pub tenant_id: TenantId,
    pub school_level_id: SchoolLevelId,
    pub module_type: ModuleType,
    pub enabled: bool,
    pub dependencies: Vec<ModuleType>,
    pub required_permissions: Vec<String>,
}

impl NewModule {
    pub fn into_module(self, now: DateTime<Utc>) -> Module {
        Module {
            id: ModuleId::new(),
            tenant_id: self.tenant_id,
            school_level_id: self.school_level_id,
            module_type: self.module_type,
            enabled: self.enabled,
            status: ModuleStatus::Active,
            dependencies: self.dependencies,
            required_permissions: self.required_permissions,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateModuleStatusDto {
    pub status: ModuleStatus,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DependencyStatus {
    pub module_type: ModuleType,
    pub satisfied: bool,
    pub missing: Vec<ModuleType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AccessMatrixEntry {
    pub source: ModuleType,
    pub target: ModuleType,
    pub level: AccessLevel,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContextResponse {
    pub context: RequestContext,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub super_admin: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_module_type_has_twenty_distinct_names() {
        let names: BTreeSet<_> = ModuleType::ALL.iter().map(|m| m.as_str()).collect();
        assert_eq!(names.len(), 20);
    }

    #[test]
    fn test_module_type_parse_spellings() {
        assert_eq!("FINANCES".parse::<ModuleType>(), Ok(ModuleType::Finances));
        assert_eq!("finances".parse::<ModuleType>(), Ok(ModuleType::Finances));
        assert_eq!(
            "emploi-du-temps".parse::<ModuleType>(),
            Ok(ModuleType::EmploiDuTemps)
        );
        assert!("GYM".parse::<ModuleType>().is_err());
    }

    #[test]
    fn test_module_type_serde_matches_as_str() {
        for module in ModuleType::ALL {
            let json = serde_json::to_string(&module).unwrap();
            assert_eq!(json, format!("\"{}\"", module.as_str()));
        }
    }

    #[test]
    fn test_module_status_parse() {
        assert_eq!("Maintenance".parse::<ModuleStatus>(), Ok(ModuleStatus::Maintenance));
        assert!("paused".parse::<ModuleStatus>().is_err());
    }

    #[test]
    fn test_is_operational_requires_enabled_and_active() {
        let mut module = NewModule {
            tenant_id: TenantId::new(),
            school_level_id: SchoolLevelId::new(),
            module_type: ModuleType::Finances,
            enabled: true,
            dependencies: vec![ModuleType::Scolarite],
            required_permissions: vec![],
        }
        .into_module(Utc::now());
        assert!(module.is_operational());

        module.status = ModuleStatus::Maintenance;
        assert!(!module.is_operational());

        module.status = ModuleStatus::Active;
        module.enabled = false;
        assert!(!module.is_operational());
    }

    #[test]
    fn test_update_status_dto_validation() {
        let dto = UpdateModuleStatusDto {
            status: ModuleStatus::Maintenance,
            reason: Some("x".repeat(501)),
        };
        assert!(dto.validate().is_err());

        let dto = UpdateModuleStatusDto {
            status: ModuleStatus::Maintenance,
            reason: Some("exam week".to_string()),
        };
        assert!(dto.validate().is_ok());
    }
}
