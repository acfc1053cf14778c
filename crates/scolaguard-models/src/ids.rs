//! Strongly-typed ID newtypes for scope and domain entities.
//!
//! Each id wraps a `Uuid` so a `SchoolLevelId` can never be passed where a
//! `TenantId` is expected, which matters most in the isolation checks.
//!
//! # Example
//!
//! ```ignore
//! use scolaguard_models::ids::{SchoolLevelId, TenantId};
//!
//! fn modules_for(tenant: TenantId, level: SchoolLevelId) { /* ... */ }
//!
//! let tenant = TenantId::new();
//! let level = SchoolLevelId::new();
//! modules_for(tenant, level);    // OK
//! // modules_for(level, tenant); // Compile error
//! ```

use serde::{Deserialize, Serialize};
use sqlx::{
    Database, Decode, Encode, Type,
    postgres::{PgHasArrayType, PgTypeInfo},
};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Generates a `Uuid` newtype with serde, sqlx and OpenAPI support.
///
/// The id serializes as a bare UUID string, binds as a Postgres `uuid`
/// (and `uuid[]`), and parses from text with surrounding whitespace ignored.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
        #[schema(value_type = String, format = "uuid")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID.
            #[inline]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            #[inline]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Build an ID from a u128, for constants and fixtures.
            #[inline]
            pub const fn from_u128(v: u128) -> Self {
                Self(Uuid::from_u128(v))
            }

            /// Unwrap the inner UUID.
            #[inline]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }

            /// Borrow the inner UUID.
            #[inline]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Whether this is the all-zero ID.
            #[inline]
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            #[inline]
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            #[inline]
            fn from(id: $name) -> Uuid {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }

        impl Type<sqlx::Postgres> for $name {
            fn type_info() -> PgTypeInfo {
                <Uuid as Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &PgTypeInfo) -> bool {
                <Uuid as Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'q> Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Postgres as Database>::ArgumentBuffer<'q>,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <Uuid as Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }

        impl<'r> Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: <sqlx::Postgres as Database>::ValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                <Uuid as Decode<'r, sqlx::Postgres>>::decode(value).map(Self)
            }
        }

        impl PgHasArrayType for $name {
            fn array_type_info() -> PgTypeInfo {
                <Uuid as PgHasArrayType>::array_type_info()
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                Uuid::deserialize(deserializer).map(Self)
            }
        }
    };
}

define_id!(
    /// An isolated customer (a school organization).
    TenantId
);

define_id!(
    /// A sub-scope within a tenant, e.g. a primary or secondary campus.
    SchoolLevelId
);

define_id!(
    /// A school year within a tenant.
    AcademicYearId
);

define_id!(
    /// A user account, as carried in the token subject.
    UserId
);

define_id!(
    /// A module row for one (tenant, school level) scope.
    ModuleId
);

define_id!(
    /// An audit log entry.
    AuditLogId
);

impl TenantId {
    /// Sentinel tenant for audit records of unscoped or system actions.
    pub const SYSTEM: TenantId = TenantId::from_u128(0);

    /// Whether this is [`TenantId::SYSTEM`].
    pub fn is_system(&self) -> bool {
        self.is_nil()
    }
}
