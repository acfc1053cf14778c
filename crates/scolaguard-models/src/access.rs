//! Access levels granted by one module to another.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Ordered from least to most permissive.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLevel {
    #[default]
    None,
    Read,
    ReadWrite,
}

impl AccessLevel {
    pub fn allows_read(&self) -> bool {
        *self >= Self::Read
    }

    pub fn allows_write(&self) -> bool {
        *self == Self::ReadWrite
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_level_ordering() {
        assert!(AccessLevel::None < AccessLevel::Read);
        assert!(AccessLevel::Read < AccessLevel::ReadWrite);
    }

    #[test]
    fn test_access_level_grants() {
        assert!(!AccessLevel::None.allows_read());
        assert!(AccessLevel::Read.allows_read());
        assert!(!AccessLevel::Read.allows_write());
        assert!(AccessLevel::ReadWrite.allows_write());
    }
}
