//! # Scolaguard Auth
//!
//! Principal claims and JWT utilities.
//!
//! Token issuance is not part of the engine: [`create_access_token`] exists for
//! the CLI's development tokens and for tests. Requests only ever go through
//! [`verify_token`] and [`Claims::principal`].
//!
//! # Example
//!
//! ```ignore
//! use scolaguard_auth::{create_access_token, verify_token};
//! use scolaguard_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(
//!     user_id,
//!     "teacher@school.test",
//!     Some(tenant_id),
//!     vec!["teacher".to_string()],
//!     false,
//!     &config,
//! )?;
//!
//! let principal = verify_token(&token, &config)?.principal()?;
//! ```

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::{create_access_token, verify_token};
