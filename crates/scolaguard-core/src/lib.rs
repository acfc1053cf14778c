//! # Scolaguard Core
//!
//! Core types shared by every Scolaguard crate.
//!
//! - [`errors`]: the authorization error taxonomy and the HTTP-mapped [`AppError`]
//! - [`permissions`]: permission string constants used by route declarations and roles
//!
//! # Example
//!
//! ```ignore
//! use scolaguard_core::{AppError, AuthzError, ErrorKind};
//!
//! let err: AppError = AuthzError::PrincipalNotFound.into();
//! assert_eq!(err.kind, Some(ErrorKind::PrincipalNotFound));
//! ```

pub mod errors;
pub mod permissions;

pub use errors::{AppError, AuthzError, ErrorKind, ErrorReport};
