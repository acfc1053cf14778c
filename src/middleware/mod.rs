//! Request layers and extractors.
//!
//! - [`auth`]: bearer token verification, [`auth::Caller`] and [`auth::Scope`]
//!   extractors
//! - [`audit`]: records sensitive operations and their outcome
//! - [`guard`]: context resolution, isolation and authorization
//!
//! The layers are stacked by [`crate::router::with_engine_layers`]. Handlers
//! behind them read the outcome instead of re-checking:
//!
//! ```ignore
//! use crate::middleware::auth::{Caller, Scope};
//!
//! async fn list_fees(caller: Caller, Scope(ctx): Scope) -> impl IntoResponse {
//!     // ctx.tenant_id() and ctx.school_level_id() are validated
//! }
//! ```

pub mod audit;
pub mod auth;
pub mod guard;
