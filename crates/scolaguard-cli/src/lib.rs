//! # Scolaguard CLI
//!
//! Administration helpers shared by the `scolaguard-cli` binary: scope
//! parsing and plain-text rendering of modules and the access matrix.
//!
//! ```ignore
//! use scolaguard_cli::output::modules_table;
//!
//! let modules = registry.list(tenant, level).await?;
//! println!("{}", modules_table(&modules));
//! ```

pub mod output;
pub mod scope;
