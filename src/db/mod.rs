//! Data access, one submodule per table:
//! - `models`: row types (`Snippet`, `User`)
//! - `snippets`: snippet reads and writes
//! - `users`: account creation and credential checks
//!
//! The rest of the application treats this module as an opaque repository:
//! handlers call these functions and never touch SQL.

pub mod models;
pub mod snippets;
pub mod users;
