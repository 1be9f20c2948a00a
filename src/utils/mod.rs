//! Small helpers shared across the crate.
//!
//! - [`expand_env_vars`] - `$VAR` / `${VAR}` expansion for configured paths

mod env;

pub use env::expand_env_vars;
