//! Host platform utility functions

use std::{env, path::PathBuf};

/// Environment variable pointing at the software root directory.
pub const SW_ROOT_ENV_VAR: &str = "NAV_SW_ROOT";

/// Get the software root directory.
///
/// This is the directory containing the `params` and `sessions` directories. If `NAV_SW_ROOT` is
/// not set the current working directory is used instead.
pub fn get_sw_root() -> std::io::Result<PathBuf> {
    match env::var_os(SW_ROOT_ENV_VAR) {
        Some(root) => Ok(PathBuf::from(root)),
        None => env::current_dir()
    }
}
