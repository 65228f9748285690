//! Host platform utility functions

use std::{env, path::PathBuf};

/// Environment variable pointing at the root of the software checkout. Parameter files are found
/// under `<root>/params`, session directories are created under `<root>/sessions`.
pub const SW_ROOT_ENV_VAR: &str = "ROVER_SW_ROOT";

/// Get the root directory of the software from the `ROVER_SW_ROOT` environment variable.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
