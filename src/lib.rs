pub mod book;
pub mod config;
pub mod contact;
pub mod error;
pub mod index;
pub mod store;

use std::env::var_os;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

pub fn data_path_from_env() -> Result<PathBuf> {
    var_os("DATA_PATH")
        .map(Into::into)
        .ok_or_else(|| anyhow!("Environment variable DATA_PATH not set"))
}
