use std::io::ErrorKind;

use anyhow::{Context, Result};
use cap_std::fs::Dir;
use serde::Deserialize;
use time::format_description::{parse, FormatItem};
use toml::from_str;

/// Renders dates like `Dec 20, 2018`.
pub const DEFAULT_DATE_FORMAT: &str = "[month repr:short] [day padding:none], [year]";

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub date_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_owned(),
        }
    }
}

impl Config {
    /// Reads `config.toml` from the data directory, falling back to defaults if it does not exist.
    pub fn read(dir: &Dir) -> Result<Self> {
        let val = match dir.read_to_string("config.toml") {
            Ok(contents) => Self::parse(&contents)?,
            Err(err) if err.kind() == ErrorKind::NotFound => Default::default(),
            Err(err) => return Err(err).context("Failed to read config.toml"),
        };

        Ok(val)
    }

    fn parse(contents: &str) -> Result<Self> {
        let val = from_str::<Self>(contents).context("Failed to parse config.toml")?;

        val.date_format()
            .with_context(|| format!("Invalid date format {:?}", val.date_format))?;

        Ok(val)
    }

    pub fn date_format(&self) -> Result<Vec<FormatItem<'_>>> {
        let val = parse(&self.date_format)?;

        Ok(val)
    }
}
