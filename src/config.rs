//! Optional YAML settings shared by all subcommands.
//!
//! Precedence is command-line flag, then settings file, then the defaults
//! below.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::parse_delimiter;

pub const DEFAULT_OUTPUT_DIR: &str = "outputs";
pub const DEFAULT_STATE_FILE: &str = "last_result.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory for timestamped result files.
    pub output_dir: Option<PathBuf>,
    /// Snapshot of the last ranking, read by `export`.
    pub state_file: Option<PathBuf>,
    /// Input delimiter such as `,`, `;` or `tab`.
    pub delimiter: Option<String>,
    pub input_encoding: Option<String>,
    /// Worksheet to read from XLSX input.
    pub sheet: Option<String>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening settings file {path:?}"))?;
        let settings: Settings = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing settings YAML {path:?}"))?;
        if let Some(value) = settings.delimiter.as_deref() {
            parse_delimiter(value)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("Invalid delimiter in {path:?}"))?;
        }
        Ok(settings)
    }

    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn output_dir(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }

    /// Snapshot location; defaults to a file inside the resolved output directory.
    pub fn state_file(&self, flag: Option<&Path>, output_dir: &Path) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.state_file.clone())
            .unwrap_or_else(|| output_dir.join(DEFAULT_STATE_FILE))
    }

    pub fn delimiter(&self, flag: Option<u8>) -> Option<u8> {
        flag.or_else(|| {
            self.delimiter
                .as_deref()
                .and_then(|value| parse_delimiter(value).ok())
        })
    }

    pub fn input_encoding<'a>(&'a self, flag: Option<&'a str>) -> Option<&'a str> {
        flag.or(self.input_encoding.as_deref())
    }

    pub fn sheet<'a>(&'a self, flag: Option<&'a str>) -> Option<&'a str> {
        flag.or(self.sheet.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_settings_and_defaults() {
        let settings = Settings {
            output_dir: Some(PathBuf::from("from-config")),
            delimiter: Some("semicolon".into()),
            ..Settings::default()
        };
        assert_eq!(settings.output_dir(None), PathBuf::from("from-config"));
        assert_eq!(
            settings.output_dir(Some(Path::new("flag"))),
            PathBuf::from("flag")
        );
        assert_eq!(settings.delimiter(None), Some(b';'));
        assert_eq!(settings.delimiter(Some(b'\t')), Some(b'\t'));
        assert_eq!(
            Settings::default().output_dir(None),
            PathBuf::from(DEFAULT_OUTPUT_DIR)
        );
    }

    #[test]
    fn state_file_defaults_into_output_dir() {
        let settings = Settings::default();
        assert_eq!(
            settings.state_file(None, Path::new("out")),
            Path::new("out").join(DEFAULT_STATE_FILE)
        );
    }

    #[test]
    fn yaml_settings_parse() {
        let parsed: Settings =
            serde_yaml::from_str("output_dir: hasil\nsheet: Data\n").expect("parse settings");
        assert_eq!(parsed.output_dir, Some(PathBuf::from("hasil")));
        assert_eq!(parsed.sheet.as_deref(), Some("Data"));
    }
}
