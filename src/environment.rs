use std::env;
use std::path::PathBuf;

use crate::checklist::ROOT_URL;

pub const BASE_URL_ENV: &str = "AVIBASE_BASE_URL";
pub const MEMO_DIR_ENV: &str = "AVIBASE_MEMO_DIR";
pub const REGIONS_ENV: &str = "AVIBASE_REGIONS";
pub const SYNONYM_LANGS_ENV: &str = "AVIBASE_SYNONYM_LANGS";

pub const DEFAULT_MEMO_DIR: &str = "memo";

/// Retrieves an environment variable and splits it into a vector of strings based on a delimiter.
///
/// # Arguments
/// - `var`: The name of the environment variable.
/// - `delimiter`: The character to split the environment variable's value by.
///
/// # Returns
/// - `Vec<String>` with empty items removed; empty when the variable is unset.
pub fn get_env_var_as_vec(var: &str, delimiter: char) -> Vec<String> {
    env::var(var)
        .unwrap_or_default()
        .split(delimiter)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Runtime settings read from the environment. CLI flags override these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub memo_dir: PathBuf,
    pub region_codes: Vec<String>,
    pub synonym_languages: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: ROOT_URL.to_string(),
            memo_dir: PathBuf::from(DEFAULT_MEMO_DIR),
            region_codes: Vec::new(),
            synonym_languages: Vec::new(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Settings::default();
        Self {
            base_url: env::var(BASE_URL_ENV).unwrap_or(defaults.base_url),
            memo_dir: env::var(MEMO_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.memo_dir),
            region_codes: get_env_var_as_vec(REGIONS_ENV, ';'),
            synonym_languages: get_env_var_as_vec(SYNONYM_LANGS_ENV, ';'),
        }
    }
}
