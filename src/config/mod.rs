//! Layered configuration: built-in defaults, a TOML file, and environment
//! overrides, merged into typed machine records.
//!
//! The file carries a `[global]` table plus one `[machine.<name>]` table
//! per logical machine. Environment variables named
//! `ROUTEFORGE_<section>_<key>` (exactly three underscore-delimited parts)
//! override or create section entries; names that do not match the pattern
//! are ignored, never errors. Precedence is built-in defaults, then the
//! file, then the environment.

use std::collections::BTreeMap;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use thiserror::Error;

use crate::registry::{MachineRecord, MachineRegistry, RegistryError, Role};

mod util;

pub use util::expand_tilde;

/// Environment prefix recognised by the override scanner.
pub const ENV_PREFIX: &str = "routeforge";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 22;
const DEFAULT_USER: &str = "edge";
const DEFAULT_ROLE: &str = "router";
const DEFAULT_REPO: &str = "$HOME/edgeroute/edgeroute-build";
const DEFAULT_EMAIL: &str = "no-one@example.net";
const DEFAULT_WORKING_DIR: &str = "~/edgeroute";
const DEFAULT_STORE: &str = "/tmp";

const USER_CONFIG: &str = "~/.config/routeforge/config.toml";
const SYSTEM_CONFIG: &str = "/etc/routeforge/config.toml";

/// Merged settings from the `[global]` section.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GlobalSettings {
    /// Contact written into build metadata.
    pub email: String,
    /// Directory where package repositories are checked out locally.
    pub working_dir: Utf8PathBuf,
    /// Scratch directory for downloaded artifacts.
    pub store: Utf8PathBuf,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            email: DEFAULT_EMAIL.to_owned(),
            working_dir: Utf8PathBuf::from(expand_tilde(DEFAULT_WORKING_DIR)),
            store: Utf8PathBuf::from(DEFAULT_STORE),
        }
    }
}

/// Errors raised while loading and merging configuration sources.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Raised when the configuration file cannot be read.
    #[error("could not read configuration file {path}: {message}")]
    Read {
        /// Path that failed to read.
        path: Utf8PathBuf,
        /// Operating system error string.
        message: String,
    },
    /// Raised when the configuration file fails to parse, including unknown
    /// keys, which are rejected early rather than ignored.
    #[error("could not parse configuration: {0}")]
    Parse(String),
    /// Raised when a port value cannot be parsed as a TCP port.
    #[error("invalid port \"{value}\" for section \"{section}\"")]
    InvalidPort {
        /// Section carrying the bad value.
        section: String,
        /// Value as supplied.
        value: String,
    },
    /// Raised when registry construction rejects the merged records.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    global: GlobalSection,
    #[serde(default)]
    machine: BTreeMap<String, MachineSection>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct GlobalSection {
    email: Option<String>,
    working_dir: Option<String>,
    store: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct MachineSection {
    role: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    user: Option<String>,
    file: Option<String>,
    repo: Option<String>,
    default: Option<bool>,
}

/// Loads the registry from the discovered (or overridden) configuration
/// file and the current process environment.
///
/// Without an override, the file is searched at `~/.config/routeforge/`
/// then `/etc/routeforge/`; a missing file yields an empty machine map. An
/// explicit override path must exist.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file cannot be read or parsed, a value
/// fails conversion, or two machines claim the same role default.
pub fn load(path_override: Option<&Utf8Path>) -> Result<MachineRegistry, ConfigError> {
    let text = match config_path(path_override) {
        Some(path) => fs::read_to_string(&path).map_err(|err| ConfigError::Read {
            path,
            message: err.to_string(),
        })?,
        None => String::new(),
    };
    let env: Vec<(String, String)> = std::env::vars().collect();
    build_registry(&text, &env)
}

/// Builds a registry from raw file text and an explicit environment
/// snapshot. Split out from [`load`] so the merge stays testable without
/// touching the process environment.
///
/// # Errors
///
/// Returns [`ConfigError`] under the same conditions as [`load`].
pub fn build_registry(
    file_text: &str,
    env: &[(String, String)],
) -> Result<MachineRegistry, ConfigError> {
    let mut file: ConfigFile =
        toml::from_str(file_text).map_err(|err| ConfigError::Parse(err.to_string()))?;
    for (name, value) in env {
        apply_env_override(&mut file, name, value)?;
    }
    let (global, records) = merge_sections(file);
    Ok(MachineRegistry::new(global, records)?)
}

fn config_path(path_override: Option<&Utf8Path>) -> Option<Utf8PathBuf> {
    if let Some(path) = path_override {
        return Some(path.to_path_buf());
    }
    [expand_tilde(USER_CONFIG), SYSTEM_CONFIG.to_owned()]
        .into_iter()
        .map(Utf8PathBuf::from)
        .find(|candidate| candidate.as_std_path().exists())
}

/// Applies one environment variable to the parsed file sections.
///
/// Only names of the exact shape `ROUTEFORGE_<section>_<key>` with a known
/// key and a non-empty value take effect; everything else is skipped so
/// unrelated `ROUTEFORGE_*` variables (such as the config-path override)
/// cannot leak into machine sections.
fn apply_env_override(
    file: &mut ConfigFile,
    name: &str,
    value: &str,
) -> Result<(), ConfigError> {
    let lowered = name.to_lowercase();
    let parts: Vec<&str> = lowered.split('_').collect();
    let [prefix, section, key] = parts.as_slice() else {
        return Ok(());
    };
    if *prefix != ENV_PREFIX || value.is_empty() {
        return Ok(());
    }

    if *section == "global" {
        match *key {
            "email" => file.global.email = Some(value.to_owned()),
            "store" => file.global.store = Some(value.to_owned()),
            _ => {}
        }
        return Ok(());
    }

    let entry = file.machine.entry((*section).to_owned()).or_default();
    match *key {
        "role" => entry.role = Some(value.to_owned()),
        "host" => entry.host = Some(value.to_owned()),
        "user" => entry.user = Some(value.to_owned()),
        "file" => entry.file = Some(value.to_owned()),
        "repo" => entry.repo = Some(value.to_owned()),
        "port" => {
            entry.port = Some(value.parse().map_err(|_| ConfigError::InvalidPort {
                section: (*section).to_owned(),
                value: value.to_owned(),
            })?);
        }
        "default" => entry.default = Some(parse_bool(value)),
        _ => {}
    }
    Ok(())
}

/// Permissive boolean used for the role-default flag.
#[must_use]
fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "true" | "1" | "yes" | "enable" | "enabled"
    )
}

fn merge_sections(file: ConfigFile) -> (GlobalSettings, Vec<MachineRecord>) {
    let base = GlobalSettings::default();
    let global = GlobalSettings {
        email: file.global.email.unwrap_or(base.email),
        working_dir: file
            .global
            .working_dir
            .map_or(base.working_dir, |dir| {
                Utf8PathBuf::from(expand_tilde(&dir))
            }),
        store: file
            .global
            .store
            .map_or(base.store, |dir| Utf8PathBuf::from(expand_tilde(&dir))),
    };

    let records = file
        .machine
        .into_iter()
        .map(|(name, section)| MachineRecord {
            host: section
                .host
                .map_or_else(|| DEFAULT_HOST.to_owned(), |host| host.to_lowercase()),
            port: section.port.unwrap_or(DEFAULT_PORT),
            user: section
                .user
                .unwrap_or_else(|| DEFAULT_USER.to_owned()),
            identity_file: section
                .file
                .filter(|file_path| !file_path.is_empty())
                .map(|file_path| Utf8PathBuf::from(expand_tilde(&file_path))),
            repo: section
                .repo
                .map_or_else(|| Utf8PathBuf::from(DEFAULT_REPO), Utf8PathBuf::from),
            role: Role::parse(section.role.as_deref().unwrap_or(DEFAULT_ROLE)),
            is_default: section.default.unwrap_or(false),
            name,
        })
        .collect();

    (global, records)
}
