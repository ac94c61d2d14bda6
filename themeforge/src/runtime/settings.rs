//! Preference store: a (scope, name) -> value table persisted as pretty JSON
//! under the config dir. The sync core only ever touches it through
//! `get_setting`/`set_setting` with a typed default; the endpoint both
//! processes agree on is seeded from here at editor startup.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::core::prelude::*;
use crate::protocol::channel::Endpoint;
use crate::runtime::storage;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 53217;

type Table = IndexMap<String, IndexMap<String, serde_json::Value>>;

#[derive(Debug, Default)]
pub struct Settings {
    path: Option<PathBuf>,
    table: Table,
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        storage::config_dir().map(|dir| dir.join("settings.json"))
    }

    /// Loads the table from `path`, or starts empty when the file does not
    /// exist yet. Any other read/parse failure propagates.
    pub fn load_or_default(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let table = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Table::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path: Some(path), table })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Typed lookup with a default for missing or mistyped entries.
    pub fn get_setting<T: DeserializeOwned>(
        &self,
        scope: &str,
        name: &str,
        default: T,
    ) -> T {
        self.table
            .get(scope)
            .and_then(|scoped| scoped.get(name))
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or(default)
    }

    /// Stores a value, returning whether the setting already existed.
    pub fn set_setting<T: Serialize>(
        &mut self,
        scope: &str,
        name: &str,
        value: T,
    ) -> bool {
        let json = match serde_json::to_value(value) {
            Ok(json) => json,
            Err(e) => {
                error!("Refusing to store {}.{}: {}", scope, name, e);
                return false;
            }
        };
        self.table
            .entry(scope.to_string())
            .or_default()
            .insert(name.to_string(), json)
            .is_some()
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.table)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)?;
        Ok(())
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(
            self.get_setting("channel", "host", DEFAULT_HOST.to_string()),
            self.get_setting("channel", "port", DEFAULT_PORT),
        )
    }
}
