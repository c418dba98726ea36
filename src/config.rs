//! # Configuration Store
//!
//! API keys and printer records live in one JSON file:
//!
//! ```json
//! {
//!   "api_keys": ["your-api-key-here"],
//!   "printers": [
//!     {"id": "office", "name": "Office", "model": "QL-820NWB",
//!      "connection_type": "network", "address": "192.168.1.50", "port": 9100,
//!      "label_size": "62"}
//!   ]
//! }
//! ```
//!
//! A missing file is created with a placeholder key and no printers.
//! `add_printer` and `remove_printer` write the file back immediately.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::printer::PrinterRecord;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Key written into a freshly created config file.
pub const PLACEHOLDER_API_KEY: &str = "your-api-key-here";

/// On-disk shape of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub api_keys: Vec<String>,
    #[serde(default)]
    pub printers: Vec<PrinterRecord>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            api_keys: vec![PLACEHOLDER_API_KEY.to_string()],
            printers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    data: ConfigFile,
}

impl ConfigStore {
    /// Load the store from `path`, creating a default file if none exists.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            let store = Self {
                path,
                data: ConfigFile::default(),
            };
            store.save()?;
            warn!(
                path = %store.path.display(),
                "config file not found, created default (replace the placeholder API key)"
            );
            return Ok(store);
        }

        let raw = fs::read_to_string(&path)?;
        let data: ConfigFile = serde_json::from_str(&raw)?;
        for printer in &data.printers {
            if printer.id.trim().is_empty() {
                return Err(ConfigError::InvalidPrinter("printer record without id".to_string()));
            }
        }
        info!(
            path = %path.display(),
            printers = data.printers.len(),
            api_keys = data.api_keys.len(),
            "loaded configuration"
        );
        Ok(Self { path, data })
    }

    /// A store backed by `path` with the given contents; nothing is read.
    pub fn with_data(path: impl Into<PathBuf>, data: ConfigFile) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn validate_api_key(&self, key: &str) -> bool {
        !key.is_empty() && self.data.api_keys.iter().any(|k| k == key)
    }

    /// True while the only configured key is the generated placeholder.
    pub fn uses_placeholder_key(&self) -> bool {
        self.data.api_keys.iter().any(|k| k == PLACEHOLDER_API_KEY)
    }

    pub fn api_key_count(&self) -> usize {
        self.data.api_keys.len()
    }

    pub fn printers(&self) -> &[PrinterRecord] {
        &self.data.printers
    }

    /// Look a printer up by id, then by display name.
    pub fn get_printer(&self, key: &str) -> Option<&PrinterRecord> {
        self.data
            .printers
            .iter()
            .find(|p| p.id == key)
            .or_else(|| self.data.printers.iter().find(|p| p.matches(key)))
    }

    /// Add a printer and persist. Rejects records without an id and
    /// records whose id is already taken.
    pub fn add_printer(&mut self, printer: PrinterRecord) -> Result<(), ConfigError> {
        if printer.id.trim().is_empty() {
            return Err(ConfigError::InvalidPrinter("printer id is required".to_string()));
        }
        if self.get_printer(&printer.id).is_some() {
            return Err(ConfigError::InvalidPrinter(format!(
                "printer {} already exists",
                printer.id
            )));
        }
        info!(printer_id = %printer.id, model = %printer.model, "adding printer");
        self.data.printers.push(printer);
        self.save()
    }

    /// Remove every printer matching `key` (id or name) and persist.
    ///
    /// Returns `Ok(false)` when nothing matched.
    pub fn remove_printer(&mut self, key: &str) -> Result<bool, ConfigError> {
        let before = self.data.printers.len();
        self.data.printers.retain(|p| !p.matches(key));
        if self.data.printers.len() == before {
            return Ok(false);
        }
        info!(printer = key, "removed printer");
        self.save()?;
        Ok(true)
    }

    /// Write the store back to its file as indented JSON.
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::ConnectionType;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
        "api_keys": ["secret"],
        "printers": [
            {"id": "office", "name": "Front Desk", "model": "QL-820NWB",
             "connection_type": "network", "address": "192.168.1.50", "port": 9100,
             "label_size": "62"},
            {"id": "shelf", "model": "PT-P710BT", "connection_type": "usb",
             "address": "0x04f9:0x2062"}
        ]
    }"#;

    fn sample_store(dir: &TempDir) -> ConfigStore {
        let path = dir.path().join("config.json");
        fs::write(&path, SAMPLE).unwrap();
        ConfigStore::load(&path).unwrap()
    }

    #[test]
    fn test_missing_file_creates_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = ConfigStore::load(&path).unwrap();

        assert!(path.exists());
        assert!(store.printers().is_empty());
        assert!(store.validate_api_key(PLACEHOLDER_API_KEY));
        assert!(store.uses_placeholder_key());

        let written: ConfigFile = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, ConfigFile::default());
    }

    #[test]
    fn test_api_key_validation() {
        let dir = TempDir::new().unwrap();
        let store = sample_store(&dir);
        assert!(store.validate_api_key("secret"));
        assert!(!store.validate_api_key("nope"));
        assert!(!store.validate_api_key(""));
    }

    #[test]
    fn test_get_printer_by_id_or_name() {
        let dir = TempDir::new().unwrap();
        let store = sample_store(&dir);
        assert_eq!(store.get_printer("office").unwrap().address, "192.168.1.50");
        assert_eq!(store.get_printer("Front Desk").unwrap().id, "office");
        assert!(store.get_printer("garage").is_none());

        let shelf = store.get_printer("shelf").unwrap();
        assert_eq!(shelf.connection_type, ConnectionType::Usb);
        assert_eq!(shelf.label_size, "62");
    }

    #[test]
    fn test_add_and_remove_persist() {
        let dir = TempDir::new().unwrap();
        let mut store = sample_store(&dir);

        store
            .add_printer(PrinterRecord::network("garage", "10.0.0.9", None))
            .unwrap();
        assert!(store.add_printer(PrinterRecord::network("garage", "10.0.0.9", None)).is_err());
        assert!(store.add_printer(PrinterRecord::network("", "10.0.0.9", None)).is_err());

        let reloaded = ConfigStore::load(store.path()).unwrap();
        assert_eq!(reloaded.printers().len(), 3);

        assert!(store.remove_printer("Front Desk").unwrap());
        assert!(!store.remove_printer("Front Desk").unwrap());
        let reloaded = ConfigStore::load(store.path()).unwrap();
        let ids: Vec<&str> = reloaded.printers().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["shelf", "garage"]);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(ConfigStore::load(&path), Err(ConfigError::Parse(_))));
    }
}
