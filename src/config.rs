//! Persisted bridge and application records.

use std::ffi::OsString;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A bridge seen during discovery.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BridgeRecord {
    /// Stable bridge identifier (SSDP UUID or vendor-assigned id)
    pub id: String,
    /// Base URI of the bridge's control API
    pub uri: String,
}

impl BridgeRecord {
    pub fn new(id: &str, uri: &str) -> Self {
        BridgeRecord {
            id: id.to_string(),
            uri: uri.to_string(),
        }
    }
}

/// An application identity registered with a bridge.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub bridge_id: String,
    /// Credential returned by the bridge on registration
    pub application_id: String,
}

impl ApplicationRecord {
    pub fn new(bridge_id: &str, application_id: &str) -> Self {
        ApplicationRecord {
            bridge_id: bridge_id.to_string(),
            application_id: application_id.to_string(),
        }
    }
}

/// File-backed store for [`BridgeRecord`]s and the default [`ApplicationRecord`].
///
/// Layout under the config directory:
///
/// ```text
/// bridges/<id>.json
/// application.json
/// ```
///
/// Writes go to a temp file that is renamed over the target, so concurrent
/// writers of the same record leave one complete version behind.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    /// Environment variable overriding the config directory.
    pub const DIR_ENV: &'static str = "HUE_CONFIG_DIR";
    const SYSTEM_DIR: &'static str = "/etc/hue-lib";
    const USER_DIR: &'static str = ".hue-lib";
    const BRIDGES_DIR: &'static str = "bridges";
    const APPLICATION_FILE: &'static str = "application.json";

    /// Use an explicit directory. Nothing is created until the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ConfigStore { dir: dir.into() }
    }

    /// Open the installation's config directory.
    ///
    /// Honors `HUE_CONFIG_DIR`, otherwise tries the system-wide directory and
    /// falls back to `~/.hue-lib` when that is not writable.
    pub fn open() -> Result<Self> {
        Self::open_from(std::env::var_os(Self::DIR_ENV))
    }

    /// Like [`ConfigStore::open`], with the value of `HUE_CONFIG_DIR` passed in.
    pub fn open_from(dir_override: Option<OsString>) -> Result<Self> {
        match dir_override {
            Some(dir) => Ok(Self::new(dir)),
            None => Self::first_writable(Path::new(Self::SYSTEM_DIR), dirs::home_dir()),
        }
    }

    /// `system` when it can be written to, else `<home>/.hue-lib`.
    fn first_writable(system: &Path, home: Option<PathBuf>) -> Result<Self> {
        match check_writable(system) {
            Ok(()) => return Ok(Self::new(system)),
            Err(e) if is_denied(&e) => {
                debug!("{} not writable, using per-user config", system.display());
            }
            Err(e) => return Err(Error::storage("create_dir", system, e)),
        }

        let home = home.ok_or_else(|| {
            Error::storage(
                "locate home",
                Path::new("~"),
                std::io::Error::new(ErrorKind::NotFound, "home directory unknown"),
            )
        })?;
        let user = home.join(Self::USER_DIR);
        fs::create_dir_all(&user).map_err(|e| Error::storage("create_dir", &user, e))?;
        Ok(Self::new(user))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Look up a cached bridge. A missing record is `Ok(None)`.
    pub fn find_bridge(&self, id: &str) -> Result<Option<BridgeRecord>> {
        let record: Option<BridgeRecord> = read_json(&self.bridge_path(id))?;
        // Distinct ids can share a file name once sanitized.
        Ok(record.filter(|record| record.id == id))
    }

    /// Insert or replace the record for `record.id`.
    pub fn write_bridge(&self, record: &BridgeRecord) -> Result<()> {
        write_json(&self.bridge_path(&record.id), record)
    }

    /// All cached bridges, ordered by id.
    pub fn bridges(&self) -> Result<Vec<BridgeRecord>> {
        let dir = self.dir.join(Self::BRIDGES_DIR);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::storage("read_dir", &dir, e)),
        };

        let mut records = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| Error::storage("read_dir", &dir, e))?.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && let Some(record) = read_json::<BridgeRecord>(&path)?
            {
                records.push(record);
            }
        }
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    /// The default application, if one has been registered.
    pub fn find_default_application(&self) -> Result<Option<ApplicationRecord>> {
        read_json(&self.application_path())
    }

    /// The default application, failing with [`Error::NotConfigured`] when absent.
    pub fn default_application(&self) -> Result<ApplicationRecord> {
        self.find_default_application()?.ok_or(Error::NotConfigured)
    }

    /// Persist `record` as the default application, replacing any previous one.
    pub fn write_application(&self, record: &ApplicationRecord) -> Result<()> {
        write_json(&self.application_path(), record)
    }

    /// Forget the default application. Succeeds when there is none.
    pub fn delete_default_application(&self) -> Result<()> {
        let path = self.application_path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage("remove", &path, e)),
        }
    }

    fn bridge_path(&self, id: &str) -> PathBuf {
        self.dir
            .join(Self::BRIDGES_DIR)
            .join(format!("{}.json", file_stem(id)))
    }

    fn application_path(&self) -> PathBuf {
        self.dir.join(Self::APPLICATION_FILE)
    }
}

/// An existing directory still has to accept new files.
fn check_writable(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    let marker = dir.join(temp_name(".write-check"));
    fs::File::create(&marker)?;
    fs::remove_file(&marker)
}

fn is_denied(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::PermissionDenied | ErrorKind::ReadOnlyFilesystem)
}

fn temp_name(prefix: &str) -> String {
    format!(
        "{}.{}.{}.tmp",
        prefix,
        process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    )
}

/// Map an id onto a file name that cannot leave its directory.
fn file_stem(id: &str) -> String {
    let stem: String = id
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect();
    if stem.is_empty() { "_".to_string() } else { stem }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::storage("read", path, e)),
    };
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(Error::JsonLoad)
}

fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::storage("create_dir", parent, e))?;
    }

    let serialized = serde_json::to_string_pretty(data).map_err(Error::JsonDump)?;
    let temp_path = path.with_extension(temp_name("json"));

    let written = fs::File::create(&temp_path).and_then(|mut file| {
        file.write_all(serialized.as_bytes())?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::storage("write", &temp_path, e));
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::storage("rename", path, e)
    })
}
