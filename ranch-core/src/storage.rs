use anyhow::{Context, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::{Barn, Horse, User};
use crate::session::Session;

/// On-disk encoding of a record file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    #[default]
    Yaml,
    Json,
}

impl RecordFormat {
    /// Infers the format from the file extension, defaulting to YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => RecordFormat::Json,
            _ => RecordFormat::Yaml,
        }
    }

    /// File extension used for new files
    pub fn extension(&self) -> &'static str {
        match self {
            RecordFormat::Yaml => "yaml",
            RecordFormat::Json => "json",
        }
    }
}

impl std::fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordFormat::Yaml => write!(f, "YAML"),
            RecordFormat::Json => write!(f, "JSON"),
        }
    }
}

/// Records partitioned by owning user
pub trait Owned {
    fn owner(&self) -> &str;
}

impl Owned for Horse {
    fn owner(&self) -> &str {
        &self.owner
    }
}

impl Owned for Barn {
    fn owner(&self) -> &str {
        &self.owner
    }
}

/// A flat file holding a whole collection of records.
///
/// Reads and writes always cover the entire collection; there is no
/// per-record update.
#[derive(Debug, Clone)]
pub struct RecordFile<T> {
    file_path: PathBuf,
    lock_file_path: PathBuf,
    format: RecordFormat,
    _records: PhantomData<T>,
}

impl<T> RecordFile<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a handle for the file; nothing is touched on disk yet
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        let mut lock_name = file_path.as_os_str().to_os_string();
        lock_name.push(".lock");
        Self {
            format: RecordFormat::from_path(&file_path),
            lock_file_path: PathBuf::from(lock_name),
            file_path,
            _records: PhantomData,
        }
    }

    /// Returns the path to the record file
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn format(&self) -> RecordFormat {
        self.format
    }

    /// Acquire an exclusive lock on the sidecar lock file for writing.
    /// The returned handle must be held for the duration of the write.
    fn acquire_write_lock(&self) -> Result<File> {
        // The data directory may not exist on first save
        if let Some(parent) = self.lock_file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to create lock file: {:?}", self.lock_file_path))?;

        // Poll for the lock, giving up after a few seconds
        let start = std::time::Instant::now();
        let timeout = Duration::from_secs(5);

        loop {
            match lock_file.try_lock_exclusive() {
                Ok(()) => return Ok(lock_file),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > timeout {
                        anyhow::bail!(
                            "Timeout waiting for file lock - another session may be saving: {:?}",
                            self.file_path
                        );
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to acquire lock on {:?}", self.lock_file_path)
                    })
                }
            }
        }
    }

    /// Loads every record in the file. A missing file is an empty collection.
    pub fn load_all(&self) -> Result<Vec<T>> {
        if !self.file_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.file_path)
            .with_context(|| format!("Failed to open file: {:?}", self.file_path))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let records = match self.format {
            RecordFormat::Yaml => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML from {:?}", self.file_path))?,
            RecordFormat::Json => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON from {:?}", self.file_path))?,
        };

        Ok(records)
    }

    /// Replaces the whole file with `records`
    pub fn save_all(&self, records: &[T]) -> Result<()> {
        let _lock = self.lock_for_write()?;
        self.write_records(records)
    }

    /// Takes the write lock and stamps it with this process, for anyone
    /// inspecting a stuck lock file
    fn lock_for_write(&self) -> Result<File> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut lock_file = self.acquire_write_lock()?;
        // Best effort: the lock is held whether or not the stamp is written
        let _ = writeln!(
            lock_file,
            "Locked by PID {} at {}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        );
        Ok(lock_file)
    }

    fn write_records(&self, records: &[T]) -> Result<()> {
        // Serialize in the file's own format
        let content = match self.format {
            RecordFormat::Yaml => serde_yaml::to_string(records)?,
            RecordFormat::Json => serde_json::to_string_pretty(records)?,
        };
        fs::write(&self.file_path, content)
            .with_context(|| format!("Failed to write {:?}", self.file_path))?;
        Ok(())
    }
}

impl<T> RecordFile<T>
where
    T: Serialize + DeserializeOwned + Owned,
{
    /// Loads only the records belonging to `owner`
    pub fn load_owned(&self, owner: &str) -> Result<Vec<T>> {
        let mut records = self.load_all()?;
        records.retain(|r| r.owner() == owner);
        Ok(records)
    }

    /// Replaces `owner`'s records with `records`, passing every other owner's
    /// records through unchanged.
    ///
    /// This is a read-modify-write of the entire file: anything another
    /// session wrote for the same owner since it was loaded is lost.
    pub fn save_owned(&self, owner: &str, records: &[T]) -> Result<()>
    where
        T: Clone,
    {
        let _lock = self.lock_for_write()?;

        // Re-read under the lock so other owners' latest records survive
        let mut all = self.load_all()?;

        // Swap this owner's records for the session's copy
        all.retain(|r| r.owner() != owner);
        all.extend(records.iter().cloned());

        self.write_records(&all)
    }
}

/// The three record files that make up a ranch data directory
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
    users: RecordFile<User>,
    horses: RecordFile<Horse>,
    barns: RecordFile<Barn>,
}

impl Storage {
    /// Opens the data directory using the given format for all three files
    pub fn new<P: AsRef<Path>>(data_dir: P, format: RecordFormat) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        let file = |stem: &str| data_dir.join(format!("{}.{}", stem, format.extension()));
        Self {
            users: RecordFile::new(file("users")),
            horses: RecordFile::new(file("horses")),
            barns: RecordFile::new(file("barns")),
            data_dir,
        }
    }

    /// Returns the data directory
    pub fn path(&self) -> &Path {
        &self.data_dir
    }

    pub fn users(&self) -> &RecordFile<User> {
        &self.users
    }

    pub fn horses(&self) -> &RecordFile<Horse> {
        &self.horses
    }

    pub fn barns(&self) -> &RecordFile<Barn> {
        &self.barns
    }

    /// Loads `owner`'s horses and barns into a new session
    pub fn open_session(&self, owner: &str) -> Result<Session> {
        let horses = self.horses.load_owned(owner)?;
        let barns = self.barns.load_owned(owner)?;
        log::info!(
            "loaded {} horses and {} barns for '{}' from {:?}",
            horses.len(),
            barns.len(),
            owner,
            self.data_dir
        );
        Ok(Session::new(owner, horses, barns))
    }

    /// Writes the session's records back, merging with other users' records
    pub fn save_session(&self, session: &Session) -> Result<()> {
        self.horses
            .save_owned(session.owner(), session.horses().all())
            .context("Failed to save horses")?;
        self.barns
            .save_owned(session.owner(), session.barns().all())
            .context("Failed to save barns")?;
        log::info!("saved data for '{}'", session.owner());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn horse(name: &str, owner: &str) -> Horse {
        Horse::new(
            name.into(),
            NaiveDate::from_ymd_opt(2012, 2, 29).unwrap(),
            "Shire".into(),
            owner.into(),
        )
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let file: RecordFile<Horse> = RecordFile::new(temp_dir.path().join("horses.yaml"));

        assert!(file.load_all().unwrap().is_empty());
        assert!(file.load_owned("alice").unwrap().is_empty());
        assert!(!file.path().exists());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(RecordFormat::from_path(Path::new("a/horses.json")), RecordFormat::Json);
        assert_eq!(RecordFormat::from_path(Path::new("a/horses.yml")), RecordFormat::Yaml);
        assert_eq!(RecordFormat::from_path(Path::new("a/horses")), RecordFormat::Yaml);
    }

    #[test]
    fn test_save_owned_passes_other_owners_through() {
        let temp_dir = TempDir::new().unwrap();
        let file: RecordFile<Horse> = RecordFile::new(temp_dir.path().join("horses.json"));

        file.save_all(&[horse("A1", "alice"), horse("B1", "bob"), horse("A2", "alice")])
            .unwrap();

        let alice = file.load_owned("alice").unwrap();
        assert_eq!(alice.len(), 2);

        file.save_owned("alice", &[horse("A3", "alice")]).unwrap();

        let all = file.load_all().unwrap();
        let names: Vec<_> = all.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["B1", "A3"]);
        assert_eq!(file.load_owned("bob").unwrap()[0].name, "B1");
    }

    #[test]
    fn test_concurrent_sessions_last_writer_wins() {
        let temp_dir = TempDir::new().unwrap();
        let file: RecordFile<Horse> = RecordFile::new(temp_dir.path().join("horses.yaml"));
        file.save_all(&[horse("Base", "alice")]).unwrap();

        let mut first = file.load_owned("alice").unwrap();
        let mut second = file.load_owned("alice").unwrap();
        first.push(horse("FromFirst", "alice"));
        second.push(horse("FromSecond", "alice"));

        file.save_owned("alice", &first).unwrap();
        file.save_owned("alice", &second).unwrap();

        let names: Vec<_> = file
            .load_owned("alice")
            .unwrap()
            .into_iter()
            .map(|h| h.name)
            .collect();
        assert_eq!(names, vec!["Base", "FromSecond"]);
    }

    #[test]
    fn test_session_round_trip_keeps_links() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::new(temp_dir.path().join("data"), RecordFormat::Yaml);

        let mut session = storage.open_session("alice").unwrap();
        session.add_barn("North", 2).unwrap();
        let bolt = session.add_horse(horse("Bolt", "alice")).unwrap();
        session.assign_horse(&bolt, "North").unwrap();
        storage.save_session(&session).unwrap();

        let mut other = storage.open_session("bob").unwrap();
        other.add_barn("North", 5).unwrap();
        storage.save_session(&other).unwrap();

        let reopened = storage.open_session("alice").unwrap();
        assert_eq!(reopened.barns().len(), 1);
        assert_eq!(reopened.barns().find("north").unwrap().stalls, 2);
        let bolt = reopened.horses().get(&bolt).unwrap();
        assert_eq!(bolt.placement(), "North (Stall 1)");
        assert!(reopened.check_consistency().is_empty());

        assert!(storage.path().join("horses.yaml").exists());
        assert!(storage.path().join("barns.yaml").exists());
        assert!(!storage.path().join("users.yaml").exists());
    }

    #[test]
    fn test_empty_yaml_file_loads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("barns.yaml");
        fs::write(&path, "").unwrap();

        let file: RecordFile<Barn> = RecordFile::new(&path);
        assert!(file.load_all().unwrap().is_empty());
    }
}
