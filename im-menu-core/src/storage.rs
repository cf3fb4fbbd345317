use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::document::{IncomingDocument, MenuDocument};
use crate::registry::{load_service_definitions, FunctionRegistry, WeblinkRegistry};
use crate::session::EditingSession;

const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Reads and writes one menu document on disk with advisory file locking,
/// so concurrent editors do not interleave partial writes
pub struct DocumentStorage {
    file_path: PathBuf,
    lock_file_path: PathBuf,
}

impl DocumentStorage {
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        let lock_file_path = file_path.with_extension("json.lock");
        Self {
            file_path,
            lock_file_path,
        }
    }

    /// Returns the path to the document file
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Acquire an exclusive lock for writing.
    /// The returned handle must be held during the operation.
    fn acquire_write_lock(&self) -> Result<File> {
        if let Some(parent) = self.lock_file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to create lock file: {:?}", self.lock_file_path))?;

        self.wait_for_lock(&lock_file, |f| FileExt::try_lock_exclusive(f))?;
        Ok(lock_file)
    }

    /// Acquire a shared lock for reading, if anyone ever locked the file
    fn acquire_read_lock(&self) -> Result<Option<File>> {
        if !self.lock_file_path.exists() {
            return Ok(None);
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to open lock file: {:?}", self.lock_file_path))?;

        self.wait_for_lock(&lock_file, |f| FileExt::try_lock_shared(f))?;
        Ok(Some(lock_file))
    }

    fn wait_for_lock(
        &self,
        lock_file: &File,
        try_lock: impl Fn(&File) -> std::io::Result<()>,
    ) -> Result<()> {
        let start = Instant::now();
        loop {
            match try_lock(lock_file) {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > LOCK_TIMEOUT {
                        anyhow::bail!(
                            "Timeout waiting for file lock - another editor may be saving: {:?}",
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

    /// Reads the document. A missing or blank file gives `None`.
    pub fn load(&self) -> Result<Option<IncomingDocument>> {
        if !self.file_path.exists() {
            return Ok(None);
        }

        let _lock = self.acquire_read_lock()?;
        let content = fs::read_to_string(&self.file_path)
            .with_context(|| format!("Failed to read file: {:?}", self.file_path))?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let document = IncomingDocument::from_json(&content)
            .with_context(|| format!("Failed to parse JSON from {:?}", self.file_path))?;
        Ok(Some(document))
    }

    /// Writes the document as pretty-printed JSON
    pub fn save(&self, document: &MenuDocument) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut lock_file = self.acquire_write_lock()?;
        let _ = writeln!(
            lock_file,
            "Locked by PID {} at {}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        );

        let mut json = serde_json::to_string_pretty(document)?;
        json.push('\n');
        fs::write(&self.file_path, json)
            .with_context(|| format!("Failed to write file: {:?}", self.file_path))?;

        tracing::info!(path = ?self.file_path, "saved menu document");
        Ok(())
    }
}

/// A candidate file that exists but could not be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of walking the candidate documents in order
#[derive(Debug, Default)]
pub struct CandidateScan {
    pub found: Option<(PathBuf, IncomingDocument)>,
    /// Unreadable candidates passed over before `found`
    pub skipped: Vec<SkippedDocument>,
}

/// Returns the first candidate holding a readable document.
///
/// Missing and blank files are skipped quietly; unreadable ones are
/// skipped with a warning and reported in [`CandidateScan::skipped`].
pub fn load_first_candidate(candidates: &[PathBuf]) -> CandidateScan {
    let mut scan = CandidateScan::default();
    for path in candidates {
        match DocumentStorage::new(path).load() {
            Ok(Some(document)) => {
                tracing::info!(?path, "loaded menu document");
                scan.found = Some((path.clone(), document));
                break;
            }
            Ok(None) => tracing::debug!(?path, "no menu document"),
            Err(error) => {
                tracing::warn!(?path, error = ?error, "skipping menu document");
                scan.skipped.push(SkippedDocument {
                    path: path.clone(),
                    error: format!("{:#}", error),
                });
            }
        }
    }
    scan
}

/// A session together with the file it was loaded from
pub struct LoadedSession {
    pub session: EditingSession,
    /// `None` when the built-in structure was used
    pub source: Option<PathBuf>,
    pub skipped: Vec<SkippedDocument>,
}

impl LoadedSession {
    /// Fails when the override exists but could not be read, since saving
    /// would replace the user's edits with whatever was loaded instead
    pub fn ensure_override_writable(&self, settings: &Settings) -> Result<()> {
        let override_path = settings.override_path();
        if let Some(skipped) = self.skipped.iter().find(|s| s.path == override_path) {
            anyhow::bail!(
                "Refusing to overwrite {:?}: it could not be read ({}). Fix or move the file first.",
                skipped.path,
                skipped.error
            );
        }
        Ok(())
    }
}

/// Builds an editing session from the files named in the settings
pub fn open_session(settings: &Settings) -> Result<LoadedSession> {
    let weblinks = WeblinkRegistry::load(settings.weblinks_path())?;

    let mut functions = FunctionRegistry::new();
    if let Some(path) = settings.services_path().filter(|p| p.exists()) {
        let services = load_service_definitions(&path)?;
        functions.sync_service_functions(&services);
    }

    let mut session = EditingSession::new(functions, weblinks);
    let CandidateScan { found, skipped } = load_first_candidate(&settings.document_candidates());
    let source = match found {
        Some((path, document)) => {
            session.load_document(&document);
            Some(path)
        }
        None => {
            tracing::info!("no menu document found, using the built-in structure");
            None
        }
    };

    Ok(LoadedSession {
        session,
        source,
        skipped,
    })
}

/// Saves the session to the override document and returns its path
pub fn save_session(settings: &Settings, session: &EditingSession) -> Result<PathBuf> {
    let path = settings.override_path();
    DocumentStorage::new(&path).save(&session.to_document())?;
    Ok(path)
}

/// Writes the session to an arbitrary path, refusing an empty root menu
pub fn export_session<P: AsRef<Path>>(session: &EditingSession, path: P) -> Result<()> {
    session.ensure_exportable()?;
    DocumentStorage::new(path).save(&session.to_document())
}
