use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::core::session::action::SessionAction;
use crate::core::session::error::{SetupError, StoreError};
use crate::core::session::setup::SetupChoice;
use crate::core::session::state::SessionState;

const SESSION_FILE_NAME: &str = "session.json";

/// Errors raised while reading or writing the persisted session record.
#[derive(Debug)]
pub enum PersistError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Write {
        path: PathBuf,
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Read { path, source } => {
                write!(f, "Failed to read session at {}: {}", path.display(), source)
            }
            PersistError::Parse { path, source } => {
                write!(f, "Failed to parse session at {}: {}", path.display(), source)
            }
            PersistError::Write { path, source } => {
                write!(f, "Failed to write session at {}: {}", path.display(), source)
            }
        }
    }
}

impl StdError for PersistError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            PersistError::Read { source, .. } => Some(source),
            PersistError::Parse { source, .. } => Some(source),
            PersistError::Write { source, .. } => Some(source.as_ref()),
        }
    }
}

/// Session state with write-through persistence.
///
/// Every successful action rewrites the whole record; rejected actions leave
/// both memory and disk untouched. A store without a path keeps state in
/// memory only.
#[derive(Debug)]
pub struct SessionStore {
    state: SessionState,
    path: Option<PathBuf>,
}

impl SessionStore {
    pub fn in_memory(state: SessionState) -> Self {
        Self { state, path: None }
    }

    pub fn open_default() -> Result<Self, PersistError> {
        Self::open(Self::default_path())
    }

    /// Load the record at `path`, starting fresh when it does not exist yet.
    pub fn open(path: PathBuf) -> Result<Self, PersistError> {
        let state = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|source| PersistError::Read {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str(&contents).map_err(|source| PersistError::Parse {
                path: path.clone(),
                source,
            })?
        } else {
            SessionState::default()
        };
        debug!(path = %path.display(), chats = state.chats.len(), "Loaded session");
        Ok(Self {
            state,
            path: Some(path),
        })
    }

    pub fn default_path() -> PathBuf {
        ProjectDirs::from("org", "splitchat", "splitchat")
            .map(|dirs| dirs.data_dir().join(SESSION_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(SESSION_FILE_NAME))
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn dispatch(&mut self, action: SessionAction) -> Result<(), StoreError> {
        self.state.apply(action)?;
        self.persist_logged();
        Ok(())
    }

    pub fn complete_setup(&mut self, choice: SetupChoice) -> Result<(), SetupError> {
        self.state.complete_setup(choice)?;
        self.persist_logged();
        Ok(())
    }

    /// Run an arbitrary transition and persist if it succeeds.
    pub fn update<T, E>(
        &mut self,
        mutator: impl FnOnce(&mut SessionState) -> Result<T, E>,
    ) -> Result<T, E> {
        let value = mutator(&mut self.state)?;
        self.persist_logged();
        Ok(value)
    }

    pub fn save(&self) -> Result<(), PersistError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        write_atomically(path, &self.state).map_err(|source| PersistError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    fn persist_logged(&self) {
        if let Err(err) = self.save() {
            warn!(error = %err, "Session write failed; keeping in-memory state");
        }
    }
}

fn write_atomically(
    path: &Path,
    state: &SessionState,
) -> Result<(), Box<dyn StdError + Send + Sync>> {
    let parent = path.parent().filter(|dir| !dir.as_os_str().is_empty());
    if let Some(dir) = parent {
        fs::create_dir_all(dir)?;
    }

    let contents = serde_json::to_string_pretty(state)?;
    let mut temp_file = match parent {
        Some(dir) => NamedTempFile::new_in(dir)?,
        None => NamedTempFile::new()?,
    };
    temp_file.write_all(contents.as_bytes())?;
    temp_file.as_file_mut().sync_all()?;
    temp_file.persist(path)?;
    Ok(())
}
