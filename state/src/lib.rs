//! The state module persists editor sessions between visits, one JSON
//! document per simulator identifier.

use std::{
    io::Read,
    io::Write,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use eyre::Context;
use serde::{Deserialize, Serialize};

pub const STATE_VERSION: &str = "1";

const UNTITLED_NAME: &str = "Untitled";

/// Saved sessions for one simulator, loaded from and written back to a
/// single file.
///
/// The invariant throughout is that `current` is `None` exactly when
/// `sessions` is empty: the first autosave of modified text creates a
/// session, and deleting the last one falls back to the default program.
pub struct SessionStore {
    save_path: PathBuf,
    state: Persistence,
}

impl SessionStore {
    /// Open the store for `identifier` in the platform data directory.
    pub fn open(identifier: &str, fallback_source: impl Into<String>) -> eyre::Result<Self> {
        let data_dir =
            dirs::data_dir().ok_or_else(|| eyre::eyre!("no platform data directory"))?;
        let dir = data_dir.join("viewsync");
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating state directory {}", dir.display()))?;
        Self::open_at(dir.join(format!("{identifier}.json")), fallback_source)
    }

    /// Open the store at an explicit path, creating the file if needed.
    pub fn open_at(
        path: impl Into<PathBuf>,
        fallback_source: impl Into<String>,
    ) -> eyre::Result<Self> {
        let path = path.into();
        let span = tracing::debug_span!("SessionStore", state_path = %path.display());
        let _guard = span.enter();

        tracing::debug!("attempting to load saved sessions");
        let state = match crate::load_from(&path) {
            Ok(state) => {
                tracing::debug!("sessions loaded");
                state
            }
            Err(e) => {
                tracing::debug!(error = %e, "loading session file");
                Persistence::default()
            }
        };

        let mut store = Self {
            save_path: path,
            state,
        };
        // The fallback is refreshed on every open, so a newer default
        // program replaces the stored copy.
        store.state.fallback_source = fallback_source.into();
        store.persist().wrap_err("saving session file")?;
        Ok(store)
    }

    /// The text the editor should show: the active session's source, or
    /// the fallback when no session is active.
    pub fn current_source(&self) -> &str {
        self.state
            .current
            .and_then(|index| self.state.sessions.get(index))
            .map(|session| session.source.as_str())
            .unwrap_or(&self.state.fallback_source)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.state.current
    }

    /// All sessions, newest first.
    pub fn sessions(&self) -> &[Session] {
        &self.state.sessions
    }

    pub fn state(&self) -> &Persistence {
        &self.state
    }

    /// The autosave body: write `text` through to disk only when it
    /// differs from the last saved copy. The first change with no active
    /// session creates one. Returns whether anything was written.
    pub fn save_if_changed(&mut self, text: &str) -> eyre::Result<bool> {
        if text == self.current_source() {
            return Ok(false);
        }
        self.save_current(text);
        self.persist()?;
        Ok(true)
    }

    /// Put the current text away and start a fresh session from the
    /// fallback source.
    pub fn new_session(&mut self, text: &str) -> eyre::Result<()> {
        if self.state.current.is_some() {
            self.save_current(text);
        }
        self.state.sessions.insert(
            0,
            Session {
                name: UNTITLED_NAME.to_string(),
                saved_at_ms: now_ms(),
                source: self.state.fallback_source.clone(),
            },
        );
        self.state.current = Some(0);
        self.persist()
    }

    /// Switch to the session at `index`, saving the current text first.
    pub fn restore(&mut self, index: usize, text: &str) -> eyre::Result<()> {
        if index >= self.state.sessions.len() {
            eyre::bail!("no session at index {index}");
        }
        self.save_current(text);
        self.state.current = Some(index);
        self.persist()
    }

    pub fn rename_current(&mut self, name: impl Into<String>) -> eyre::Result<()> {
        let session = self
            .state
            .current
            .and_then(|index| self.state.sessions.get_mut(index))
            .ok_or_else(|| eyre::eyre!("no session is active"))?;
        session.name = name.into();
        self.persist()
    }

    /// Delete the active session. Removing the last one leaves the store
    /// empty and the editor back on the fallback source.
    pub fn delete_current(&mut self) -> eyre::Result<()> {
        match self.state.current {
            None => Ok(()),
            Some(_) if self.state.sessions.len() <= 1 => {
                self.state.sessions.clear();
                self.state.current = None;
                self.persist()
            }
            Some(index) => {
                if index < self.state.sessions.len() {
                    self.state.sessions.remove(index);
                }
                self.state.current = Some(0);
                self.persist()
            }
        }
    }

    pub fn delete_all(&mut self) -> eyre::Result<()> {
        self.state.sessions.clear();
        self.state.current = None;
        self.persist()
    }

    fn save_current(&mut self, text: &str) {
        let now = now_ms();
        match self.state.current {
            Some(index) if index < self.state.sessions.len() => {
                let session = &mut self.state.sessions[index];
                session.source = text.to_string();
                session.saved_at_ms = now;
            }
            _ => {
                self.state.sessions = vec![Session {
                    name: UNTITLED_NAME.to_string(),
                    saved_at_ms: now,
                    source: text.to_string(),
                }];
                self.state.current = Some(0);
            }
        }
    }

    fn persist(&self) -> eyre::Result<()> {
        crate::save_to(&self.state, &self.save_path).wrap_err("saving session state")
    }
}

/// State that is persisted
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Persistence {
    pub version: String,
    pub fallback_source: String,
    pub current: Option<usize>,
    pub sessions: Vec<Session>,
}

impl Default for Persistence {
    fn default() -> Self {
        Self {
            version: STATE_VERSION.to_string(),
            fallback_source: String::new(),
            current: None,
            sessions: Vec::new(),
        }
    }
}

/// One saved program
#[derive(Default, Serialize, Deserialize, Debug, Clone)]
pub struct Session {
    pub name: String,
    pub saved_at_ms: u64,
    pub source: String,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

pub fn save(state: &Persistence, writer: impl Write) -> eyre::Result<()> {
    serde_json::to_writer(writer, state).context("saving session state")?;
    Ok(())
}

pub fn save_to(state: &Persistence, path: impl AsRef<Path>) -> eyre::Result<()> {
    let f = std::fs::File::create(path).context("creating file for saving")?;
    save(state, &f).context("saving state")?;
    Ok(())
}

pub fn load(reader: impl Read) -> eyre::Result<Persistence> {
    let st = serde_json::from_reader(reader).context("reading session state")?;
    Ok(st)
}

pub fn load_from(path: impl AsRef<Path>) -> eyre::Result<Persistence> {
    let path = path.as_ref();
    let f = std::fs::File::open(path)
        .with_context(|| format!("opening save state {}", path.display()))?;
    let state = load(f).context("reading from state file")?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("sessions.json")
    }

    #[test]
    fn autosave_writes_only_on_change() -> eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut store = SessionStore::open_at(store_path(&dir), "mov r0, #0")?;

        assert!(!store.save_if_changed("mov r0, #0")?);
        assert!(store.sessions().is_empty());

        // The first modification creates the session.
        assert!(store.save_if_changed("mov r0, #1")?);
        assert_eq!(store.current_index(), Some(0));
        assert_eq!(store.sessions()[0].name, "Untitled");
        assert_eq!(store.current_source(), "mov r0, #1");

        assert!(!store.save_if_changed("mov r0, #1")?);
        Ok(())
    }

    #[test]
    fn sessions_round_trip_through_disk() -> eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        {
            let mut store = SessionStore::open_at(store_path(&dir), "default")?;
            store.save_if_changed("my program")?;
            store.rename_current("Fibonacci")?;
        }

        let store = SessionStore::open_at(store_path(&dir), "default")?;
        assert_eq!(store.current_index(), Some(0));
        assert_eq!(store.sessions()[0].name, "Fibonacci");
        assert_eq!(store.current_source(), "my program");
        assert_eq!(store.state().version, STATE_VERSION);
        Ok(())
    }

    #[test]
    fn a_new_session_parks_the_old_work_and_starts_from_the_fallback() -> eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut store = SessionStore::open_at(store_path(&dir), "default")?;
        store.save_if_changed("first program")?;

        store.new_session("first program, edited")?;
        assert_eq!(store.current_index(), Some(0));
        assert_eq!(store.current_source(), "default");
        assert_eq!(store.sessions().len(), 2);
        assert_eq!(store.sessions()[1].source, "first program, edited");

        store.restore(1, "scratch")?;
        assert_eq!(store.current_source(), "first program, edited");
        assert_eq!(store.sessions()[0].source, "scratch");

        assert!(store.restore(5, "whatever").is_err());
        Ok(())
    }

    #[test]
    fn deleting_sessions_falls_back_to_the_default_program() -> eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut store = SessionStore::open_at(store_path(&dir), "default")?;
        store.save_if_changed("a")?;
        store.new_session("a")?;
        store.save_if_changed("b")?;
        assert_eq!(store.sessions().len(), 2);

        store.delete_current()?;
        assert_eq!(store.sessions().len(), 1);
        assert_eq!(store.current_index(), Some(0));
        assert_eq!(store.current_source(), "a");

        store.delete_current()?;
        assert!(store.sessions().is_empty());
        assert_eq!(store.current_index(), None);
        assert_eq!(store.current_source(), "default");

        // With nothing active this is a no-op.
        store.delete_current()?;

        store.save_if_changed("c")?;
        store.delete_all()?;
        assert!(store.sessions().is_empty());
        assert_eq!(store.current_source(), "default");
        Ok(())
    }

    #[test]
    fn the_fallback_refreshes_on_every_open() -> eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        {
            let mut store = SessionStore::open_at(store_path(&dir), "old default")?;
            store.save_if_changed("work")?;
        }

        let mut store = SessionStore::open_at(store_path(&dir), "new default")?;
        assert_eq!(store.current_source(), "work");
        store.delete_current()?;
        assert_eq!(store.current_source(), "new default");
        Ok(())
    }

    #[test]
    fn renaming_requires_an_active_session() -> eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut store = SessionStore::open_at(store_path(&dir), "default")?;
        assert!(store.rename_current("anything").is_err());
        Ok(())
    }

    #[test]
    fn loading_a_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from(dir.path().join("missing.json")).is_err());
    }
}
