use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories_next::ProjectDirs;
use renderer::PhaseStore;
use serde::{Deserialize, Serialize};

/// The single scalar persisted between sessions: the animation phase offset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseState {
    pub phase: Option<f64>,
}

impl PhaseState {
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read state file at {}", path.display()))?;
            let state: Self = toml::from_str(&contents)
                .with_context(|| format!("failed to parse state file at {}", path.display()))?;
            Ok(state)
        } else {
            Ok(Self::default())
        }
    }

    pub fn persist(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("state path has no parent: {}", path.display()))?;
        fs::create_dir_all(dir).with_context(|| {
            format!(
                "failed to prepare directory for state file at {}",
                dir.display()
            )
        })?;
        let serialized = toml::to_string_pretty(self)
            .with_context(|| "failed to serialize state file to TOML".to_string())?;
        fs::write(path, serialized)
            .with_context(|| format!("failed to write state file to {}", path.display()))?;
        Ok(())
    }
}

/// Default location of the state file under the platform data directory.
pub fn default_state_file() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "blobwall")
        .context("could not determine platform directories for blobwall")?;
    Ok(dirs.data_local_dir().join("state.toml"))
}

/// File-backed [`PhaseStore`] handed to the renderer.
pub struct FilePhaseStore {
    path: PathBuf,
    state: PhaseState,
}

impl FilePhaseStore {
    pub fn open(path: PathBuf) -> Result<Self> {
        let state = PhaseState::load_or_default(&path)?;
        tracing::debug!(path = %path.display(), phase = ?state.phase, "opened phase state");
        Ok(Self { path, state })
    }

    /// Drops the persisted phase so the next load generates a fresh one.
    pub fn reset(&mut self) {
        self.state.phase = None;
    }
}

impl PhaseStore for FilePhaseStore {
    fn load(&self) -> Option<f64> {
        self.state.phase
    }

    fn store(&mut self, phase: f64) {
        self.state.phase = Some(phase);
        // A failed write costs only cross-session phase stability; the
        // background keeps rendering.
        if let Err(err) = self.state.persist(&self.path) {
            tracing::warn!(error = %err, "failed to persist animation phase");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::load_or_create_phase;

    #[test]
    fn missing_state_file_yields_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = PhaseState::load_or_default(&dir.path().join("state.toml")).expect("load");
        assert!(state.phase.is_none());
    }

    #[test]
    fn phase_round_trips_through_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("state.toml");

        let state = PhaseState {
            phase: Some(417.25),
        };
        state.persist(&path).expect("persist");

        let reloaded = PhaseState::load_or_default(&path).expect("reload");
        assert_eq!(reloaded.phase, Some(417.25));
    }

    #[test]
    fn first_run_persists_a_phase_and_second_run_reuses_it() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.toml");

        let mut store = FilePhaseStore::open(path.clone()).expect("open");
        let first = load_or_create_phase(&mut store);
        assert!((0.0..renderer::PHASE_RANGE).contains(&first));

        let mut store = FilePhaseStore::open(path).expect("reopen");
        let second = load_or_create_phase(&mut store);
        assert_eq!(first, second);
    }

    #[test]
    fn reset_discards_the_stored_phase() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.toml");

        let mut store = FilePhaseStore::open(path.clone()).expect("open");
        let first = load_or_create_phase(&mut store);

        let mut store = FilePhaseStore::open(path).expect("reopen");
        store.reset();
        let second = load_or_create_phase(&mut store);
        // A fresh draw from a continuous range practically never collides.
        assert!((0.0..renderer::PHASE_RANGE).contains(&second));
        assert_ne!(first, second);
    }
}
