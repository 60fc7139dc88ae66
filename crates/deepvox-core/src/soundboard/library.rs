//! Control-context registry of decoded sound effects
//!
//! The library owns one `Shared<SoundEffect>` per successfully decoded file
//! in the soundboard directory. Effect indices are stable between refreshes
//! of the same listing and are what the control surface uses to trigger
//! playback. Decode failures are logged and skipped; a file that failed to
//! decode can never be triggered.

use std::path::{Path, PathBuf};

use basedrop::Shared;

use super::{decode_effect, scan_soundboard, DecodeError, SoundEffect};
use crate::engine::gc::gc_handle;

pub struct SoundLibrary {
    dir: PathBuf,
    sample_rate: u32,
    effects: Vec<Shared<SoundEffect>>,
}

impl SoundLibrary {
    /// Load every eligible file under `dir`, creating the directory if it
    /// does not exist yet.
    pub fn load(dir: &Path, sample_rate: u32) -> Result<Self, DecodeError> {
        std::fs::create_dir_all(dir).map_err(|e| DecodeError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut library = Self {
            dir: dir.to_path_buf(),
            sample_rate,
            effects: Vec::new(),
        };
        library.refresh()?;
        Ok(library)
    }

    /// Re-scan the soundboard directory and decode the current listing.
    ///
    /// Returns the number of playable effects. Previously handed-out
    /// `Shared` references stay valid; voices already playing are unaffected.
    pub fn refresh(&mut self) -> Result<usize, DecodeError> {
        let paths = scan_soundboard(&self.dir)?;
        let handle = gc_handle();

        let mut effects = Vec::with_capacity(paths.len());
        for path in &paths {
            match decode_effect(path, self.sample_rate) {
                Ok(effect) => {
                    log::info!(
                        "Loaded effect '{}' ({:.2}s)",
                        effect.name,
                        effect.duration_secs()
                    );
                    effects.push(Shared::new(&handle, effect));
                }
                Err(e) => {
                    log::warn!("Skipping soundboard file: {e}");
                }
            }
        }

        self.effects = effects;
        log::info!(
            "Soundboard: {} playable effect(s) in {}",
            self.effects.len(),
            self.dir.display()
        );
        Ok(self.effects.len())
    }

    /// Get a reference to an effect by index, cloned for handing to a voice.
    pub fn get(&self, index: usize) -> Option<Shared<SoundEffect>> {
        self.effects.get(index).map(Shared::clone)
    }

    pub fn effects(&self) -> &[Shared<SoundEffect>] {
        &self.effects
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_creates_missing_directory() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("soundboard");
        let library = SoundLibrary::load(&dir, 48_000).unwrap();
        assert!(dir.is_dir());
        assert!(library.is_empty());
    }

    #[test]
    fn test_undecodable_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("junk.wav")).unwrap();
        file.write_all(b"not audio").unwrap();

        let library = SoundLibrary::load(dir.path(), 48_000).unwrap();
        assert_eq!(library.len(), 0);
        assert!(library.get(0).is_none());
    }

    #[test]
    fn test_refresh_picks_up_removals() {
        let dir = tempfile::tempdir().unwrap();
        let junk = dir.path().join("junk.wav");
        std::fs::File::create(&junk).unwrap();

        let mut library = SoundLibrary::load(dir.path(), 48_000).unwrap();
        std::fs::remove_file(&junk).unwrap();
        let count = library.refresh().unwrap();
        assert_eq!(count, 0);
    }
}
