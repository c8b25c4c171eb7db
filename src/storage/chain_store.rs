use crate::core::Block;
use crate::error::Result;
use crate::utils::{from_json, to_pretty_json};
use log::{info, warn};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// The whole chain as one JSON document on disk.
///
/// Writes land in a temporary file next to the store and are renamed over it,
/// so a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct ChainStore {
    path: PathBuf,
}

impl ChainStore {
    pub fn new<P: AsRef<Path>>(path: P) -> ChainStore {
        ChainStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn get_path(&self) -> &Path {
        self.path.as_path()
    }

    /// `None` when the store is missing or cannot be parsed; the caller starts from genesis.
    pub fn load(&self) -> Option<Vec<Block>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                info!("No chain store at {}: {e}", self.path.display());
                return None;
            }
        };

        match from_json::<Vec<Block>>(&bytes) {
            Ok(chain) if !chain.is_empty() => {
                info!(
                    "Loaded {} blocks from {}",
                    chain.len(),
                    self.path.display()
                );
                Some(chain)
            }
            Ok(_) => {
                warn!("Chain store at {} is empty", self.path.display());
                None
            }
            Err(e) => {
                warn!("Chain store at {} is unreadable: {e}", self.path.display());
                None
            }
        }
    }

    pub fn save(&self, chain: &[Block]) -> Result<()> {
        let bytes = to_pretty_json(chain)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut staging = NamedTempFile::new_in(&dir)?;
        staging.write_all(&bytes)?;
        staging.as_file().sync_all()?;
        staging.persist(&self.path)?;

        info!("Saved {} blocks to {}", chain.len(), self.path.display());
        Ok(())
    }
}
