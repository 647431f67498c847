//! CSV vault — where uploaded report files live on disk.
//!
//! Stored names are `client_{id}_{timestamp}_{random}.csv` so a directory
//! listing reads chronologically per client and collisions are practically
//! impossible. Deleting a missing file is not an error; the goal state is
//! "file gone" either way.

use crate::error::{DashError, DashResult};
use rand::{distributions::Alphanumeric, Rng};
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvVault {
    dir: PathBuf,
}

impl CsvVault {
    /// Open (creating if needed) the vault directory.
    pub fn open(dir: impl Into<PathBuf>) -> DashResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| DashError::Other(anyhow::anyhow!("cannot create upload dir: {e}")))?;
        Ok(Self { dir })
    }

    /// Persist upload bytes under a fresh unique name; returns that name.
    pub fn save(&self, client_id: &str, original_name: &str, bytes: &[u8]) -> DashResult<String> {
        let stored = unique_file_name(client_id, original_name);
        let path = self.dir.join(&stored);
        fs::write(&path, bytes)
            .map_err(|e| DashError::Other(anyhow::anyhow!("cannot store uploaded file: {e}")))?;
        log::debug!("stored upload {} ({} bytes)", stored, bytes.len());
        Ok(stored)
    }

    pub fn delete(&self, stored_name: &str) -> DashResult<()> {
        let path = self.dir.join(stored_name);
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| DashError::Other(anyhow::anyhow!("cannot delete stored file: {e}")))?;
        }
        Ok(())
    }

    pub fn contains(&self, stored_name: &str) -> bool {
        self.dir.join(stored_name).exists()
    }

    pub fn path_of(&self, stored_name: &str) -> PathBuf {
        self.dir.join(stored_name)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn unique_file_name(client_id: &str, original_name: &str) -> String {
    let extension = original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_else(|| "csv".into());
    let timestamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|c| (c as char).to_ascii_lowercase())
        .collect();

    format!("client_{client_id}_{timestamp}_{token}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_names_are_unique_and_tagged_by_client() {
        let a = unique_file_name("c1", "report.CSV");
        let b = unique_file_name("c1", "report.CSV");
        assert!(a.starts_with("client_c1_"));
        assert!(a.ends_with(".csv"));
        assert_ne!(a, b);
    }

    #[test]
    fn save_and_delete_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let vault = CsvVault::open(tmp.path()).unwrap();

        let stored = vault.save("c9", "data.csv", b"a,b\n1,2\n").unwrap();
        assert!(vault.contains(&stored));
        assert_eq!(vault.dir(), tmp.path());
        assert_eq!(
            std::fs::read(vault.path_of(&stored)).unwrap(),
            b"a,b\n1,2\n"
        );

        vault.delete(&stored).unwrap();
        assert!(!vault.contains(&stored));
        // Deleting again is a no-op, not an error.
        vault.delete(&stored).unwrap();
    }
}
