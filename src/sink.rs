//! Destinations for rendered artifacts.

use crate::artifact::Artifact;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Receives finished artifacts; each call gets a complete script.
pub trait ArtifactSink {
    fn write(&mut self, artifact: &Artifact) -> Result<()>;
}

/// Writes artifacts below a root directory, one folder per category.
#[derive(Debug)]
pub struct DirectorySink {
    root: PathBuf,
    written: usize,
}

impl DirectorySink {
    /// Open `root`, removing anything already in it when `wipe` is set.
    pub fn open(root: impl Into<PathBuf>, wipe: bool) -> Result<Self> {
        let root = root.into();
        if wipe && root.exists() {
            log::info!("Clearing output directory {}", root.display());
            fs::remove_dir_all(&root)?;
        }
        fs::create_dir_all(&root)?;
        Ok(Self { root, written: 0 })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files written through this sink
    pub fn written(&self) -> usize {
        self.written
    }
}

impl ArtifactSink for DirectorySink {
    fn write(&mut self, artifact: &Artifact) -> Result<()> {
        let dir = self.root.join(artifact.category.dir_name());
        fs::create_dir_all(&dir)?;
        let path = dir.join(&artifact.file_name);
        log::debug!("Writing {}", path.display());
        fs::write(&path, &artifact.content)?;
        self.written += 1;
        Ok(())
    }
}

/// Keeps artifacts in memory in write order.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub artifacts: Vec<Artifact>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content of the artifact at `relative` (e.g. `TABLES/001_ORDERS.sql`)
    pub fn get(&self, relative: &str) -> Option<&str> {
        self.artifacts
            .iter()
            .find(|a| a.relative_path() == Path::new(relative))
            .map(|a| a.content.as_str())
    }
}

impl ArtifactSink for MemorySink {
    fn write(&mut self, artifact: &Artifact) -> Result<()> {
        self.artifacts.push(artifact.clone());
        Ok(())
    }
}
