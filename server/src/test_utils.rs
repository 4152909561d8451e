//! Test Utilities Module
//!
//! Builds throwaway output bundles on disk for resolver tests.
//! This module is only compiled when running tests.

#![cfg(test)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::bundle::{DISPLAY_INFO_FILE, LocalBundleService, ResolverConfig};

/// Temporary directory holding an output root plus room for files outside it
pub struct BundleFixture {
    temp: TempDir,
    root: PathBuf,
}

impl BundleFixture {
    /// Create an empty output root at `<tmp>/bundle`
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let root = temp.path().join("bundle");
        fs::create_dir_all(&root).expect("Failed to create output root");
        Self { temp, root }
    }

    /// Write a file relative to the output root
    pub fn file(self, relative: &str, contents: &[u8]) -> Self {
        write_file(&self.root.join(relative), contents);
        self
    }

    /// Write a file next to (outside of) the output root
    pub fn outside_file(self, relative: &str, contents: &[u8]) -> Self {
        write_file(&self.temp.path().join(relative), contents);
        self
    }

    /// Create a directory relative to the output root
    pub fn dir(self, relative: &str) -> Self {
        fs::create_dir_all(self.root.join(relative)).expect("Failed to create dir");
        self
    }

    /// Create a display with its `displayInfo.json` marker
    pub fn display(self, name: &str) -> Self {
        let marker = format!("displays/{}/{}", name, DISPLAY_INFO_FILE);
        self.file(&marker, b"{}")
    }

    /// Write a panel file, `file_name` includes the extension
    pub fn panel(self, display: &str, file_name: &str, contents: &[u8]) -> Self {
        let path = format!("displays/{}/panels/{}", display, file_name);
        self.file(&path, contents)
    }

    /// Service rooted at this fixture
    pub fn service(&self) -> LocalBundleService {
        LocalBundleService::new(&ResolverConfig::new(&self.root))
    }
}

fn write_file(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(path, contents).expect("Failed to write fixture file");
}
