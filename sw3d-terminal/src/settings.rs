//! Viewer settings and file-backed mesh collaborators
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sw3d_core::{MeshSink, MeshSource, RenderOptions, Transform};

/// Initial state of the viewer, read from a JSON file. Missing fields keep
/// their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub transform: Transform,
    pub render: RenderOptions,
    /// Distance from the camera to the origin along +Z
    pub camera_distance: f64,
    /// Spin the model slowly while idle
    pub auto_rotate: bool,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            transform: Transform::identity(),
            render: RenderOptions::default(),
            camera_distance: 5.0,
            auto_rotate: true,
        }
    }
}

impl ViewerSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid settings in {}", path.display()))
    }
}

/// Reads mesh text from a file
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MeshSource for FileSource {
    fn read_text(&mut self) -> std::io::Result<String> {
        fs::read_to_string(&self.path)
    }
}

/// Writes exporter output to a file, replacing its contents
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MeshSink for FileSink {
    fn write_text(&mut self, text: &str) -> std::io::Result<()> {
        fs::write(&self.path, text)
    }
}
