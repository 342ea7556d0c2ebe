//! Import/export collaborators
//!
//! The core never touches the filesystem. Callers hand a [`MeshSource`] to
//! [`import_mesh`] and a [`MeshSink`] to [`export_mesh`]; in-memory strings
//! implement both.
use log::debug;

use crate::error::Result;
use crate::geometry::Mesh;
use crate::obj::{parse_obj, write_obj};

/// Supplies the raw text of a mesh document
pub trait MeshSource {
    fn read_text(&mut self) -> std::io::Result<String>;
}

/// Receives the text produced by the exporter
pub trait MeshSink {
    fn write_text(&mut self, text: &str) -> std::io::Result<()>;
}

impl MeshSource for &str {
    fn read_text(&mut self) -> std::io::Result<String> {
        Ok((*self).to_owned())
    }
}

impl MeshSource for String {
    fn read_text(&mut self) -> std::io::Result<String> {
        Ok(self.clone())
    }
}

impl MeshSink for String {
    fn write_text(&mut self, text: &str) -> std::io::Result<()> {
        self.clear();
        self.push_str(text);
        Ok(())
    }
}

/// Reads and parses an OBJ document
pub fn import_mesh<S: MeshSource + ?Sized>(source: &mut S) -> Result<Mesh> {
    let text = source.read_text()?;
    debug!("read {} bytes of mesh text", text.len());
    Ok(parse_obj(&text)?)
}

/// Serializes `mesh` as OBJ and hands the text to `sink`.
///
/// Nothing reaches the sink when the mesh cannot be written.
pub fn export_mesh<S: MeshSink + ?Sized>(mesh: &Mesh, sink: &mut S) -> Result<()> {
    let text = write_obj(mesh)?;
    sink.write_text(&text)?;
    Ok(())
}
