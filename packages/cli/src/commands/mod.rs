pub mod edit;
pub mod init;
pub mod show;

pub use edit::{edit, EditArgs};
pub use init::{init, InitArgs};
pub use show::{show, ShowArgs};

use anyhow::{anyhow, Result};
use cpacs_editor::{CpacsDocument, EditorError};
use cpacs_parser::format_error;
use std::path::Path;

/// Load a file-backed document, rendering parse errors against the source
pub(crate) fn load_document(path: &Path) -> Result<CpacsDocument> {
    match CpacsDocument::load(path.to_path_buf()) {
        Ok(doc) => Ok(doc),
        Err(EditorError::Parse(e)) => {
            let source = std::fs::read_to_string(path)?;
            let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("unknown");
            Err(anyhow!("\n{}", format_error(&source, file_name, &e)))
        }
        Err(e) => Err(e.into()),
    }
}
