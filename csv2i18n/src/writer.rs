//! Serialization of rebuilt trees back to disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{SyncError, SyncResult};
use crate::models::FileTree;
use crate::propagate::OutputFile;

/// Render a tree as pretty JSON (2-space indent) with a trailing newline.
pub fn render_tree(tree: &FileTree) -> Result<String, serde_json::Error> {
    let mut text = serde_json::to_string_pretty(tree)?;
    text.push('\n');
    Ok(text)
}

/// Render every output, failing before anything is written.
pub fn render_all(outputs: &[OutputFile]) -> SyncResult<Vec<(PathBuf, String)>> {
    outputs
        .iter()
        .map(|out| {
            render_tree(&out.tree)
                .map(|text| (out.path.clone(), text))
                .map_err(|source| SyncError::Render {
                    path: out.path.clone(),
                    source,
                })
        })
        .collect()
}

/// Write rendered files, each through a sibling temp file and a rename.
///
/// Returns the number of files written.
pub fn write_all(rendered: &[(PathBuf, String)]) -> SyncResult<usize> {
    for (path, text) in rendered {
        write_replace(path, text).map_err(|source| SyncError::Write {
            path: path.clone(),
            source,
        })?;
    }
    Ok(rendered.len())
}

fn write_replace(path: &Path, text: &str) -> std::io::Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    fs::write(&tmp, text)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}
