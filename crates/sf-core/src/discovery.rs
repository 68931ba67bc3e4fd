//! Filesystem discovery of migration fragments.

use std::fs;
use std::path::Path;

use crate::error::{CoreError, CoreResult};
use crate::fragment::{FragmentKind, ScriptFragment};
use crate::registry::Registry;

/// File names in `dir` that may be fragments, sorted.
///
/// Hidden entries and subdirectories are skipped.
pub fn list_identifiers(dir: &Path) -> CoreResult<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

/// Read every fragment in `dir`, in file-name order.
///
/// SQL fragments are read into memory; executable fragments are only
/// referenced by path.
pub fn discover_fragments(dir: &Path) -> CoreResult<Vec<ScriptFragment>> {
    let mut fragments = Vec::new();
    for name in list_identifiers(dir)? {
        let path = dir.join(&name);
        let is_script = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(FragmentKind::from_extension)
            == Some(FragmentKind::Script);

        let contents = if is_script {
            String::new()
        } else {
            fs::read_to_string(&path).map_err(|e| CoreError::IoWithPath {
                path: path.display().to_string(),
                source: e,
            })?
        };
        fragments.push(ScriptFragment::new(name, contents).with_path(path));
    }
    log::debug!("Discovered {} fragments in {}", fragments.len(), dir.display());
    Ok(fragments)
}

/// Discover fragments in `dir` and build a registry from them.
pub fn load_registry(dir: &Path, interpreter: &str) -> CoreResult<Registry> {
    Registry::from_fragments(discover_fragments(dir)?, interpreter)
}
