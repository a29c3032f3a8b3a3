//! Controller source file enumeration.

use crate::error::DiscoveryError;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

const CONTROLLER_SUFFIX: &str = "controller.rs";

/// Shared-tier key for a directory scan.
pub(crate) fn scan_key(base: &Path, namespace: &str, recursive: bool) -> String {
    let seed = format!("{}|{}|{}", base.display(), namespace, recursive);
    format!("controller_scan:{}", hex::encode(Sha256::digest(seed.as_bytes())))
}

/// Lists controller identifiers under `base`.
///
/// Every `*controller.rs` file becomes `namespace::sub::dir::stem`, sorted
/// by path.
pub(crate) fn scan_directory(
    base: &Path,
    namespace: &str,
    recursive: bool,
) -> Result<Vec<String>, DiscoveryError> {
    let mut prefix: Vec<String> = namespace
        .split("::")
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    let mut ids = Vec::new();
    walk(base, &mut prefix, recursive, &mut ids)?;
    Ok(ids)
}

fn walk(
    dir: &Path,
    segments: &mut Vec<String>,
    recursive: bool,
    out: &mut Vec<String>,
) -> Result<(), DiscoveryError> {
    let io = |source| DiscoveryError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(dir)
        .map_err(io)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(io)?;
    entries.sort_by_key(fs::DirEntry::file_name);

    for entry in entries {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();

        // symlinked directories are not followed
        if entry.file_type().map_err(io)?.is_dir() {
            if recursive {
                segments.push(name);
                walk(&path, segments, recursive, out)?;
                segments.pop();
            }
            continue;
        }

        if !name.to_ascii_lowercase().ends_with(CONTROLLER_SUFFIX) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            let id = segments
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(stem))
                .collect::<Vec<_>>()
                .join("::");
            out.push(id);
        }
    }
    Ok(())
}
