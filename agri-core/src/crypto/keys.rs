//! Public key directory loader

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Mapping of key id (file stem) to PEM text
pub type PublicKeyMap = HashMap<String, String>;

/// Load the public key set from a directory.
///
/// Only regular files with a `.pem` or `.pub` extension and a non-empty
/// stem are considered; unreadable and empty files are skipped. Entries are
/// visited in sorted filename order, so a duplicate stem resolves
/// deterministically last-wins. A missing directory yields an empty map.
pub fn load_public_keys(dir: &Path) -> PublicKeyMap {
    let mut keys = PublicKeyMap::new();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            warn!(dir = %dir.display(), error = %error, "public key directory not readable");
            return keys;
        }
    };

    let mut paths: Vec<PathBuf> = entries.flatten().map(|entry| entry.path()).collect();
    paths.sort();

    for path in paths {
        if !path.is_file() {
            continue;
        }
        match path.extension().and_then(OsStr::to_str) {
            Some("pem") | Some("pub") => {}
            _ => continue,
        }
        let Some(stem) = path.file_stem().and_then(OsStr::to_str) else {
            continue;
        };
        if stem.is_empty() {
            continue;
        }

        let pem = match fs::read_to_string(&path) {
            Ok(pem) => pem,
            Err(error) => {
                debug!(path = %path.display(), error = %error, "skipping unreadable key file");
                continue;
            }
        };
        if pem.is_empty() {
            debug!(path = %path.display(), "skipping empty key file");
            continue;
        }

        keys.insert(stem.to_owned(), pem);
    }

    keys
}
