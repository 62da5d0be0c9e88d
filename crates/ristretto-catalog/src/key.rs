use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

/// Content-addressed session key: the blake3 hex digest of the source bytes.
/// Renaming or moving a file keeps its edit history.
pub fn session_key_for(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

pub fn session_key_for_file(path: &Path) -> Result<String> {
    let mut file =
        fs::File::open(path).with_context(|| format!("failed to open: {}", path.display()))?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = [0u8; 65536];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("failed to read: {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}
