use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use super::PendingWrite;

/// Download `url` to `out_path` unless the file is already cached there.
/// Single attempt; a failed transfer leaves no partial file behind.
pub(crate) fn fetch_if_absent(url: &str, out_path: &Path) -> Result<()> {
    if out_path.exists() {
        info!("[common::download] using cached {}", out_path.display());
        return Ok(());
    }

    info!("[common::download] fetching {url} -> {}", out_path.display());
    let mut sink = PendingWrite::open(out_path)?;

    let mut resp = reqwest::blocking::get(url)
        .with_context(|| format!("[common::download] GET {url}"))?
        .error_for_status()
        .with_context(|| format!("[common::download] GET {url} returned error status"))?;

    let bytes = std::io::copy(&mut resp, &mut sink)
        .with_context(|| format!("[common::download] Failed to write {}", out_path.display()))?;

    sink.finalize()?;
    info!("[common::download] wrote {bytes} bytes to {}", out_path.display());
    Ok(())
}
