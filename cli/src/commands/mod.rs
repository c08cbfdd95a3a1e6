pub mod grid;
pub mod run;

use std::path::Path;

use anyhow::{bail, Result};

/// Reject "-" as an output path; outputs are always real files.
pub(crate) fn assert_not_stdout(path: &Path) -> Result<()> {
    if path == Path::new("-") {
        bail!("stdout is not supported; provide a real file path.");
    }
    Ok(())
}
