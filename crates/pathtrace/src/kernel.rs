use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Scene compiled when no `--kernel` is given.
pub const BUNDLED_KERNEL: &str = include_str!("../shaders/pathtrace.wgsl");

/// Returns the WGSL kernel library, read from `path` when one is supplied.
pub fn load_kernel_source(path: Option<&Path>) -> Result<String> {
    let Some(path) = path else {
        tracing::debug!("using bundled kernel library");
        return Ok(BUNDLED_KERNEL.to_string());
    };

    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read kernel library {}", path.display()))?;
    if source.trim().is_empty() {
        bail!("kernel library {} is empty", path.display());
    }
    tracing::info!(path = %path.display(), bytes = source.len(), "loaded kernel library");
    Ok(source)
}
