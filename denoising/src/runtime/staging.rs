use std::fs;
use std::path::{Path, PathBuf};

use crate::common::Result;
use crate::processing_context::{KERNELS, KERNELS_DIR};

/// `<system temp>/denoise_runtime_<pid>`
pub fn default_staging_dir() -> PathBuf {
    std::env::temp_dir().join(format!("denoise_runtime_{}", std::process::id()))
}

/// Writes the embedded kernels into `<root>/kernels/`.
///
/// Files already holding the right content are left alone. Returns the kernel
/// folder and the number of files written.
pub(crate) fn stage_kernels(root: &Path) -> Result<(PathBuf, usize)> {
    let dir = root.join(KERNELS_DIR);
    fs::create_dir_all(&dir)?;

    let mut written = 0;
    for kernel in KERNELS {
        let path = dir.join(kernel.file_name);
        if fs::read_to_string(&path).is_ok_and(|existing| existing == kernel.source) {
            continue;
        }

        // Another process may be reading the same folder.
        let tmp = dir.join(format!("{}.{}.tmp", kernel.file_name, std::process::id()));
        fs::write(&tmp, kernel.source)?;
        fs::rename(&tmp, &path)?;
        written += 1;
    }

    Ok((dir, written))
}
