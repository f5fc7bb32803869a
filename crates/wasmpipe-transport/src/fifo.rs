use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::FileTypeExt;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// Default permission mode for created pipes.
pub const DEFAULT_FIFO_MODE: u32 = 0o600;

/// Whether `path` exists and is a named pipe.
pub fn is_fifo(path: impl AsRef<Path>) -> bool {
    std::fs::metadata(path)
        .map(|m| m.file_type().is_fifo())
        .unwrap_or(false)
}

/// Create a named pipe at `path` unless one already exists.
///
/// Returns `true` when a new pipe was created. An existing path that is not a
/// FIFO is never replaced.
pub fn create_fifo(path: impl AsRef<Path>, mode: u32) -> Result<bool> {
    let path = path.as_ref();

    if let Ok(metadata) = std::fs::symlink_metadata(path) {
        if metadata.file_type().is_fifo() {
            debug!(?path, "reusing existing fifo");
            return Ok(false);
        }
        return Err(TransportError::NotAFifo {
            path: path.to_path_buf(),
        });
    }

    let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| TransportError::Create {
        path: path.to_path_buf(),
        source: std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path contains an interior NUL byte",
        ),
    })?;

    // SAFETY: `c_path` is a valid NUL-terminated string that outlives the call.
    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), mode as libc::mode_t) };
    if rc != 0 {
        return Err(TransportError::Create {
            path: path.to_path_buf(),
            source: std::io::Error::last_os_error(),
        });
    }

    info!(?path, mode = %format!("{:o}", mode), "created fifo");
    Ok(true)
}
