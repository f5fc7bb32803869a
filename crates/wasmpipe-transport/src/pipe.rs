use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// Default inbound channel path, relative to the working directory.
pub const DEFAULT_INBOUND_PATH: &str = "./io/from_engine.pipe";

/// Default outbound channel path, relative to the working directory.
pub const DEFAULT_OUTBOUND_PATH: &str = "./io/to_engine.pipe";

/// Filesystem locations of the two channel pipes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPaths {
    /// Pipe the host reads frames from.
    pub inbound: PathBuf,
    /// Pipe the host writes frames to.
    pub outbound: PathBuf,
}

impl Default for ChannelPaths {
    fn default() -> Self {
        Self {
            inbound: PathBuf::from(DEFAULT_INBOUND_PATH),
            outbound: PathBuf::from(DEFAULT_OUTBOUND_PATH),
        }
    }
}

impl ChannelPaths {
    /// Create channel paths from explicit locations.
    pub fn new(inbound: impl Into<PathBuf>, outbound: impl Into<PathBuf>) -> Self {
        Self {
            inbound: inbound.into(),
            outbound: outbound.into(),
        }
    }

    /// Open both ends.
    ///
    /// The outbound pipe is opened first. Opening a FIFO blocks until the
    /// other side opens it too, so the engine must open its read end of the
    /// outbound pipe before its write end of the inbound pipe.
    pub fn open(&self) -> Result<(InboundPipe, OutboundPipe)> {
        let outbound = OutboundPipe::open(&self.outbound)?;
        let inbound = InboundPipe::open(&self.inbound)?;
        info!(
            inbound = ?self.inbound,
            outbound = ?self.outbound,
            "channel pipes opened"
        );
        Ok((inbound, outbound))
    }
}

/// Read-only end of the inbound channel.
pub struct InboundPipe {
    file: File,
    path: PathBuf,
}

impl InboundPipe {
    /// Open a pipe (or regular file) for reading (blocking for FIFOs).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .open(&path)
            .map_err(|e| TransportError::Open {
                path: path.clone(),
                source: e,
            })?;
        debug!(?path, "opened inbound pipe");
        Ok(Self { file, path })
    }

    /// The path this pipe was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consume the pipe and return the underlying file.
    pub fn into_inner(self) -> File {
        self.file
    }
}

impl Read for InboundPipe {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.file.read(buf)
    }
}

impl std::fmt::Debug for InboundPipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundPipe")
            .field("path", &self.path)
            .finish()
    }
}

/// Write-only end of the outbound channel.
pub struct OutboundPipe {
    file: File,
    path: PathBuf,
}

impl OutboundPipe {
    /// Open a pipe (or regular file) for writing (blocking for FIFOs).
    ///
    /// Regular files are appended to, never truncated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|e| TransportError::Open {
                path: path.clone(),
                source: e,
            })?;
        debug!(?path, "opened outbound pipe");
        Ok(Self { file, path })
    }

    /// The path this pipe was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consume the pipe and return the underlying file.
    pub fn into_inner(self) -> File {
        self.file
    }
}

impl Write for OutboundPipe {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

impl std::fmt::Debug for OutboundPipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundPipe")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "wasmpipe-transport-{tag}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn default_paths_match_engine_layout() {
        let paths = ChannelPaths::default();
        assert_eq!(paths.inbound, PathBuf::from("./io/from_engine.pipe"));
        assert_eq!(paths.outbound, PathBuf::from("./io/to_engine.pipe"));
    }

    #[test]
    fn open_missing_path_reports_path() {
        let dir = unique_dir("missing");
        let missing = dir.join("nope.pipe");

        let err = InboundPipe::open(&missing).unwrap_err();
        match err {
            TransportError::Open { path, source } => {
                assert_eq!(path, missing);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn regular_files_work_as_channel_ends() {
        let dir = unique_dir("regular");
        let inbound = dir.join("in.bin");
        let outbound = dir.join("out.bin");
        std::fs::write(&inbound, b"5,hello").unwrap();
        std::fs::write(&outbound, b"").unwrap();

        let (mut reader, mut writer) = ChannelPaths::new(&inbound, &outbound).open().unwrap();

        let mut data = Vec::new();
        reader.read_to_end(&mut data).unwrap();
        assert_eq!(data, b"5,hello");

        writer.write_all(b"2,hi").unwrap();
        writer.flush().unwrap();
        writer.write_all(b"0,").unwrap();
        drop(writer);
        assert_eq!(std::fs::read(&outbound).unwrap(), b"2,hi0,");

        assert_eq!(reader.path(), inbound.as_path());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn debug_shows_path_only() {
        let dir = unique_dir("debug");
        let file = dir.join("x.bin");
        std::fs::write(&file, b"").unwrap();

        let pipe = InboundPipe::open(&file).unwrap();
        let text = format!("{pipe:?}");
        assert!(text.starts_with("InboundPipe"));
        assert!(text.contains("x.bin"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
