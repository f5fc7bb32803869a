//! Configuration for the guest host.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use wasmpipe_frame::{FrameConfig, MAX_FRAME_SIZE, READ_CHUNK_SIZE};
use wasmpipe_transport::{ChannelPaths, DEFAULT_INBOUND_PATH, DEFAULT_OUTBOUND_PATH};

use crate::error::{HostError, Result};

/// Host environment the guest inherits through WASI.
///
/// The defaults pass stdout, stderr and the environment through, so guest
/// logging lands on the host's own streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuestCapabilities {
    /// Inherit the host's stdout
    pub inherit_stdout: bool,

    /// Inherit the host's stderr
    pub inherit_stderr: bool,

    /// Inherit the host's environment variables
    pub inherit_env: bool,

    /// Command-line arguments passed to the guest (argv[0] first)
    pub args: Vec<String>,
}

impl Default for GuestCapabilities {
    fn default() -> Self {
        Self {
            inherit_stdout: true,
            inherit_stderr: true,
            inherit_env: true,
            args: Vec::new(),
        }
    }
}

impl GuestCapabilities {
    /// Inherit nothing from the host.
    pub fn none() -> Self {
        Self {
            inherit_stdout: false,
            inherit_stderr: false,
            inherit_env: false,
            args: Vec::new(),
        }
    }

    /// Builder: inherit stdout
    pub fn stdout(mut self, allow: bool) -> Self {
        self.inherit_stdout = allow;
        self
    }

    /// Builder: inherit stderr
    pub fn stderr(mut self, allow: bool) -> Self {
        self.inherit_stderr = allow;
        self
    }

    /// Builder: inherit environment variables
    pub fn env(mut self, allow: bool) -> Self {
        self.inherit_env = allow;
        self
    }

    /// Builder: add command-line argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Configuration for one host process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Environment passthrough for the guest
    pub capabilities: GuestCapabilities,

    /// Pipe the host reads inbound frames from
    pub inbound: PathBuf,

    /// Pipe the host writes outbound frames to
    pub outbound: PathBuf,

    /// Largest inbound payload accepted, in bytes
    pub max_frame_size: usize,

    /// Optional cap on payloads the guest emits; unbounded when unset
    pub max_outbound_frame_size: Option<usize>,

    /// Largest single read while collecting a payload
    pub read_chunk_size: usize,

    /// Maximum guest linear memory in bytes (default = 256MB)
    pub max_memory: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            capabilities: GuestCapabilities::default(),
            inbound: PathBuf::from(DEFAULT_INBOUND_PATH),
            outbound: PathBuf::from(DEFAULT_OUTBOUND_PATH),
            max_frame_size: MAX_FRAME_SIZE,
            max_outbound_frame_size: None,
            read_chunk_size: READ_CHUNK_SIZE,
            max_memory: 256 * 1024 * 1024,
        }
    }
}

impl HostConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| HostError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the host cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.read_chunk_size == 0 {
            return Err(HostError::Config(
                "read_chunk_size must be at least 1".to_string(),
            ));
        }
        if self.max_frame_size > u32::MAX as usize {
            return Err(HostError::Config(format!(
                "max_frame_size {} does not fit a 32-bit guest length",
                self.max_frame_size
            )));
        }
        Ok(())
    }

    /// Channel pipe locations.
    pub fn channel_paths(&self) -> ChannelPaths {
        ChannelPaths::new(&self.inbound, &self.outbound)
    }

    /// Framing settings for both channels.
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_frame_size: self.max_frame_size,
            read_chunk_size: self.read_chunk_size,
            max_outbound_frame_size: self.max_outbound_frame_size,
        }
    }

    /// Builder: set capabilities
    pub fn capabilities(mut self, caps: GuestCapabilities) -> Self {
        self.capabilities = caps;
        self
    }

    /// Builder: set channel paths
    pub fn channels(mut self, inbound: impl Into<PathBuf>, outbound: impl Into<PathBuf>) -> Self {
        self.inbound = inbound.into();
        self.outbound = outbound.into();
        self
    }

    /// Builder: set max frame size
    pub fn max_frame_size(mut self, bytes: usize) -> Self {
        self.max_frame_size = bytes;
        self
    }

    /// Builder: cap outbound payloads
    pub fn max_outbound_frame_size(mut self, bytes: usize) -> Self {
        self.max_outbound_frame_size = Some(bytes);
        self
    }

    /// Builder: set max memory
    pub fn max_memory(mut self, bytes: usize) -> Self {
        self.max_memory = bytes;
        self
    }
}
