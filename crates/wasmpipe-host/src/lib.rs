//! Sandboxed WASM guest host.
//!
//! Loads a guest module with wasmtime, links two host functions under the
//! `env` module and calls the guest's exported `run(seed)` once:
//!
//! - `read_pipe(dst: i32) -> i32` blocks until one inbound frame arrives,
//!   copies its payload to guest memory at `dst` and returns the length
//! - `write_pipe(src: i32, len: i32)` copies `len` bytes out of guest memory
//!   and emits them as one outbound frame
//!
//! Every call re-fetches and bounds-checks the guest's exported `memory`.
//! Any protocol, I/O or bounds failure traps the guest and ends the run.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wasmpipe_host::{HostConfig, PipeSession, WasmHost, random_seed};
//!
//! let config = HostConfig::default();
//! let host = WasmHost::new(config.clone())?;
//! let module = host.load_module("bot.wasm")?;
//! let session = PipeSession::open(&config.channel_paths(), config.frame_config())?;
//! let report = host.instantiate(&module, session)?.run(random_seed())?;
//! ```

pub mod bridge;
pub mod config;
pub mod error;
mod host_functions;
pub mod runtime;
pub mod session;

pub use bridge::{guest_range, read_pipe, write_pipe, BridgeError};
pub use config::{GuestCapabilities, HostConfig};
pub use error::{HostError, Result};
pub use host_functions::{PipeHostFunctions, IMPORT_MODULE, READ_PIPE, WRITE_PIPE};
pub use runtime::{
    random_seed, GuestInstance, GuestModule, HostState, RunReport, WasmHost, ENTRY_POINT,
};
pub use session::PipeSession;

#[cfg(test)]
mod tests;
