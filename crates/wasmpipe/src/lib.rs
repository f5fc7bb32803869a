//! Run a sandboxed WebAssembly guest against two framed named pipes.
//!
//! A guest module imports `env.read_pipe` and `env.write_pipe` and exports
//! `run(seed)`. The host opens the outbound and inbound pipes, links the two
//! functions, and calls `run` once with a random seed. Each message on the
//! pipes is a decimal length, a comma, and the payload bytes.
//!
//! # Crate Structure
//!
//! - [`transport`]: named-pipe channel endpoints and FIFO creation
//! - [`frame`]: decimal length-prefixed framing (async codec behind `async`)
//! - [`host`]: wasmtime guest runtime and the guest memory bridge

/// Re-export transport types.
pub mod transport {
    pub use wasmpipe_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use wasmpipe_frame::*;
}

/// Re-export host types.
pub mod host {
    pub use wasmpipe_host::*;
}
