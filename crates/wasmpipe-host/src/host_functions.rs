//! Pipe host functions imported by the guest.
//!
//! ```wat
//! (import "env" "read_pipe" (func $read_pipe (param i32) (result i32)))
//! (import "env" "write_pipe" (func $write_pipe (param i32 i32)))
//! ```
//!
//! Pointers and lengths are guest `i32` values reinterpreted as `u32`.
//! A failed call returns an error from the closure, which wasmtime turns
//! into a trap that unwinds the guest's `run`.

use wasmtime::{Caller, Linker, Memory};

use crate::bridge::{self, BridgeError};
use crate::error::{HostError, Result};
use crate::runtime::HostState;

/// Import module the guest links the pipe functions from.
pub const IMPORT_MODULE: &str = "env";

/// Inbound host function name.
pub const READ_PIPE: &str = "read_pipe";

/// Outbound host function name.
pub const WRITE_PIPE: &str = "write_pipe";

/// Pipe host functions exposed to guest modules.
pub struct PipeHostFunctions;

impl PipeHostFunctions {
    /// Register both pipe functions with the wasmtime linker.
    pub fn register(linker: &mut Linker<HostState>) -> Result<()> {
        Self::register_read_pipe(linker)?;
        Self::register_write_pipe(linker)?;
        Ok(())
    }

    fn register_read_pipe(linker: &mut Linker<HostState>) -> Result<()> {
        linker
            .func_wrap(
                IMPORT_MODULE,
                READ_PIPE,
                |mut caller: Caller<'_, HostState>, dst: i32| -> wasmtime::Result<i32> {
                    let memory = guest_memory(&mut caller)?;
                    let (data, state) = memory.data_and_store_mut(&mut caller);
                    let len = bridge::read_pipe(state.session_mut(), data, dst as u32)?;
                    Ok(len as i32)
                },
            )
            .map_err(|e| HostError::Engine(format!("failed to register read_pipe: {}", e)))?;
        Ok(())
    }

    fn register_write_pipe(linker: &mut Linker<HostState>) -> Result<()> {
        linker
            .func_wrap(
                IMPORT_MODULE,
                WRITE_PIPE,
                |mut caller: Caller<'_, HostState>, src: i32, len: i32| -> wasmtime::Result<()> {
                    let memory = guest_memory(&mut caller)?;
                    let (data, state) = memory.data_and_store_mut(&mut caller);
                    bridge::write_pipe(state.session_mut(), data, src as u32, len as u32)?;
                    Ok(())
                },
            )
            .map_err(|e| HostError::Engine(format!("failed to register write_pipe: {}", e)))?;
        Ok(())
    }
}

/// Look up the guest's exported memory for this call only.
fn guest_memory(caller: &mut Caller<'_, HostState>) -> std::result::Result<Memory, BridgeError> {
    caller
        .get_export("memory")
        .and_then(|e| e.into_memory())
        .ok_or(BridgeError::MissingMemory)
}
