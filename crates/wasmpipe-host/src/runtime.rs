//! Guest runtime using wasmtime.
//!
//! Uses wasmtime-wasi preview1 so standard `wasm32-wasi` guests can print to
//! the inherited stdout/stderr alongside the pipe host functions.

use std::path::Path;
use std::time::Instant;

use base64::Engine as _;
use tracing::{debug, info, warn};
use wasmtime::{Config, Engine, Instance, Linker, Module, Store, StoreLimits, StoreLimitsBuilder};
use wasmtime_wasi::preview1::WasiP1Ctx;

use crate::bridge::BridgeError;
use crate::config::{GuestCapabilities, HostConfig};
use crate::error::{HostError, Result};
use crate::host_functions::PipeHostFunctions;
use crate::session::PipeSession;

/// Guest export called once per process with the random seed.
pub const ENTRY_POINT: &str = "run";

/// Store data: WASI context, resource limits and the pipe session.
pub struct HostState {
    wasi: WasiP1Ctx,
    limits: StoreLimits,
    session: PipeSession,
}

impl HostState {
    /// The pipe session serviced by host calls.
    pub fn session_mut(&mut self) -> &mut PipeSession {
        &mut self.session
    }

    /// The pipe session serviced by host calls.
    pub fn session(&self) -> &PipeSession {
        &self.session
    }

    fn wasi(&mut self) -> &mut WasiP1Ctx {
        &mut self.wasi
    }
}

/// Owns the wasmtime engine and host configuration.
pub struct WasmHost {
    engine: Engine,
    config: HostConfig,
}

/// A compiled guest module.
pub struct GuestModule {
    module: Module,
    name: String,
}

/// An instantiated guest, ready for its single `run` call.
pub struct GuestInstance {
    store: Store<HostState>,
    instance: Instance,
}

/// Outcome of a completed guest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Seed passed to the entry point
    pub seed: i32,
    /// Frames delivered to the guest
    pub frames_read: u64,
    /// Frames emitted by the guest
    pub frames_written: u64,
    /// Wall-clock time spent inside the guest, in microseconds
    pub execution_time_us: u64,
}

/// Draw a seed uniformly from the full `i32` range.
pub fn random_seed() -> i32 {
    rand::random::<i32>()
}

impl WasmHost {
    /// Create a new host with the given configuration.
    pub fn new(config: HostConfig) -> Result<Self> {
        config.validate()?;

        let engine_config = Config::new();
        let engine = Engine::new(&engine_config)
            .map_err(|e| HostError::Engine(format!("engine creation failed: {}", e)))?;

        Ok(Self { engine, config })
    }

    /// Load a guest module from a `.wasm` (or `.wat`) file.
    pub fn load_module(&self, path: impl AsRef<Path>) -> Result<GuestModule> {
        let path = path.as_ref();
        let name = module_name(path);

        let module = Module::from_file(&self.engine, path)
            .map_err(|e| HostError::Engine(format!("module load failed: {}", e)))?;

        info!(module = %name, path = ?path, "guest module loaded");
        Ok(GuestModule { module, name })
    }

    /// Load a guest module from bytes (binary or WAT text).
    pub fn load_module_bytes(&self, name: &str, bytes: &[u8]) -> Result<GuestModule> {
        let module = Module::new(&self.engine, bytes)
            .map_err(|e| HostError::Engine(format!("module creation failed: {}", e)))?;

        info!(module = %name, size = bytes.len(), "guest module loaded");
        Ok(GuestModule {
            module,
            name: name.to_string(),
        })
    }

    /// Load a guest module from base64 text. Surrounding whitespace and
    /// line breaks are ignored.
    pub fn load_module_base64(&self, name: &str, text: &str) -> Result<GuestModule> {
        let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| HostError::ModuleEncoding(format!("base64 decode failed: {}", e)))?;
        self.load_module_bytes(name, &bytes)
    }

    /// Link WASI and the pipe host functions, and instantiate `module` with
    /// `session` as its channel pair.
    pub fn instantiate(&self, module: &GuestModule, session: PipeSession) -> Result<GuestInstance> {
        let host_state = self.build_host_state(module, session);
        let mut store = Store::new(&self.engine, host_state);

        // Configure resource limits via the stored limiter
        store.limiter(|state| &mut state.limits);

        let mut linker: Linker<HostState> = Linker::new(&self.engine);
        wasmtime_wasi::preview1::add_to_linker_sync(&mut linker, |state| state.wasi())
            .map_err(|e| HostError::Engine(format!("WASI link failed: {}", e)))?;

        PipeHostFunctions::register(&mut linker)?;

        let instance = linker
            .instantiate(&mut store, &module.module)
            .map_err(|e| HostError::Engine(format!("instantiation failed: {}", e)))?;

        if instance.get_memory(&mut store, "memory").is_none() {
            warn!(module = %module.name, "guest exports no memory; pipe calls will fail");
        }

        debug!(module = %module.name, "guest instantiated");
        Ok(GuestInstance { store, instance })
    }

    /// Build store data from the guest capabilities.
    fn build_host_state(&self, module: &GuestModule, session: PipeSession) -> HostState {
        let caps: &GuestCapabilities = &self.config.capabilities;
        let mut builder = wasmtime_wasi::WasiCtxBuilder::new();

        if caps.inherit_stdout {
            builder.inherit_stdout();
        }
        if caps.inherit_stderr {
            builder.inherit_stderr();
        }
        if caps.inherit_env {
            builder.inherit_env();
        }

        if caps.args.is_empty() {
            builder.arg(&module.name);
        } else {
            builder.args(&caps.args);
        }

        let limits = StoreLimitsBuilder::new()
            .memory_size(self.config.max_memory)
            .build();

        HostState {
            wasi: builder.build_p1(),
            limits,
            session,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &HostConfig {
        &self.config
    }
}

impl GuestModule {
    /// Get the module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the module exports the `run` entry point.
    pub fn has_entry_point(&self) -> bool {
        self.module.get_export(ENTRY_POINT).is_some()
    }
}

impl GuestInstance {
    /// Call the guest's `run(seed)` export. Consumes the instance, so the
    /// entry point runs at most once.
    pub fn run(mut self, seed: i32) -> Result<RunReport> {
        let run = self
            .instance
            .get_typed_func::<i32, ()>(&mut self.store, ENTRY_POINT)
            .map_err(|e| HostError::MissingExport(format!("{}: {}", ENTRY_POINT, e)))?;

        info!(seed, "starting guest");
        let start = Instant::now();
        let outcome = run.call(&mut self.store, seed);
        let execution_time_us = start.elapsed().as_micros() as u64;

        if let Err(err) = outcome {
            classify_trap(err)?;
            debug!("guest exited with status 0");
        }

        let session = self.store.data().session();
        let report = RunReport {
            seed,
            frames_read: session.frames_read(),
            frames_written: session.frames_written(),
            execution_time_us,
        };
        info!(
            frames_read = report.frames_read,
            frames_written = report.frames_written,
            execution_time_us,
            "guest finished"
        );
        Ok(report)
    }

    /// Current size of the guest's exported memory in bytes.
    pub fn memory_size(&mut self) -> Option<usize> {
        self.instance
            .get_memory(&mut self.store, "memory")
            .map(|memory| memory.data_size(&self.store))
    }

    /// The pipe session owned by this instance.
    pub fn session(&self) -> &PipeSession {
        self.store.data().session()
    }
}

/// Recover the typed failure behind a guest trap. A WASI `proc_exit(0)`
/// counts as a normal return.
fn classify_trap(err: wasmtime::Error) -> Result<()> {
    let err = match err.downcast::<BridgeError>() {
        Ok(bridge) => return Err(HostError::Bridge(bridge)),
        Err(err) => err,
    };

    if let Some(exit) = err.downcast_ref::<wasmtime_wasi::I32Exit>() {
        return match exit.0 {
            0 => Ok(()),
            code => Err(HostError::GuestExit(code)),
        };
    }

    Err(HostError::GuestTrap(format!("{:#}", err)))
}

fn module_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("guest")
        .to_string()
}
