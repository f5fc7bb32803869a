use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod doctor;
pub mod envinfo;
pub mod run;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a guest module against the channel pipes.
    Run(RunArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Run local environment health checks.
    Doctor(DoctorArgs),
    /// Print the resolved host configuration and engine status.
    Envinfo(EnvinfoArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args, format),
        Command::Version(args) => version::run(args),
        Command::Doctor(args) => doctor::run(args, format),
        Command::Envinfo(args) => envinfo::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Guest module (.wasm, .wat, or base64 text with --base64).
    pub module: PathBuf,
    /// JSON host config file; flags below override its values.
    #[arg(long, value_name = "FILE", env = "WASMPIPE_CONFIG")]
    pub config: Option<PathBuf>,
    /// Pipe to read inbound frames from.
    #[arg(long, value_name = "PATH", env = "WASMPIPE_INBOUND")]
    pub inbound: Option<PathBuf>,
    /// Pipe to write outbound frames to.
    #[arg(long, value_name = "PATH", env = "WASMPIPE_OUTBOUND")]
    pub outbound: Option<PathBuf>,
    /// Seed passed to the guest's run export. Default: random.
    #[arg(long, env = "WASMPIPE_SEED", allow_hyphen_values = true)]
    pub seed: Option<i32>,
    /// Largest inbound frame payload accepted, in bytes.
    #[arg(long, value_name = "BYTES", env = "WASMPIPE_MAX_FRAME_SIZE")]
    pub max_frame_size: Option<usize>,
    /// Cap on outbound frame payloads, in bytes. Default: no cap.
    #[arg(long, value_name = "BYTES", env = "WASMPIPE_MAX_OUTBOUND_FRAME_SIZE")]
    pub max_outbound_frame_size: Option<usize>,
    /// Maximum guest linear memory, in bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_memory: Option<usize>,
    /// Create missing channel pipes as FIFOs before opening them.
    #[arg(long)]
    pub create_pipes: bool,
    /// The module file holds base64 text.
    #[arg(long)]
    pub base64: bool,
    /// Do not pass the host's stdout to the guest.
    #[arg(long)]
    pub no_inherit_stdout: bool,
    /// Do not pass the host's stderr to the guest.
    #[arg(long)]
    pub no_inherit_stderr: bool,
    /// Do not pass the host's environment to the guest.
    #[arg(long)]
    pub no_inherit_env: bool,
    /// Print a run summary to stdout after the guest returns.
    #[arg(long)]
    pub report: bool,
    /// Arguments passed to the guest after argv[0] (the module name).
    #[arg(last = true, value_name = "GUEST_ARGS")]
    pub guest_args: Vec<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {
    /// Inbound pipe to check.
    #[arg(long, value_name = "PATH", env = "WASMPIPE_INBOUND")]
    pub inbound: Option<PathBuf>,
    /// Outbound pipe to check.
    #[arg(long, value_name = "PATH", env = "WASMPIPE_OUTBOUND")]
    pub outbound: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct EnvinfoArgs {
    /// JSON host config file to resolve.
    #[arg(long, value_name = "FILE", env = "WASMPIPE_CONFIG")]
    pub config: Option<PathBuf>,
    /// Inbound pipe override.
    #[arg(long, value_name = "PATH", env = "WASMPIPE_INBOUND")]
    pub inbound: Option<PathBuf>,
    /// Outbound pipe override.
    #[arg(long, value_name = "PATH", env = "WASMPIPE_OUTBOUND")]
    pub outbound: Option<PathBuf>,
    /// Inbound frame bound override, in bytes.
    #[arg(long, value_name = "BYTES", env = "WASMPIPE_MAX_FRAME_SIZE")]
    pub max_frame_size: Option<usize>,
    /// Outbound frame cap override, in bytes.
    #[arg(long, value_name = "BYTES", env = "WASMPIPE_MAX_OUTBOUND_FRAME_SIZE")]
    pub max_outbound_frame_size: Option<usize>,
}
