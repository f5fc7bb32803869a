use tracing::info;
use wasmpipe_host::{random_seed, GuestModule, HostConfig, PipeSession, WasmHost};

use crate::cmd::RunArgs;
use crate::exit::{host_error, io_error, CliResult, SUCCESS};
use crate::output::{print_report, OutputFormat};

pub fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    let config = host_config(&args)?;
    let host = WasmHost::new(config.clone())
        .map_err(|err| host_error("invalid host configuration", err))?;
    let module = load_module(&host, &args)?;

    if args.create_pipes {
        create_pipes(&config)?;
    }

    let paths = config.channel_paths();
    info!(
        inbound = %paths.inbound.display(),
        outbound = %paths.outbound.display(),
        "opening channels"
    );
    let session = PipeSession::open(&paths, config.frame_config())
        .map_err(|err| host_error("failed to open channels", err))?;

    let instance = host
        .instantiate(&module, session)
        .map_err(|err| host_error("failed to instantiate guest", err))?;

    let seed = args.seed.unwrap_or_else(random_seed);
    let report = instance
        .run(seed)
        .map_err(|err| host_error("guest run failed", err))?;

    if args.report {
        print_report(&report, module.name(), format);
    }
    Ok(SUCCESS)
}

/// Config file (if any) with command-line overrides applied.
fn host_config(args: &RunArgs) -> CliResult<HostConfig> {
    let mut config = match &args.config {
        Some(path) => HostConfig::from_json_file(path)
            .map_err(|err| host_error("failed to load config", err))?,
        None => HostConfig::default(),
    };

    if let Some(inbound) = &args.inbound {
        config.inbound = inbound.clone();
    }
    if let Some(outbound) = &args.outbound {
        config.outbound = outbound.clone();
    }
    if let Some(max) = args.max_frame_size {
        config.max_frame_size = max;
    }
    if let Some(max) = args.max_outbound_frame_size {
        config.max_outbound_frame_size = Some(max);
    }
    if let Some(max) = args.max_memory {
        config.max_memory = max;
    }

    let caps = &mut config.capabilities;
    caps.inherit_stdout &= !args.no_inherit_stdout;
    caps.inherit_stderr &= !args.no_inherit_stderr;
    caps.inherit_env &= !args.no_inherit_env;

    if !args.guest_args.is_empty() {
        caps.args = std::iter::once(module_stem(args))
            .chain(args.guest_args.iter().cloned())
            .collect();
    }

    Ok(config)
}

fn load_module(host: &WasmHost, args: &RunArgs) -> CliResult<GuestModule> {
    if !args.base64 {
        return host
            .load_module(&args.module)
            .map_err(|err| host_error("failed to load module", err));
    }

    let text = std::fs::read_to_string(&args.module)
        .map_err(|err| io_error(&format!("failed to read {}", args.module.display()), err))?;
    host.load_module_base64(&module_stem(args), &text)
        .map_err(|err| host_error("failed to load module", err))
}

fn module_stem(args: &RunArgs) -> String {
    args.module
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("guest")
        .to_string()
}

#[cfg(unix)]
fn create_pipes(config: &HostConfig) -> CliResult<()> {
    use wasmpipe_transport::{create_fifo, DEFAULT_FIFO_MODE};

    use crate::exit::transport_error;

    for path in [&config.outbound, &config.inbound] {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|err| io_error(&format!("failed to create {}", parent.display()), err))?;
        }
        let created = create_fifo(path, DEFAULT_FIFO_MODE)
            .map_err(|err| transport_error("failed to create pipe", err))?;
        if created {
            info!(path = %path.display(), "created pipe");
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn create_pipes(_config: &HostConfig) -> CliResult<()> {
    tracing::warn!("--create-pipes is not supported on this platform");
    Err(crate::exit::CliError::new(
        crate::exit::USAGE,
        "--create-pipes requires a Unix platform",
    ))
}
