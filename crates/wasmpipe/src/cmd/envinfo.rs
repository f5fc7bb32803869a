use std::collections::BTreeMap;

use serde::Serialize;
use wasmpipe_host::{HostConfig, WasmHost, ENTRY_POINT, IMPORT_MODULE, READ_PIPE, WRITE_PIPE};

use crate::cmd::EnvinfoArgs;
use crate::exit::{host_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

const ENV_VARS: &[&str] = &[
    "WASMPIPE_CONFIG",
    "WASMPIPE_INBOUND",
    "WASMPIPE_OUTBOUND",
    "WASMPIPE_SEED",
    "WASMPIPE_MAX_FRAME_SIZE",
    "WASMPIPE_MAX_OUTBOUND_FRAME_SIZE",
    "RUST_LOG",
];

#[derive(Debug, Serialize)]
struct ChannelInfo {
    inbound: String,
    outbound: String,
}

#[derive(Debug, Serialize)]
struct FramingInfo {
    max_frame_size: usize,
    max_header_len: usize,
    read_chunk_size: usize,
    /// `None` means outbound frames are not capped.
    max_outbound_frame_size: Option<usize>,
}

#[derive(Debug, Serialize)]
struct GuestAbi {
    import_module: &'static str,
    imports: [&'static str; 2],
    entry_point: &'static str,
}

#[derive(Debug, Serialize)]
struct EngineInfo {
    runtime: &'static str,
    wasi: &'static str,
    max_memory: usize,
    ready: bool,
    detail: String,
}

#[derive(Debug, Serialize)]
struct EnvInfoOutput {
    version: &'static str,
    channels: ChannelInfo,
    framing: FramingInfo,
    guest_abi: GuestAbi,
    engine: EngineInfo,
    environment: BTreeMap<String, Option<String>>,
}

pub fn run(args: EnvinfoArgs, format: OutputFormat) -> CliResult<i32> {
    let config = resolve_config(&args)?;
    let output = collect(&config);
    print_envinfo(&output, format);
    Ok(SUCCESS)
}

/// Host configuration as `run` would see it, minus guest-only flags.
fn resolve_config(args: &EnvinfoArgs) -> CliResult<HostConfig> {
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
    Ok(config)
}

fn collect(config: &HostConfig) -> EnvInfoOutput {
    let paths = config.channel_paths();
    let frame = config.frame_config();

    EnvInfoOutput {
        version: env!("CARGO_PKG_VERSION"),
        channels: ChannelInfo {
            inbound: paths.inbound.display().to_string(),
            outbound: paths.outbound.display().to_string(),
        },
        framing: FramingInfo {
            max_frame_size: frame.max_frame_size,
            max_header_len: frame.max_header_len(),
            read_chunk_size: frame.read_chunk_size,
            max_outbound_frame_size: frame.max_outbound_frame_size,
        },
        guest_abi: GuestAbi {
            import_module: IMPORT_MODULE,
            imports: [READ_PIPE, WRITE_PIPE],
            entry_point: ENTRY_POINT,
        },
        engine: engine_info(config),
        environment: ENV_VARS
            .iter()
            .map(|name| (name.to_string(), std::env::var(name).ok()))
            .collect(),
    }
}

/// Build an engine from `config` and compile an empty module with it.
fn engine_info(config: &HostConfig) -> EngineInfo {
    let check = WasmHost::new(config.clone())
        .and_then(|host| host.load_module_bytes("envinfo", b"(module)").map(|_| ()));

    let (ready, detail) = match check {
        Ok(()) => (true, "compiles modules".to_string()),
        Err(err) => (false, err.to_string()),
    };

    EngineInfo {
        runtime: "wasmtime",
        wasi: "preview1",
        max_memory: config.max_memory,
        ready,
        detail,
    }
}

fn print_envinfo(output: &EnvInfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table | OutputFormat::Pretty => {
            let framing = &output.framing;
            let outbound_cap = framing
                .max_outbound_frame_size
                .map(|max| max.to_string())
                .unwrap_or_else(|| "unbounded".to_string());

            println!("wasmpipe {}\n", output.version);
            println!("  Inbound pipe:      {}", output.channels.inbound);
            println!("  Outbound pipe:     {}", output.channels.outbound);
            println!("\n  Max frame size:    {}", framing.max_frame_size);
            println!("  Max header len:    {}", framing.max_header_len);
            println!("  Read chunk size:   {}", framing.read_chunk_size);
            println!("  Outbound cap:      {}", outbound_cap);
            println!(
                "\n  Guest imports:     {}.{}, {}.{}",
                output.guest_abi.import_module,
                output.guest_abi.imports[0],
                output.guest_abi.import_module,
                output.guest_abi.imports[1]
            );
            println!("  Guest export:      {}(i32)", output.guest_abi.entry_point);
            println!(
                "\n  Engine:            {} + wasi {} ({})",
                output.engine.runtime, output.engine.wasi, output.engine.detail
            );
            println!("  Max memory:        {}", output.engine.max_memory);
            println!("\n  Environment:");
            for (k, v) in &output.environment {
                println!("    {:<34} {}", k, v.as_deref().unwrap_or("(not set)"));
            }
        }
        OutputFormat::Raw => println!(
            "{} {}",
            output.channels.inbound, output.channels.outbound
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn reports_default_host_state() {
        let output = collect(&HostConfig::default());

        assert_eq!(output.channels.inbound, "./io/from_engine.pipe");
        assert_eq!(output.channels.outbound, "./io/to_engine.pipe");
        assert_eq!(output.framing.max_frame_size, 1_000_000);
        assert_eq!(output.framing.max_header_len, 8);
        assert_eq!(output.framing.read_chunk_size, 1024);
        assert_eq!(output.framing.max_outbound_frame_size, None);
        assert_eq!(output.guest_abi.import_module, "env");
        assert_eq!(output.guest_abi.imports, ["read_pipe", "write_pipe"]);
        assert_eq!(output.guest_abi.entry_point, "run");
        assert!(output.engine.ready, "{}", output.engine.detail);
    }

    #[test]
    fn overrides_flow_into_report() {
        let args = EnvinfoArgs {
            inbound: Some(PathBuf::from("/run/bot/in")),
            max_frame_size: Some(4096),
            max_outbound_frame_size: Some(512),
            ..EnvinfoArgs::default()
        };

        let output = collect(&resolve_config(&args).unwrap());
        assert_eq!(output.channels.inbound, "/run/bot/in");
        assert_eq!(output.channels.outbound, "./io/to_engine.pipe");
        assert_eq!(output.framing.max_frame_size, 4096);
        assert_eq!(output.framing.max_header_len, 5);
        assert_eq!(output.framing.max_outbound_frame_size, Some(512));
    }

    #[test]
    fn invalid_config_marks_engine_not_ready() {
        let config = HostConfig {
            read_chunk_size: 0,
            ..HostConfig::default()
        };

        let output = collect(&config);
        assert!(!output.engine.ready);
        assert!(output.engine.detail.contains("read_chunk_size"));
    }

    #[test]
    fn json_lists_unbounded_outbound_as_null() {
        let output = collect(&HostConfig::default());
        let json: serde_json::Value = serde_json::to_value(&output).unwrap();

        assert!(json["framing"]["max_outbound_frame_size"].is_null());
        assert_eq!(json["guest_abi"]["imports"][1], "write_pipe");
        assert!(json["environment"]
            .as_object()
            .unwrap()
            .contains_key("WASMPIPE_INBOUND"));
    }
}
