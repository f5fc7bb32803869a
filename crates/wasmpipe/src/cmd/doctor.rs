use std::path::{Path, PathBuf};

use serde::Serialize;
use wasmpipe_host::{HostConfig, WasmHost};
use wasmpipe_transport::{DEFAULT_INBOUND_PATH, DEFAULT_OUTBOUND_PATH};

use crate::cmd::DoctorArgs;
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::OutputFormat;

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Warn,
    Info,
    Skip,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    detail: String,
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    schema_id: &'static str,
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(args: DoctorArgs, format: OutputFormat) -> CliResult<i32> {
    let inbound = args
        .inbound
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INBOUND_PATH));
    let outbound = args
        .outbound
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTBOUND_PATH));

    let checks = vec![
        channel_check("inbound_pipe", &inbound),
        channel_check("outbound_pipe", &outbound),
        temp_dir_fifo_check(),
        engine_check(),
        compiled_features_check(),
    ];

    let has_fail = checks.iter().any(|c| matches!(c.status, CheckStatus::Fail));
    let overall = if has_fail { "fail" } else { "pass" };

    let output = DoctorOutput {
        schema_id: "https://schemas.3leaps.dev/wasmpipe/cli/v1/doctor-report.schema.json",
        checks,
        overall,
    };

    print_doctor(&output, format);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("wasmpipe doctor\n");
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<22} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => {
            println!("{}", output.overall);
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Warn => "WARN",
        CheckStatus::Info => "INFO",
        CheckStatus::Skip => "SKIP",
    }
}

/// Missing pipes are a warning: the engine or `--create-pipes` makes them.
fn channel_check(name: &str, path: &Path) -> CheckResult {
    let (status, detail) = if !path.exists() {
        (
            CheckStatus::Warn,
            format!("{} does not exist (use --create-pipes)", path.display()),
        )
    } else if path.is_dir() {
        (
            CheckStatus::Fail,
            format!("{} is a directory", path.display()),
        )
    } else if is_named_pipe(path) {
        (CheckStatus::Pass, format!("{} is a named pipe", path.display()))
    } else {
        (
            CheckStatus::Warn,
            format!("{} is not a named pipe; it will be opened as a file", path.display()),
        )
    };

    CheckResult {
        name: name.to_string(),
        status,
        detail,
    }
}

#[cfg(unix)]
fn is_named_pipe(path: &Path) -> bool {
    wasmpipe_transport::is_fifo(path)
}

#[cfg(not(unix))]
fn is_named_pipe(_path: &Path) -> bool {
    false
}

fn temp_dir_fifo_check() -> CheckResult {
    #[cfg(unix)]
    {
        use wasmpipe_transport::{create_fifo, DEFAULT_FIFO_MODE};

        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let dir = std::env::temp_dir().join(format!(
            "wasmpipe-doctor-{}-{}",
            std::process::id(),
            nanos
        ));
        let result = std::fs::create_dir_all(&dir)
            .map_err(wasmpipe_transport::TransportError::from)
            .and_then(|_| create_fifo(dir.join("doctor.pipe"), DEFAULT_FIFO_MODE));
        let _ = std::fs::remove_dir_all(&dir);

        match result {
            Ok(_) => CheckResult {
                name: "temp_dir_fifo".to_string(),
                status: CheckStatus::Pass,
                detail: "temp dir FIFO creation succeeded".to_string(),
            },
            Err(err) => CheckResult {
                name: "temp_dir_fifo".to_string(),
                status: CheckStatus::Fail,
                detail: format!("temp dir FIFO creation failed: {err}"),
            },
        }
    }

    #[cfg(not(unix))]
    {
        CheckResult {
            name: "temp_dir_fifo".to_string(),
            status: CheckStatus::Skip,
            detail: "named pipe creation not implemented on this platform".to_string(),
        }
    }
}

/// Compile an empty module to prove the engine works on this host.
fn engine_check() -> CheckResult {
    let result = WasmHost::new(HostConfig::default())
        .and_then(|host| host.load_module_bytes("doctor", b"(module)"));

    match result {
        Ok(_) => CheckResult {
            name: "wasm_engine".to_string(),
            status: CheckStatus::Pass,
            detail: "wasmtime compiled a test module".to_string(),
        },
        Err(err) => CheckResult {
            name: "wasm_engine".to_string(),
            status: CheckStatus::Fail,
            detail: err.to_string(),
        },
    }
}

fn compiled_features_check() -> CheckResult {
    let mut features = Vec::new();
    if cfg!(feature = "async") {
        features.push("async");
    }
    if cfg!(feature = "cli") {
        features.push("cli");
    }

    CheckResult {
        name: "compiled_features".to_string(),
        status: CheckStatus::Info,
        detail: features.join(", "),
    }
}
