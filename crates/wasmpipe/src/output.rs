use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use wasmpipe_host::RunReport;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct RunOutput<'a> {
    schema_id: &'a str,
    module: &'a str,
    seed: i32,
    frames_read: u64,
    frames_written: u64,
    execution_time_us: u64,
}

impl<'a> RunOutput<'a> {
    fn new(module: &'a str, report: &RunReport) -> Self {
        Self {
            schema_id: "https://schemas.3leaps.dev/wasmpipe/cli/v1/run-report.schema.json",
            module,
            seed: report.seed,
            frames_read: report.frames_read,
            frames_written: report.frames_written,
            execution_time_us: report.execution_time_us,
        }
    }
}

pub fn print_report(report: &RunReport, module: &str, format: OutputFormat) {
    let out = RunOutput::new(module, report);
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["MODULE", "SEED", "READ", "WRITTEN", "TIME (us)"])
                .add_row(vec![
                    out.module.to_string(),
                    out.seed.to_string(),
                    out.frames_read.to_string(),
                    out.frames_written.to_string(),
                    out.execution_time_us.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "module={} seed={} frames_read={} frames_written={} time_us={}",
                out.module, out.seed, out.frames_read, out.frames_written, out.execution_time_us
            );
        }
        OutputFormat::Raw => {
            println!("{}", out.seed);
        }
    }
}
