use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use cloudsync_engine::{sync_tree, ProgressSink, SyncError, SyncEvent, SyncReport, SyncStatus};
use cloudsync_scan::LocalFileSystem;
use cloudsync_store::DirectoryObjectStore;
use colored::Colorize;
use serde::Serialize;

use crate::cli::{Cli, OutputFormat};
use crate::config::{FileConfig, Settings};

pub fn run_command(cli: Cli) -> ExitCode {
    let result = run_sync(&cli);
    let code = exit_code(&result);
    if let Err(err) = result {
        eprintln!("\n{} {err:#}\n", "ERROR:".red().bold());
    }
    ExitCode::from(code)
}

/// 0 on success, 1 when some entries failed, 2 when the run never started.
pub fn exit_code(result: &anyhow::Result<SyncReport>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(err) => match err.downcast_ref::<SyncError>() {
            Some(e) if !e.is_fatal() => 1,
            _ => 2,
        },
    }
}

fn run_sync(cli: &Cli) -> anyhow::Result<SyncReport> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(cli, file)?;
    let backend = DirectoryObjectStore::from_endpoint(&settings.credentials.endpoint);
    let printer = Printer::new(cli.format);

    let report = sync_tree(
        &backend,
        &settings.credentials,
        Arc::new(LocalFileSystem),
        &settings.dir,
        &settings.sync,
        &printer,
    );

    match &report {
        Ok(report) => printer.summary(report),
        Err(SyncError::EntriesFailed(report)) => printer.summary(report),
        Err(_) => {}
    }
    Ok(report?)
}

/// Renders progress events as colored text or JSON lines on stdout.
pub struct Printer {
    format: OutputFormat,
}

#[derive(Serialize)]
struct Summary {
    unchanged: usize,
    created: usize,
    uploaded: usize,
    failed: usize,
    failures: Vec<FailureLine>,
}

#[derive(Serialize)]
struct FailureLine {
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    local_path: Option<String>,
    error: String,
}

impl Printer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Lines printed once the container is ready; empty for JSON output.
    pub fn banner(&self, bucket: &str) -> Vec<String> {
        match self.format {
            OutputFormat::Text => vec![
                format!("Using bucket: {}", bucket.bold()),
                "Starting upload...  This can take a while.".to_string(),
            ],
            OutputFormat::Json => Vec::new(),
        }
    }

    /// Closing lines: one per failed entry, then the counts.
    pub fn summary_lines(&self, report: &SyncReport) -> Vec<String> {
        let summary = Summary {
            unchanged: report.unchanged(),
            created: report.created(),
            uploaded: report.uploaded(),
            failed: report.failed(),
            failures: report
                .failures()
                .iter()
                .map(|f| FailureLine {
                    key: f.key.to_string(),
                    local_path: f.local_path.as_ref().map(|p| p.display().to_string()),
                    error: f.error.to_string(),
                })
                .collect(),
        };
        match self.format {
            OutputFormat::Text => {
                let mut lines = Vec::new();
                if !report.failures().is_empty() {
                    lines.push(format!("\n{}", "Failed entries:".red().bold()));
                    lines.extend(report.failures().iter().map(|f| format!("  {f}")));
                }
                let failed = if summary.failed > 0 {
                    summary.failed.to_string().red().bold()
                } else {
                    summary.failed.to_string().normal()
                };
                lines.push(format!(
                    "\nDone: {} unchanged, {} created, {} uploaded, {} failed",
                    summary.unchanged, summary.created, summary.uploaded, failed
                ));
                lines
            }
            OutputFormat::Json => serde_json::to_string(&serde_json::json!({ "summary": summary }))
                .into_iter()
                .collect(),
        }
    }

    fn summary(&self, report: &SyncReport) {
        for line in self.summary_lines(report) {
            println!("{line}");
        }
    }

    pub fn render(&self, event: &SyncEvent) -> String {
        match self.format {
            OutputFormat::Text => render_text(event),
            OutputFormat::Json => serde_json::to_string(event).unwrap_or_default(),
        }
    }
}

impl ProgressSink for Printer {
    fn container_ready(&self, container: &str) {
        for line in self.banner(container) {
            println!("{line}");
        }
    }

    fn report(&self, event: &SyncEvent) {
        let line = self.render(event);
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{line}");
    }
}

fn render_text(event: &SyncEvent) -> String {
    let key = event.key.as_str();
    match event.status {
        SyncStatus::Unchanged => format!("unchanged: {}", key.dimmed()),
        SyncStatus::Created => format!("  created: {}", key.green()),
        SyncStatus::Started => format!("  started: {}", key.cyan()),
        SyncStatus::Uploaded => format!(" uploaded: {}", key.green()),
        SyncStatus::Failed => {
            let cause = event.error.as_deref().unwrap_or("unknown error");
            match &event.local_path {
                Some(path) => format!(
                    "   {} {} ({}): {}",
                    "failed:".red().bold(),
                    key,
                    path.display(),
                    cause
                ),
                None => format!("   {} {}: {}", "failed:".red().bold(), key, cause),
            }
        }
    }
}
