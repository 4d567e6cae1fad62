//! Human and JSON output for CLI commands

use uplink_core::domain::{DispatchReport, HostResult};

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }

    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

/// Trait for formatting CLI output
pub trait OutputFormatter {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
    fn print_json(&self, value: &serde_json::Value);
}

/// Human-readable output formatter with checkmarks and indentation
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str) {
        println!("\u{2713} {}", message);
    }
    fn error(&self, message: &str) {
        eprintln!("\u{2717} Error: {}", message);
    }
    fn warn(&self, message: &str) {
        eprintln!("\u{26a0} Warning: {}", message);
    }
    fn info(&self, message: &str) {
        println!("  {}", message);
    }
    fn print_json(&self, _value: &serde_json::Value) {}
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn success(&self, message: &str) {
        println!("{}", serde_json::json!({"success": true, "message": message}));
    }
    fn error(&self, message: &str) {
        eprintln!("{}", serde_json::json!({"success": false, "error": message}));
    }
    fn warn(&self, message: &str) {
        eprintln!("{}", serde_json::json!({"level": "warning", "message": message}));
    }
    fn info(&self, _message: &str) {}
    fn print_json(&self, value: &serde_json::Value) {
        println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    if format.is_json() {
        Box::new(JsonFormatter)
    } else {
        Box::new(HumanFormatter)
    }
}

/// JSON rendering of a dispatch report, one object per host in order
pub fn report_json(report: &DispatchReport) -> serde_json::Value {
    let hosts: Vec<_> = report
        .outcomes
        .iter()
        .map(|outcome| {
            let (status, ok, detail) = match &outcome.result {
                HostResult::Delivered { status } => (Some(*status), true, None),
                HostResult::Rejected { status, body } => (Some(*status), false, Some(body.clone())),
                HostResult::TransportFailed { message } => (None, false, Some(message.clone())),
            };
            serde_json::json!({
                "host": outcome.host,
                "url": outcome.url,
                "delivered": ok,
                "status": status,
                "detail": detail,
            })
        })
        .collect();

    serde_json::json!({
        "file": report.relative_path.display().to_string(),
        "attempts": report.attempts(),
        "delivered": report.delivered(),
        "failed": report.failed(),
        "hosts": hosts,
    })
}

/// Prints one line per host outcome
pub fn print_report(formatter: &dyn OutputFormatter, report: &DispatchReport) {
    for outcome in &report.outcomes {
        match &outcome.result {
            HostResult::Delivered { status } => {
                formatter.success(&format!("{} ({status})", outcome.host));
            }
            HostResult::Rejected { status, body } => {
                formatter.error(&format!("{} ({status}): {body}", outcome.host));
            }
            HostResult::TransportFailed { message } => {
                formatter.error(&format!("{}: {message}", outcome.host));
            }
        }
    }
}
