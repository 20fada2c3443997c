//! Result Presenter for the terminal.

use crate::prelude::{eprintln, println};
use casegen_core::present::{present, Presentation};
use casegen_core::result::GenerationResult;
use casegen_core::timeline::{GenerationEvent, LogEntry, LogKind, Timeline};
use colored::Colorize;
use std::path::Path;
use tokio::sync::mpsc::UnboundedReceiver;

/// Collect events into a timeline until the sender goes away.
///
/// With `live` set every entry is echoed to stderr as it arrives.
pub async fn follow(mut events: UnboundedReceiver<GenerationEvent>, live: bool) -> Timeline {
    let mut timeline = Timeline::new();
    while let Some(event) = events.recv().await {
        let entry = timeline.record(&event);
        if live {
            eprintln!("{}", format_entry(entry));
        }
    }
    timeline
}

fn format_entry(entry: &LogEntry) -> String {
    let time = entry.timestamp.format("%H:%M:%S%.3f").to_string();
    let message = match entry.kind {
        LogKind::Info => entry.message.normal(),
        LogKind::Success => entry.message.green(),
        LogKind::Error => entry.message.red(),
    };
    format!("[{}] {}", time.dimmed(), message)
}

pub fn render(result: &GenerationResult, base_url: &str) {
    match present(result, base_url) {
        presentation @ Presentation::Success { .. } => {
            let mut lines = presentation.lines().into_iter();
            if let Some(headline) = lines.next() {
                println!("{}", headline.green().bold());
            }
            for line in lines {
                println!("{line}");
            }
        }
        Presentation::Failure { message } => {
            eprintln!("{} {}", "Error:".red().bold(), message);
        }
    }
}

pub fn render_timeline(timeline: &Timeline) {
    eprintln!();
    eprintln!("{}", "Logs".bright_cyan().bold());
    for entry in timeline.entries() {
        eprintln!("{}", format_entry(entry));
    }
}

pub fn render_download(path: &Path) {
    println!("Downloaded to {}", path.display().to_string().cyan());
}
