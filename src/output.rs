use std::io::{self, Write};

use serde::Serialize;

use crate::app::{
    ClearResult, FetchResult, InfoResult, ListResult, ProgressEvent, ProgressSink, RunsResult,
};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Human-readable summaries on stdout, progress on stderr.
pub struct ConsoleOutput;

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!("{} ({} ms)", event.message, elapsed.as_millis()),
            None => eprintln!("{}", event.message),
        }
    }
}

impl ConsoleOutput {
    pub fn print_fetch(result: &FetchResult) {
        println!(
            "{}: {} subjects, {} failed",
            result.dataset,
            result.items.len(),
            result.failures()
        );
        for item in &result.items {
            match (&item.directory, &item.error) {
                (_, Some(error)) => println!("  subject {:>2}  error: {error}", item.subject.get()),
                (Some(directory), None) => {
                    println!("  subject {:>2}  {:<9} {directory}", item.subject.get(), item.action)
                }
                (None, None) => println!("  subject {:>2}  {}", item.subject.get(), item.action),
            }
        }
    }

    pub fn print_runs(result: &RunsResult) {
        println!("{} subject {}", result.dataset, result.subject);
        if result.sessions.is_empty() {
            println!("  no runs match the selection");
        }
        for (session, files) in &result.sessions {
            println!("  {session}");
            for file in files {
                println!("    {file}");
            }
        }
    }

    pub fn print_info(result: &InfoResult) {
        println!("{} subject {}", result.dataset, result.subject);
        for session in &result.sessions {
            println!("  {}", session.session);
            for run in &session.runs {
                println!(
                    "    {:<8} {} samples x {} channels @ {} Hz ({:.1} s), {} target / {} non-target",
                    run.run.to_string(),
                    run.samples,
                    run.channels,
                    run.sfreq,
                    run.duration_secs,
                    run.events.target,
                    run.events.non_target
                );
            }
        }
    }

    pub fn print_list(result: &ListResult) {
        if result.archives.is_empty() {
            println!("no cached archives");
        }
        for record in &result.archives {
            println!(
                "{}/{}  {}  {}",
                record.namespace, record.archive, record.downloaded_at, record.url
            );
        }
    }

    pub fn print_clear(result: &ClearResult) {
        if result.cleared {
            println!("removed {}", result.namespace);
        } else {
            println!("{} was not cached", result.namespace);
        }
    }
}
