use std::io::IsTerminal;

use clap::ValueEnum;
use serde::Serialize;
use striplink_session::StripSession;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Json,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct StripOutput {
    unit_id: u8,
    pixel_count: u16,
    channels: u8,
    controller: Option<String>,
}

/// Print what a discovered strip announced about itself.
pub fn print_strip(session: &StripSession, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = StripOutput {
                unit_id: session.unit_id(),
                pixel_count: session.len(),
                channels: session.channels(),
                controller: session.peer_addr().map(|addr| addr.to_string()),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Pretty => match session.peer_addr() {
            Some(addr) => println!("{session} at {addr}"),
            None => println!("{session}"),
        },
    }
}
