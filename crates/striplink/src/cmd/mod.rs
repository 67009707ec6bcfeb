use std::net::{Ipv4Addr, SocketAddr};

use clap::{Args, Subcommand};
use striplink_session::ListenerConfig;

use crate::effects::Effect;
use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod discover;
pub mod emulate;
pub mod run;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Locate a controller and print what it announced.
    Discover(DiscoverArgs),
    /// Drive an animation against a discovered strip.
    Run(RunArgs),
    /// Act as a controller, for development without hardware.
    Emulate(EmulateArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Discover(args) => discover::run(args, format),
        Command::Run(args) => run::run(args, format),
        Command::Emulate(args) => emulate::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Only accept responses from this unit id.
    #[arg(long, short = 'u')]
    pub unit: Option<u8>,
    /// Send discovery requests here instead of the LAN broadcast address.
    #[arg(long, value_name = "ADDR")]
    pub target: Option<SocketAddr>,
    /// Bind an ephemeral local port instead of the shared discovery port.
    #[arg(long)]
    pub ephemeral: bool,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Animation to run.
    #[arg(value_enum)]
    pub effect: Effect,
    /// Only accept responses from this unit id.
    #[arg(long, short = 'u')]
    pub unit: Option<u8>,
    /// Solid color for wipe/chase, as R,G,B.
    #[arg(long, default_value = "127,127,127")]
    pub color: String,
    /// Delay between frames in milliseconds.
    #[arg(long, default_value_t = 50)]
    pub wait_ms: u64,
    /// Stop after one pass instead of looping until Ctrl-C.
    #[arg(long)]
    pub once: bool,
    /// Send discovery requests here instead of the LAN broadcast address.
    #[arg(long, value_name = "ADDR")]
    pub target: Option<SocketAddr>,
    /// Bind an ephemeral local port instead of the shared discovery port.
    #[arg(long)]
    pub ephemeral: bool,
}

#[derive(Args, Debug)]
pub struct EmulateArgs {
    /// Unit id to announce.
    #[arg(long, short = 'u', default_value_t = 1)]
    pub unit: u8,
    /// Strip length to announce.
    #[arg(long, default_value_t = 30)]
    pub pixels: u16,
    /// Channels per pixel (3 = RGB, 4 = RGBW).
    #[arg(long, default_value_t = 3)]
    pub channels: u8,
    /// Local bind address (default: the shared discovery port).
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,
}

#[derive(Args, Debug, Default)]
pub struct VersionArgs {}

pub(crate) fn listener_config(target: Option<SocketAddr>, ephemeral: bool) -> ListenerConfig {
    let mut config = ListenerConfig::default();
    if ephemeral {
        config.bind_addr = (Ipv4Addr::UNSPECIFIED, 0).into();
    }
    if let Some(target) = target {
        config.discovery_addr = target;
    }
    config
}
