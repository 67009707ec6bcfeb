use std::cell::Cell;
use std::io::Write;

use striplink_session::{discover_with_retry, DiscoveryListener};

use crate::cmd::{listener_config, DiscoverArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_strip, OutputFormat};

pub fn run(args: DiscoverArgs, format: OutputFormat) -> CliResult<i32> {
    let listener =
        DiscoveryListener::spawn_with_config(listener_config(args.target, args.ephemeral))
            .map_err(|err| session_error("listener start failed", err))?;

    let dotted = Cell::new(false);
    let session = discover_with_retry(&listener, args.unit, || {
        dotted.set(true);
        eprint!(".");
        let _ = std::io::stderr().flush();
    })
    .map_err(|err| session_error("discovery failed", err))?;
    if dotted.get() {
        eprintln!();
    }

    print_strip(&session, format);

    Ok(SUCCESS)
}
