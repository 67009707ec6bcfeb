use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use striplink_session::{discover_with_retry, DiscoveryListener};
use tracing::{info, warn};

use crate::cmd::{listener_config, RunArgs};
use crate::effects::run_effect;
use crate::exit::{session_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::OutputFormat;

pub fn run(args: RunArgs, _format: OutputFormat) -> CliResult<i32> {
    let color = parse_color(&args.color)?;
    let wait = Duration::from_millis(args.wait_ms);

    let listener =
        DiscoveryListener::spawn_with_config(listener_config(args.target, args.ephemeral))
            .map_err(|err| session_error("listener start failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    // After the first session the reconnection policy locks onto that unit:
    // a replacement must be the same controller, not whichever answers first.
    let mut want = args.unit;

    'sessions: while running.load(Ordering::SeqCst) {
        let dotted = std::cell::Cell::new(false);
        let mut session = discover_with_retry(&listener, want, || {
            if !running.load(Ordering::SeqCst) {
                // Ctrl-C during a blocking search: no session to clean up.
                std::process::exit(SUCCESS);
            }
            dotted.set(true);
            eprint!(".");
            let _ = std::io::stderr().flush();
        })
        .map_err(|err| session_error("discovery failed", err))?;
        if dotted.get() {
            eprintln!();
        }
        want = Some(session.unit_id());
        info!(%session, "driving strip");

        loop {
            if !running.load(Ordering::SeqCst) {
                session.close();
                break 'sessions;
            }

            match run_effect(args.effect, &mut session, color, wait, &running) {
                Ok(()) => {
                    if args.once {
                        session.close();
                        break 'sessions;
                    }
                }
                Err(err) if err.is_transient() => {
                    warn!(
                        unit = session.unit_id(),
                        error = %err,
                        "strip unreachable, rediscovering"
                    );
                    session.close();
                    continue 'sessions;
                }
                Err(err) => return Err(session_error("animation failed", err)),
            }
        }
    }

    Ok(SUCCESS)
}

fn parse_color(input: &str) -> CliResult<(u8, u8, u8)> {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(CliError::new(
            USAGE,
            format!("--color expects R,G,B (e.g. 255,0,0), got: {input}"),
        ));
    }

    let component = |part: &str| {
        part.parse::<u8>()
            .map_err(|_| CliError::new(USAGE, format!("invalid color component: {part}")))
    };

    Ok((
        component(parts[0])?,
        component(parts[1])?,
        component(parts[2])?,
    ))
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
