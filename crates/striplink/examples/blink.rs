//! Blink the first pixel of whichever strip answers discovery.
//!
//! Run with:
//!   cargo run --example blink
//!
//! In another terminal (no hardware needed):
//!   cargo run -- emulate --pixels 10

use std::thread;
use std::time::Duration;

use striplink_session::{discover, DiscoveryListener};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let listener = DiscoveryListener::spawn()?;

    eprintln!("Searching for a strip...");
    let mut session = discover(&listener, None)?;
    eprintln!("Found {session}");

    for _ in 0..10 {
        session.set_pixel_rgb(0, 255, 0, 0)?;
        session.show()?;
        thread::sleep(Duration::from_millis(300));

        session.set_pixel_rgb(0, 0, 0, 0)?;
        session.show()?;
        thread::sleep(Duration::from_millis(300));
    }

    session.close();
    Ok(())
}
