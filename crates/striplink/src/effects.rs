//! Animation routines driven against a strip session.
//!
//! These are callers of the protocol core, not part of it: each routine is a
//! deterministic loop of pixel mutations and frame transmissions. Every
//! routine checks `running` between frames so Ctrl-C interrupts promptly,
//! and propagates session errors so the command layer can apply its
//! reconnection policy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use clap::ValueEnum;
use striplink_session::{Result, StripSession};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Effect {
    /// Fill the strip one pixel at a time.
    Wipe,
    /// Marquee-style chase in a solid color.
    Chase,
    /// Strip-wide rainbow, shifting each frame.
    Rainbow,
    /// Rainbow distributed along the strip, cycling five times.
    RainbowCycle,
    /// Marquee chase with rainbow colors.
    ChaseRainbow,
}

/// Run one pass of `effect` against the session.
pub fn run_effect(
    effect: Effect,
    session: &mut StripSession,
    color: (u8, u8, u8),
    wait: Duration,
    running: &AtomicBool,
) -> Result<()> {
    match effect {
        Effect::Wipe => color_wipe(session, color, wait, running),
        Effect::Chase => theater_chase(session, color, wait, running),
        Effect::Rainbow => rainbow(session, wait, running),
        Effect::RainbowCycle => rainbow_cycle(session, wait, running),
        Effect::ChaseRainbow => theater_chase_rainbow(session, wait, running),
    }
}

fn active(running: &AtomicBool) -> bool {
    running.load(Ordering::SeqCst)
}

pub fn color_wipe(
    session: &mut StripSession,
    (r, g, b): (u8, u8, u8),
    wait: Duration,
    running: &AtomicBool,
) -> Result<()> {
    for i in 0..session.len() {
        if !active(running) {
            return Ok(());
        }
        session.set_pixel_rgb(i, r, g, b)?;
        session.show()?;
        thread::sleep(wait);
    }
    Ok(())
}

pub fn theater_chase(
    session: &mut StripSession,
    (r, g, b): (u8, u8, u8),
    wait: Duration,
    running: &AtomicBool,
) -> Result<()> {
    for _round in 0..10 {
        for offset in 0..3u16 {
            if !active(running) {
                return Ok(());
            }
            for i in (offset..session.len()).step_by(3) {
                session.set_pixel_rgb(i, r, g, b)?;
            }
            session.show()?;
            thread::sleep(wait);
            for i in (offset..session.len()).step_by(3) {
                session.set_pixel_rgb(i, 0, 0, 0)?;
            }
        }
    }
    Ok(())
}

pub fn rainbow(session: &mut StripSession, wait: Duration, running: &AtomicBool) -> Result<()> {
    for j in 0..256u32 {
        if !active(running) {
            return Ok(());
        }
        for i in 0..session.len() {
            let (r, g, b) = wheel(((u32::from(i) + j) % 256) as u8);
            session.set_pixel_rgb(i, r, g, b)?;
        }
        session.show()?;
        thread::sleep(wait);
    }
    Ok(())
}

pub fn rainbow_cycle(
    session: &mut StripSession,
    wait: Duration,
    running: &AtomicBool,
) -> Result<()> {
    let len = u32::from(session.len().max(1));
    for j in 0..(256u32 * 5) {
        if !active(running) {
            return Ok(());
        }
        for i in 0..session.len() {
            let position = ((u32::from(i) * 256 / len + j) % 255) as u8;
            let (r, g, b) = wheel(position);
            session.set_pixel_rgb(i, r, g, b)?;
        }
        session.show()?;
        thread::sleep(wait);
    }
    Ok(())
}

pub fn theater_chase_rainbow(
    session: &mut StripSession,
    wait: Duration,
    running: &AtomicBool,
) -> Result<()> {
    for j in 0..256u32 {
        for offset in 0..3u16 {
            if !active(running) {
                return Ok(());
            }
            for i in (offset..session.len()).step_by(3) {
                // i >= offset always holds inside this stride.
                let position = ((u32::from(i - offset) + j) % 255) as u8;
                let (r, g, b) = wheel(position);
                session.set_pixel_rgb(i, r, g, b)?;
            }
            session.show()?;
            thread::sleep(wait);
            for i in (offset..session.len()).step_by(3) {
                session.set_pixel_rgb(i, 0, 0, 0)?;
            }
        }
    }
    Ok(())
}

/// Map 0..=255 onto the color wheel: red → green → blue → red.
pub fn wheel(position: u8) -> (u8, u8, u8) {
    let position = 255 - position;
    if position < 85 {
        (255 - position * 3, 0, position * 3)
    } else if position < 170 {
        let position = position - 85;
        (0, position * 3, 255 - position * 3)
    } else {
        let position = position - 170;
        (position * 3, 255 - position * 3, 0)
    }
}
