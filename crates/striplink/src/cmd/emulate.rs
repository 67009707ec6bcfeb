use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use striplink_frame::{DiscoveryResponse, BYTES_PER_PIXEL, FRAME_HEADER_LEN, MAGIC};
use striplink_transport::{DiscoverySocket, TransportError, DISCOVERY_PORT};
use tracing::{debug, info};

use crate::cmd::EmulateArgs;
use crate::exit::{transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: EmulateArgs, _format: OutputFormat) -> CliResult<i32> {
    let bind: SocketAddr = args
        .bind
        .unwrap_or_else(|| (Ipv4Addr::UNSPECIFIED, DISCOVERY_PORT).into());

    let socket = DiscoverySocket::bind(bind).map_err(|err| transport_error("bind failed", err))?;
    // Wake periodically so Ctrl-C is honored even with no traffic.
    socket
        .set_read_timeout(Some(Duration::from_millis(250)))
        .map_err(|err| transport_error("socket setup failed", err))?;

    let response = DiscoveryResponse {
        unit_id: args.unit,
        pixel_count: args.pixels,
        channels: args.channels,
    };
    let mut announce = BytesMut::new();
    response.encode(&mut announce);

    let frame_len = FRAME_HEADER_LEN + BYTES_PER_PIXEL * usize::from(args.pixels);

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    info!(
        unit = args.unit,
        pixels = args.pixels,
        channels = args.channels,
        addr = %socket.local_addr(),
        "emulated controller ready"
    );

    let mut buf = vec![0u8; frame_len.max(4096)];
    while running.load(Ordering::SeqCst) {
        let (len, src) = match socket.recv_from(&mut buf) {
            Ok(pair) => pair,
            Err(TransportError::Recv(err))
                if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                continue;
            }
            Err(err) => return Err(transport_error("receive failed", err)),
        };
        let datagram = &buf[..len];

        if datagram == MAGIC {
            debug!(%src, "discovery request");
            socket
                .send_to(&announce, src)
                .map_err(|err| transport_error("announce failed", err))?;
        } else if len == frame_len && len > FRAME_HEADER_LEN && datagram[..4] == MAGIC {
            let first = &datagram[FRAME_HEADER_LEN..FRAME_HEADER_LEN + BYTES_PER_PIXEL];
            info!(
                %src,
                pixels = args.pixels,
                r = first[0],
                g = first[1],
                b = first[2],
                w = first[3],
                "frame received"
            );
        } else {
            debug!(%src, len, "ignoring unrelated datagram");
        }
    }

    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
