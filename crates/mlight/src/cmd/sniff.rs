use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mlight_frame::{FrameConfig, FrameError, FrameReader};
use mlight_transport::SerialConfig;
use tracing::{debug, info, warn};

use crate::cmd::SniffArgs;
use crate::exit::{frame_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: SniffArgs, format: OutputFormat) -> CliResult<i32> {
    let serial = SerialConfig::new(&args.device).with_baud_rate(args.baud_rate);
    let stream =
        mlight_transport::open(&serial).map_err(|err| transport_error("open failed", err))?;
    info!(device = stream.name().as_deref().unwrap_or("unknown"), "sniffing bus frames");
    let mut reader = FrameReader::for_bus(stream, FrameConfig::default());

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        let message = match reader.read_message() {
            Ok(message) => message,
            Err(FrameError::Io(err)) if err.kind() == ErrorKind::TimedOut => continue,
            Err(err @ FrameError::ChecksumMismatch { .. }) => {
                warn!(error = %err, "dropping corrupt frame");
                continue;
            }
            Err(err) => return Err(frame_error("read failed", err)),
        };

        debug!(address = message.address, nonce = message.nonce, "frame received");
        print_message(&message, format);
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count {
                break;
            }
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
