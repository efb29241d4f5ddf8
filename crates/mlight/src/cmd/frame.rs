use mlight_frame::{BusMessage, CHANNEL_COUNT};

use crate::cmd::FrameArgs;
use crate::exit::{CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_message, OutputFormat};

pub fn run(args: FrameArgs, format: OutputFormat) -> CliResult<i32> {
    let message = build_message(&args)?;
    print_message(&message, format);
    Ok(SUCCESS)
}

fn build_message(args: &FrameArgs) -> CliResult<BusMessage> {
    let channels: [u8; CHANNEL_COUNT] = args.channels.as_slice().try_into().map_err(|_| {
        CliError::new(
            USAGE,
            format!(
                "--channels needs exactly {CHANNEL_COUNT} values, got {}",
                args.channels.len()
            ),
        )
    })?;
    Ok(BusMessage::new(args.address, channels, args.nonce))
}
