//! Topic layout: `<prefix>/<address>/<channel>/set`.

use mlight_bus::CHANNEL_COUNT;

use crate::error::{CommandError, Result};

/// Lowest slave address a control message may target.
pub const MIN_ADDRESS: i64 = 1;
/// Highest slave address a control message may target.
pub const MAX_ADDRESS: i64 = 255;

const SET_SUFFIX: &str = "set";

/// The slave output a control message addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
    pub address: u8,
    pub channel: usize,
}

/// Split a control topic into its address and channel.
///
/// Everything before the last three segments is the prefix and is not
/// inspected here.
pub fn decode_topic(topic: &str) -> Result<Target> {
    let mut segments = topic.rsplit('/');
    let (Some(suffix), Some(channel), Some(address)) =
        (segments.next(), segments.next(), segments.next())
    else {
        return Err(CommandError::topic(
            topic,
            "expected <prefix>/<address>/<channel>/set",
        ));
    };

    if suffix != SET_SUFFIX {
        return Err(CommandError::topic(topic, "topic doesn't end with `/set`"));
    }

    let channel = parse_number(topic, "channel", channel)?;
    if !(0..CHANNEL_COUNT as i64).contains(&channel) {
        return Err(CommandError::ChannelOutOfRange(channel));
    }

    let address = parse_number(topic, "address", address)?;
    if !(MIN_ADDRESS..=MAX_ADDRESS).contains(&address) {
        return Err(CommandError::AddressOutOfRange(address));
    }

    Ok(Target {
        address: address as u8,
        channel: channel as usize,
    })
}

/// Subscription filter covering every topic under `prefix`.
pub fn subscription_filter(prefix: &str) -> String {
    if prefix.ends_with("/#") {
        prefix.to_string()
    } else {
        format!("{}/#", prefix.trim_end_matches('/'))
    }
}

fn parse_number(topic: &str, what: &str, segment: &str) -> Result<i64> {
    segment
        .trim()
        .parse()
        .map_err(|_| CommandError::topic(topic, format!("{what} {segment:?} is not an integer")))
}
