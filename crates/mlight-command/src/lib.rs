//! Control messages for the mlight bus.
//!
//! A control message is a topic of the form `<prefix>/<address>/<channel>/set`
//! plus a JSON payload such as `{"state": "ON", "brightness": 30}`. This crate
//! validates both halves completely before anything touches the
//! [`BrightnessTable`](mlight_bus::BrightnessTable); a rejected message leaves
//! the bus state exactly as it was.

pub mod error;
pub mod handler;
pub mod payload;
pub mod topic;

pub use error::{CommandError, Result};
pub use handler::{Applied, CommandHandler, Instruction};
pub use payload::{PayloadValidator, SetPayload, State, SET_PAYLOAD_SCHEMA};
pub use topic::{decode_topic, subscription_filter, Target, MAX_ADDRESS, MIN_ADDRESS};
