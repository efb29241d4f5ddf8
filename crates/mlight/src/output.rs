use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use mlight_frame::BusMessage;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput {
    address: u8,
    channels: [u8; mlight_frame::CHANNEL_COUNT],
    nonce: u8,
    all_off: bool,
    wire: String,
    timestamp: String,
}

impl MessageOutput {
    fn new(message: &BusMessage) -> Self {
        Self {
            address: message.address,
            channels: message.channels,
            nonce: message.nonce,
            all_off: message.is_all_off(),
            wire: hex(&message.encode()),
            timestamp: now_unix_seconds(),
        }
    }
}

pub fn print_message(message: &BusMessage, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = MessageOutput::new(message);
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ADDRESS", "CH0", "CH1", "CH2", "CH3", "NONCE", "WIRE"]);
            let mut row = vec![message.address.to_string()];
            row.extend(message.channels.iter().map(u8::to_string));
            row.push(message.nonce.to_string());
            row.push(hex(&message.encode()));
            table.add_row(row);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "address={} channels={:?} nonce={} wire={}",
                message.address,
                message.channels,
                message.nonce,
                hex(&message.encode())
            );
        }
        OutputFormat::Raw => {
            print_raw(&message.encode());
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn hex(data: &[u8]) -> String {
    data.iter()
        .map(|byte| format!("{byte:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
