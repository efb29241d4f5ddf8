use std::thread;
use std::time::Duration;

use mlight_command::CommandHandler;
use rumqttc::{Client, Event, MqttOptions, Packet, QoS};
use tracing::{debug, error, info, warn};

use crate::exit::{CliError, FAILURE};

/// Pending outgoing requests the client may queue.
const REQUEST_CAPACITY: usize = 10;

/// Pause after a connection error before the event loop reconnects.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive: Duration,
}

impl MqttSettings {
    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(self.keep_alive);
        if let Some(username) = &self.username {
            options.set_credentials(username, self.password.as_deref().unwrap_or_default());
        }
        options
    }
}

/// Connect to the broker and feed every publish under `filter` to `handler`.
///
/// Runs until the client's request channel is gone and returns why it
/// stopped. Connection errors are logged and retried; the subscription is
/// re-queued on every (re)connect.
pub fn listen(settings: &MqttSettings, filter: &str, handler: &CommandHandler) -> CliError {
    let (client, mut connection) = Client::new(settings.options(), REQUEST_CAPACITY);
    info!(
        host = %settings.host,
        port = settings.port,
        client_id = %settings.client_id,
        "connecting to mqtt broker"
    );

    let mut pending_subscribe = false;
    for notification in connection.iter() {
        match notification {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!(filter, "connected, subscribing");
                pending_subscribe = true;
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                dispatch(handler, &publish.topic, &publish.payload);
            }
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, "mqtt connection error, reconnecting");
                thread::sleep(RECONNECT_DELAY);
            }
        }

        if pending_subscribe {
            pending_subscribe = !try_subscribe(&client, filter);
        }
    }

    CliError::new(FAILURE, "mqtt event loop ended")
}

/// Queue the subscription without blocking the loop that drains the queue.
///
/// Returns false when the request queue is full; the caller retries after
/// the next event.
fn try_subscribe(client: &Client, filter: &str) -> bool {
    match client.try_subscribe(filter, QoS::AtMostOnce) {
        Ok(()) => true,
        Err(err) => {
            debug!(filter, error = %err, "subscribe not queued yet, retrying");
            false
        }
    }
}

/// Apply one control message; bad messages are logged and dropped.
fn dispatch(handler: &CommandHandler, topic: &str, payload: &[u8]) {
    match handler.handle(topic, payload) {
        Ok(applied) => debug!(
            address = applied.target.address,
            channel = applied.target.channel,
            stored = applied.stored,
            "control message applied"
        ),
        Err(err) if err.is_invalid_message() => {
            warn!(topic, error = %err, "ignoring control message");
        }
        Err(err) => error!(topic, error = %err, "failed to apply control message"),
    }
}

#[cfg(test)]
mod tests {
    use mlight_bus::BrightnessTable;

    use super::*;

    fn handler() -> CommandHandler {
        CommandHandler::new(BrightnessTable::default())
            .expect("schema compiles")
            .with_prefix("mlight")
    }

    #[test]
    fn dispatch_applies_valid_message() {
        let handler = handler();
        dispatch(
            &handler,
            "mlight/7/2/set",
            br#"{"state":"ON","brightness":40}"#,
        );
        assert_eq!(handler.table().get(7), Some([0, 0, 40, 0]));
    }

    #[test]
    fn dispatch_drops_invalid_message() {
        let handler = handler();
        dispatch(&handler, "mlight/7/2/set", b"not json");
        dispatch(&handler, "other/7/2/set", br#"{"state":"ON"}"#);
        assert!(handler.table().is_empty());
    }

    #[test]
    fn subscribe_does_not_block_on_full_queue() {
        let settings = MqttSettings {
            host: "127.0.0.1".into(),
            port: 1883,
            client_id: "mlight-test".into(),
            username: None,
            password: None,
            keep_alive: Duration::from_secs(30),
        };
        // Nothing drains the queue, so the second request finds it full.
        let (client, _connection) = Client::new(settings.options(), 1);
        assert!(try_subscribe(&client, "mlight/#"));
        assert!(!try_subscribe(&client, "mlight/#"));
    }
}
