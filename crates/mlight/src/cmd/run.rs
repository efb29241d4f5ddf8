use std::sync::mpsc::{self, Sender};
use std::thread;

use mlight_bus::{BusConfig, BusError, BusHandle};
use mlight_command::{subscription_filter, CommandHandler};
use mlight_transport::SerialConfig;
use tracing::{error, info};

use crate::cmd::{parse_duration, RunArgs};
use crate::exit::{
    bus_error, command_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS,
};
use crate::mqtt::{self, MqttSettings};

/// Why the bridge is stopping.
enum Shutdown {
    Interrupted,
    BusFailed(BusError),
    MqttStopped(CliError),
}

pub fn run(args: RunArgs) -> CliResult<i32> {
    let config = BusConfig {
        send_interval: parse_duration(&args.send_interval, false)?,
        byte_delay: parse_duration(&args.byte_delay, true)?,
        default_brightness: args.default_brightness,
        dump_interval: parse_duration(&args.dump_interval, false)?,
    };
    let settings = MqttSettings {
        host: args.mqtt_host,
        port: args.mqtt_port,
        client_id: args.client_id,
        username: args.mqtt_username,
        password: args.mqtt_password,
        keep_alive: parse_duration(&args.keep_alive, false)?,
    };

    let serial = SerialConfig::new(&args.device).with_baud_rate(args.baud_rate);
    let stream =
        mlight_transport::open(&serial).map_err(|err| transport_error("open failed", err))?;

    let bus = if args.dump_state {
        mlight_bus::spawn_dumper(stream, &config)
    } else {
        mlight_bus::spawn(stream, &config)
    }
    .map_err(|err| bus_error("bus start failed", err))?;

    let handler = CommandHandler::new(bus.table().clone())
        .map_err(|err| command_error("handler setup failed", err))?
        .with_prefix(args.topic_prefix.as_str());
    let filter = subscription_filter(&args.topic_prefix);

    let (events, shutdown) = mpsc::channel();
    install_ctrlc_handler(events.clone())?;
    watch_bus(bus, events.clone())?;
    spawn_subscriber(settings, filter, handler, events)?;

    info!("listening for control events");
    match shutdown.recv() {
        Ok(Shutdown::Interrupted) => {
            info!("interrupted, shutting down");
            Ok(SUCCESS)
        }
        Ok(Shutdown::BusFailed(err)) => {
            error!(error = %err, "bus transmitter stopped");
            Err(bus_error("bus transmitter stopped", err))
        }
        Ok(Shutdown::MqttStopped(err)) => {
            error!(error = %err, "mqtt subscriber stopped");
            Err(err)
        }
        Err(_) => Err(CliError::new(INTERNAL, "all supervised threads are gone")),
    }
}

fn watch_bus(bus: BusHandle, events: Sender<Shutdown>) -> CliResult<()> {
    thread::Builder::new()
        .name("mlight-bus-watch".into())
        .spawn(move || {
            let _ = events.send(Shutdown::BusFailed(bus.join()));
        })
        .map(drop)
        .map_err(|err| CliError::new(INTERNAL, format!("failed to spawn bus watcher: {err}")))
}

fn spawn_subscriber(
    settings: MqttSettings,
    filter: String,
    handler: CommandHandler,
    events: Sender<Shutdown>,
) -> CliResult<()> {
    thread::Builder::new()
        .name("mlight-mqtt".into())
        .spawn(move || {
            let err = mqtt::listen(&settings, &filter, &handler);
            let _ = events.send(Shutdown::MqttStopped(err));
        })
        .map(drop)
        .map_err(|err| CliError::new(INTERNAL, format!("failed to spawn mqtt thread: {err}")))
}

fn install_ctrlc_handler(events: Sender<Shutdown>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        let _ = events.send(Shutdown::Interrupted);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
