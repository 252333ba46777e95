use std::time::Duration;

use log::info;
use thermolink_gateway::snapshot::SnapshotReader;
use thermolink_gateway::{InfluxSink, MqttSink, TelemetrySink};
use thermolink_runner::config::GatewayConfig;
use thermolink_runner::error::GatewayError;
use thermolink_runner::gateway_loop::GatewayLoop;
use thermolink_runner::source::SerialLineSource;
use tokio::sync::watch;

fn print_help() {
    eprintln!(
        r#"Thermolink - sensor + simulation telemetry gateway

USAGE:
    thermolink [OPTIONS]

OPTIONS:
    --config <PATH>     Load configuration from JSON file
    --list-ports        List available serial ports and exit
    --help              Print this help message

ENVIRONMENT VARIABLES:
    THERMOLINK_CONFIG       Config file path (overridden by --config)
    THERMOLINK_SERIAL_PORT  Serial port (overrides the config file)
    RUST_LOG                Log level filter

EXAMPLES:
    # Run with config file
    thermolink --config gateway.json

    # Run against a different serial port
    THERMOLINK_SERIAL_PORT=/dev/ttyACM0 thermolink --config gateway.json
"#
    );
}

fn list_ports() {
    match serialport::available_ports() {
        Ok(ports) if ports.is_empty() => println!("No serial ports found"),
        Ok(ports) => {
            println!("Available serial ports:");
            for port in ports {
                match &port.port_type {
                    serialport::SerialPortType::UsbPort(info) => println!(
                        "  {} [USB {:04x}:{:04x}] {}",
                        port.port_name,
                        info.vid,
                        info.pid,
                        info.product.as_deref().unwrap_or("unknown")
                    ),
                    other => println!("  {} [{}]", port.port_name, port_type_name(other)),
                }
            }
        }
        Err(e) => eprintln!("Failed to enumerate serial ports: {}", e),
    }
}

fn port_type_name(port_type: &serialport::SerialPortType) -> &'static str {
    match port_type {
        serialport::SerialPortType::UsbPort(_) => "USB",
        serialport::SerialPortType::BluetoothPort => "Bluetooth",
        serialport::SerialPortType::PciPort => "PCI",
        serialport::SerialPortType::Unknown => "Unknown",
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--list-ports" => {
                list_ports();
                return Ok(());
            }
            "--config" | "-c" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
                config_path = Some(args[i].clone());
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config_path = config_path.or_else(|| std::env::var("THERMOLINK_CONFIG").ok());
    let mut config = match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            GatewayConfig::from_file(&path).map_err(GatewayError::Config)?
        }
        None => {
            info!("Using default configuration");
            GatewayConfig::default()
        }
    };
    if let Ok(port) = std::env::var("THERMOLINK_SERIAL_PORT") {
        config.serial.port = port;
    }
    config.validate().map_err(GatewayError::Config)?;

    // Acquire sessions in order: time-series sink, message sink, serial
    // handle. Any failure releases what was already acquired, then the
    // process exits non-zero.
    let influx = InfluxSink::connect(config.influx.to_settings())
        .await
        .map_err(|error| GatewayError::Sink {
            name: "influxdb",
            error,
        })?;
    info!("Connected to InfluxDB at {}", config.influx.url);

    let mqtt = match MqttSink::connect(config.mqtt.to_settings()).await {
        Ok(sink) => sink,
        Err(error) => {
            let _ = influx.close().await;
            return Err(GatewayError::Sink {
                name: "mqtt",
                error,
            }
            .into());
        }
    };
    info!(
        "Connected to MQTT broker at {}:{}",
        config.mqtt.host, config.mqtt.port
    );

    let source = match SerialLineSource::open(
        &config.serial.port,
        config.serial.baud,
        Duration::from_millis(config.serial.read_timeout_ms),
    ) {
        Ok(source) => source,
        Err(error) => {
            let _ = mqtt.close().await;
            let _ = influx.close().await;
            return Err(GatewayError::Serial(error).into());
        }
    };
    info!(
        "Connected to sensor on {} @ {} baud",
        config.serial.port, config.serial.baud
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    let mut gateway = GatewayLoop::new(
        source,
        SnapshotReader::new(&config.snapshot.path),
        Box::new(influx),
        Box::new(mqtt),
        Duration::from_millis(config.pipeline.debounce_ms),
        shutdown_rx,
    );

    gateway.run().await;
    gateway.shutdown().await;

    Ok(())
}
