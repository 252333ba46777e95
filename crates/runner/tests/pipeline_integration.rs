//! End-to-end pipeline tests: scripted serial lines through the loop to
//! in-process sinks, with a real snapshot file on disk.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use thermolink_core::TelemetryRecord;
use thermolink_gateway::snapshot::SnapshotReader;
use thermolink_gateway::{ChannelSink, PublishError, TelemetrySink};
use thermolink_runner::gateway_loop::GatewayLoop;
use thermolink_runner::source::ScriptedLineSource;
use tokio::sync::watch;

const SNAPSHOT_XML: &str = r#"
    <Simulation>
        <SimulationObject>
            <Type>MaterialStream</Type>
        </SimulationObject>
        <SimulationObject>
            <Type>HeatExchanger</Type>
            <HotSideOutletTemperature>373.15</HotSideOutletTemperature>
            <ColdSideOutletTemperature>343.15</ColdSideOutletTemperature>
            <HeatDuty>500</HeatDuty>
        </SimulationObject>
    </Simulation>
"#;

/// Sink that always fails, for fault-isolation tests
struct FailingSink {
    attempts: AtomicU64,
}

impl FailingSink {
    fn new() -> Self {
        Self {
            attempts: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl TelemetrySink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    async fn publish(&self, _record: &TelemetryRecord) -> Result<(), PublishError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        Err(PublishError::Connect("broker unreachable".to_string()))
    }

    async fn close(&self) -> Result<(), PublishError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_sensor_pair_merged_with_snapshot_and_published() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot_path = dir.path().join("results.xml");
    std::fs::write(&snapshot_path, SNAPSHOT_XML).unwrap();

    let (ts_sink, mut ts_sub) = ChannelSink::pair("time-series", 16);
    let (msg_sink, mut msg_sub) = ChannelSink::pair("messages", 16);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut gateway = GatewayLoop::new(
        ScriptedLineSource::new(["boot: sensor init ok", "T=30.00", "RH=55.00"]),
        SnapshotReader::new(&snapshot_path),
        Box::new(ts_sink),
        Box::new(msg_sink),
        Duration::from_millis(1),
        shutdown_rx,
    );
    gateway.run().await;

    let record = ts_sub.try_next().unwrap().expect("record published");
    assert_eq!(record.temperature, Some(30.00));
    assert_eq!(record.humidity, Some(55.00));
    assert_eq!(record.hot_side_outlet_temp, Some(100.00));
    assert_eq!(record.cold_side_outlet_temp, Some(70.00));
    assert_eq!(record.heat_duty, Some(500.0));

    // Both sinks receive the same record
    let other = msg_sub.try_next().unwrap().expect("record published");
    assert_eq!(other, record);

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_missing_snapshot_does_not_block_emission() {
    let (ts_sink, mut ts_sub) = ChannelSink::pair("time-series", 16);
    let (msg_sink, _msg_sub) = ChannelSink::pair("messages", 16);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut gateway = GatewayLoop::new(
        ScriptedLineSource::new(["T=30.00", "RH=55.00"]),
        SnapshotReader::new("/nonexistent/results.xml"),
        Box::new(ts_sink),
        Box::new(msg_sink),
        Duration::from_millis(1),
        shutdown_rx,
    );
    gateway.run().await;

    let record = ts_sub.try_next().unwrap().expect("record published");
    assert_eq!(record.temperature, Some(30.00));
    assert_eq!(record.hot_side_outlet_temp, None);
    assert_eq!(record.heat_duty, None);
}

#[tokio::test]
async fn test_message_sink_failure_does_not_block_time_series_sink() {
    let (ts_sink, mut ts_sub) = ChannelSink::pair("time-series", 16);
    let failing = Box::new(FailingSink::new());
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    // Two full pairs: the loop must survive the first failed publish and
    // still process the second
    let mut gateway = GatewayLoop::new(
        ScriptedLineSource::new(["T=30.00", "RH=55.00", "T=31.00", "RH=54.00"]),
        SnapshotReader::new("/nonexistent/results.xml"),
        Box::new(ts_sink),
        failing,
        Duration::from_millis(1),
        shutdown_rx,
    );
    gateway.run().await;

    let first = ts_sub.try_next().unwrap().expect("first record");
    let second = ts_sub.try_next().unwrap().expect("second record");
    assert_eq!(first.temperature, Some(30.00));
    assert_eq!(second.temperature, Some(31.00));

    assert_eq!(gateway.stats().records_emitted.load(Ordering::Relaxed), 2);
    assert_eq!(gateway.stats().message_failures.load(Ordering::Relaxed), 2);
    assert_eq!(
        gateway.stats().time_series_failures.load(Ordering::Relaxed),
        0
    );

    gateway.shutdown().await;
}
