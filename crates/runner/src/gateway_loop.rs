//! Gateway orchestration loop
//!
//! Single logical stream of control: read one line, parse, accumulate, and
//! on a completed pair read a fresh snapshot, merge, and publish to both
//! sinks before the next read. Waiting for both publishes is the system's
//! sole backpressure mechanism - a slow sink throttles ingestion instead of
//! queueing unpublished records. There is no retry: a failed publish is
//! logged and that reading is lost.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::{debug, error, info};
use thermolink_gateway::ingest::{LineParser, RecordAccumulator};
use thermolink_gateway::sinks::TelemetrySink;
use thermolink_gateway::snapshot::SnapshotReader;
use tokio::sync::watch;

use crate::source::{LineSource, SourceError};

/// Counters for the optional operator-facing tallies
///
/// Publish failures are deliberately not alerted or retried; the counters
/// are reported once in the shutdown log.
#[derive(Debug, Default)]
pub struct LoopStats {
    pub records_emitted: AtomicU64,
    pub time_series_failures: AtomicU64,
    pub message_failures: AtomicU64,
}

/// Orchestrates ingestion, merge, and dual-sink publication
///
/// Owns the line source, the pipeline state, and both sink sessions. The
/// accumulator has exactly one writer and one reader (this loop), so it
/// needs no locking.
pub struct GatewayLoop<S: LineSource> {
    source: S,
    parser: LineParser,
    accumulator: RecordAccumulator,
    snapshot_reader: SnapshotReader,
    time_series_sink: Box<dyn TelemetrySink>,
    message_sink: Box<dyn TelemetrySink>,
    debounce: Duration,
    shutdown: watch::Receiver<bool>,
    stats: LoopStats,
}

impl<S: LineSource> GatewayLoop<S> {
    pub fn new(
        source: S,
        snapshot_reader: SnapshotReader,
        time_series_sink: Box<dyn TelemetrySink>,
        message_sink: Box<dyn TelemetrySink>,
        debounce: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            source,
            parser: LineParser::new(),
            accumulator: RecordAccumulator::new(),
            snapshot_reader,
            time_series_sink,
            message_sink,
            debounce,
            shutdown,
            stats: LoopStats::default(),
        }
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    /// Run until shutdown is requested or the source closes
    ///
    /// Steady-state faults (unrecognized lines, missing snapshot, sink
    /// outages, transient read errors) are contained within their iteration;
    /// nothing here terminates the loop except the shutdown flag and a
    /// closed source.
    pub async fn run(&mut self) {
        info!("Gateway loop started");
        loop {
            // Cancellation is observed once per iteration; the source's own
            // read timeout bounds how long that can take.
            if *self.shutdown.borrow() {
                info!("Shutdown requested, stopping gateway loop");
                break;
            }

            match self.source.next_line().await {
                Ok(None) => continue,
                Ok(Some(line)) => {
                    if line.is_empty() {
                        continue;
                    }
                    debug!("Serial: {}", line);
                    for sample in self.parser.parse(&line) {
                        self.accumulator.update(&sample);
                    }
                }
                Err(SourceError::Closed) => {
                    info!("Line source closed, stopping gateway loop");
                    break;
                }
                Err(e) => {
                    error!("Serial read failed: {}", e);
                    // Avoid hot-spinning on a persistently failing handle
                    tokio::time::sleep(self.debounce).await;
                    continue;
                }
            }

            if self.accumulator.is_ready() {
                self.emit_and_publish().await;
                tokio::time::sleep(self.debounce).await;
            }
        }
    }

    /// Read a fresh snapshot, emit the completed record, publish to both sinks
    async fn emit_and_publish(&mut self) {
        let snapshot = self.snapshot_reader.read();
        let record = match self.accumulator.try_emit(&snapshot) {
            Some(record) => record,
            None => return,
        };

        info!(
            "Emitting record: temperature={:?} humidity={:?} simulation_fields={}",
            record.temperature,
            record.humidity,
            record.fields().len() - 2
        );

        // Independent publishes, dispatched concurrently and both awaited
        // before the next read. Neither is rolled back if the other fails.
        let (time_series_result, message_result) = tokio::join!(
            self.time_series_sink.publish(&record),
            self.message_sink.publish(&record),
        );
        self.stats.records_emitted.fetch_add(1, Ordering::Relaxed);

        if let Err(e) = time_series_result {
            self.stats.time_series_failures.fetch_add(1, Ordering::Relaxed);
            error!(
                "Publish to {} failed for record emitted at {}: {}",
                self.time_series_sink.name(),
                record.emitted_at,
                e
            );
        }
        if let Err(e) = message_result {
            self.stats.message_failures.fetch_add(1, Ordering::Relaxed);
            error!(
                "Publish to {} failed for record emitted at {}: {}",
                self.message_sink.name(),
                record.emitted_at,
                e
            );
        }
    }

    /// Release all resources in reverse-acquisition order
    pub async fn shutdown(self) {
        info!(
            "Gateway stopped: {} records emitted, {} time-series failures, {} message failures",
            self.stats.records_emitted.load(Ordering::Relaxed),
            self.stats.time_series_failures.load(Ordering::Relaxed),
            self.stats.message_failures.load(Ordering::Relaxed)
        );

        // Serial handle was acquired last; drop it first
        drop(self.source);

        if let Err(e) = self.message_sink.close().await {
            error!("Failed to close {} sink: {}", self.message_sink.name(), e);
        }
        if let Err(e) = self.time_series_sink.close().await {
            error!(
                "Failed to close {} sink: {}",
                self.time_series_sink.name(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ScriptedLineSource;
    use thermolink_gateway::ChannelSink;

    fn test_loop(
        lines: &[&str],
    ) -> (
        GatewayLoop<ScriptedLineSource>,
        thermolink_gateway::ChannelSubscriber,
        thermolink_gateway::ChannelSubscriber,
    ) {
        let (ts_sink, ts_sub) = ChannelSink::pair("time-series", 16);
        let (msg_sink, msg_sub) = ChannelSink::pair("messages", 16);
        let (_tx, rx) = watch::channel(false);

        let gateway = GatewayLoop::new(
            ScriptedLineSource::new(lines.iter().copied()),
            SnapshotReader::new("/nonexistent/results.xml"),
            Box::new(ts_sink),
            Box::new(msg_sink),
            Duration::from_millis(1),
            rx,
        );
        (gateway, ts_sub, msg_sub)
    }

    #[tokio::test]
    async fn test_completed_pair_publishes_to_both_sinks() {
        let (mut gateway, mut ts_sub, mut msg_sub) = test_loop(&["T=23.50", "RH=60.10"]);

        gateway.run().await;

        let ts_record = ts_sub.try_next().unwrap().unwrap();
        let msg_record = msg_sub.try_next().unwrap().unwrap();
        assert_eq!(ts_record.temperature, Some(23.50));
        assert_eq!(msg_record.humidity, Some(60.10));
        assert_eq!(gateway.stats().records_emitted.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_unrecognized_lines_do_not_emit() {
        let (mut gateway, mut ts_sub, _msg_sub) =
            test_loop(&["boot ok", "T=23", "", "RH=60.10"]);

        gateway.run().await;

        // Humidity alone is only half a pair
        assert!(ts_sub.try_next().unwrap().is_none());
        assert_eq!(gateway.stats().records_emitted.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_one_pair_cannot_emit_twice() {
        let (mut gateway, mut ts_sub, _msg_sub) =
            test_loop(&["T=23.50 RH=60.10", "T=25.00"]);

        gateway.run().await;

        assert!(ts_sub.try_next().unwrap().is_some());
        assert!(ts_sub.try_next().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_shutdown_flag_stops_loop_before_reading() {
        let (ts_sink, _ts_sub) = ChannelSink::pair("time-series", 16);
        let (msg_sink, _msg_sub) = ChannelSink::pair("messages", 16);
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let mut gateway = GatewayLoop::new(
            ScriptedLineSource::new(["T=23.50", "RH=60.10"]),
            SnapshotReader::new("/nonexistent/results.xml"),
            Box::new(ts_sink),
            Box::new(msg_sink),
            Duration::from_millis(1),
            rx,
        );

        gateway.run().await;
        assert_eq!(gateway.stats().records_emitted.load(Ordering::Relaxed), 0);
        gateway.shutdown().await;
    }
}
