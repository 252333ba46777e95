//! In-process channel sink
//!
//! Broadcast-based sink for single-process operation and tests. No
//! serialization overhead - records are passed directly.

use async_trait::async_trait;
use thermolink_core::TelemetryRecord;
use tokio::sync::broadcast;

use crate::error::PublishError;
use crate::sinks::TelemetrySink;

/// Channel-backed sink publishing records on a broadcast channel
pub struct ChannelSink {
    name: String,
    tx: broadcast::Sender<TelemetryRecord>,
}

impl ChannelSink {
    /// Create a sink/subscriber pair with the given capacity
    pub fn pair(name: impl Into<String>, capacity: usize) -> (Self, ChannelSubscriber) {
        let (tx, rx) = broadcast::channel(capacity);
        (
            Self {
                name: name.into(),
                tx: tx.clone(),
            },
            ChannelSubscriber { rx, _tx: tx },
        )
    }

    /// Get another subscriber for this sink
    pub fn subscribe(&self) -> ChannelSubscriber {
        ChannelSubscriber {
            rx: self.tx.subscribe(),
            _tx: self.tx.clone(),
        }
    }
}

#[async_trait]
impl TelemetrySink for ChannelSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(&self, record: &TelemetryRecord) -> Result<(), PublishError> {
        self.tx
            .send(record.clone())
            .map_err(|_| PublishError::ChannelClosed)?;
        Ok(())
    }

    async fn close(&self) -> Result<(), PublishError> {
        Ok(())
    }
}

/// Receiving side of a [`ChannelSink`]
pub struct ChannelSubscriber {
    rx: broadcast::Receiver<TelemetryRecord>,
    // Keep sender alive to prevent the channel from closing
    _tx: broadcast::Sender<TelemetryRecord>,
}

impl ChannelSubscriber {
    /// Wait for the next published record
    pub async fn next(&mut self) -> Result<TelemetryRecord, PublishError> {
        loop {
            match self.rx.recv().await {
                Ok(record) => return Ok(record),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(PublishError::ChannelClosed);
                }
            }
        }
    }

    /// Try to receive without blocking
    pub fn try_next(&mut self) -> Result<Option<TelemetryRecord>, PublishError> {
        match self.rx.try_recv() {
            Ok(record) => Ok(Some(record)),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Lagged(_)) => Ok(None),
            Err(broadcast::error::TryRecvError::Closed) => Err(PublishError::ChannelClosed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use thermolink_core::SimulationSnapshot;

    fn record() -> TelemetryRecord {
        TelemetryRecord::merged(30.0, 55.0, &SimulationSnapshot::empty(), Utc::now())
    }

    #[tokio::test]
    async fn test_publish_and_receive() {
        let (sink, mut sub) = ChannelSink::pair("test", 10);

        sink.publish(&record()).await.unwrap();

        let received = sub.next().await.unwrap();
        assert_eq!(received.temperature, Some(30.0));
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let (sink, mut sub1) = ChannelSink::pair("test", 10);
        let mut sub2 = sink.subscribe();

        sink.publish(&record()).await.unwrap();

        assert!(sub1.try_next().unwrap().is_some());
        assert!(sub2.try_next().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_try_next_empty() {
        let (_sink, mut sub) = ChannelSink::pair("test", 10);
        assert!(sub.try_next().unwrap().is_none());
    }
}
