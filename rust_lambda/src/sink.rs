use aws_sdk_cloudwatchlogs::Client as CwClient;
use aws_sdk_cloudwatchlogs::types::InputLogEvent;
use chrono::Utc;
use tracing::{debug, warn};

use crate::error::SinkError;

/// Maximum number of events accepted by one `PutLogEvents` call.
pub(crate) const MAX_BATCH_EVENTS: usize = 10_000;

/// Maximum `PutLogEvents` payload, counted as message bytes plus
/// [`EVENT_OVERHEAD_BYTES`] per event.
pub(crate) const MAX_BATCH_BYTES: usize = 1_048_576;

pub(crate) const EVENT_OVERHEAD_BYTES: usize = 26;

/// Destination for forwarded message bodies.
pub(crate) trait LogSink {
    /// Buffers one message at informational severity.
    fn emit(&mut self, message: &str);

    /// Delivers everything buffered so far.
    async fn flush(&mut self) -> Result<(), SinkError>;
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingEvent {
    timestamp: i64,
    message: String,
}

impl PendingEvent {
    fn now(message: &str) -> Self {
        PendingEvent {
            timestamp: Utc::now().timestamp_millis(),
            message: message.to_owned(),
        }
    }

    fn size(&self) -> usize {
        self.message.len() + EVENT_OVERHEAD_BYTES
    }
}

/// Splits buffered events into `PutLogEvents`-sized batches, keeping their order.
///
/// An event larger than [`MAX_BATCH_BYTES`] still gets a batch of its own and
/// is left for CloudWatch to reject.
pub(crate) fn batches(events: Vec<PendingEvent>) -> Vec<Vec<PendingEvent>> {
    let mut batches = Vec::new();
    let mut current: Vec<PendingEvent> = Vec::new();
    let mut current_bytes = 0;

    for event in events {
        let size = event.size();
        if !current.is_empty()
            && (current.len() == MAX_BATCH_EVENTS || current_bytes + size > MAX_BATCH_BYTES)
        {
            batches.push(std::mem::take(&mut current));
            current_bytes = 0;
        }
        current_bytes += size;
        current.push(event);
    }

    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

/// One invocation's handle on a CloudWatch Logs stream.
pub(crate) struct CloudWatchSink {
    client: CwClient,
    log_group: String,
    log_stream: String,
    stream_ready: bool,
    pending: Vec<PendingEvent>,
}

impl CloudWatchSink {
    /// Binds a sink to `log_group`/`log_stream`, creating the group first when
    /// `create_log_group` is set. A group that already exists is not an error.
    pub(crate) async fn connect(
        client: CwClient,
        log_group: &str,
        log_stream: &str,
        create_log_group: bool,
    ) -> Result<Self, SinkError> {
        if create_log_group {
            match client.create_log_group().log_group_name(log_group).send().await {
                Ok(_) => debug!(log_group, "Created log group"),
                Err(err)
                    if err
                        .as_service_error()
                        .is_some_and(|e| e.is_resource_already_exists_exception()) => {}
                Err(err) => return Err(aws_sdk_cloudwatchlogs::Error::from(err).into()),
            }
        }

        Ok(CloudWatchSink {
            client,
            log_group: log_group.to_owned(),
            log_stream: log_stream.to_owned(),
            stream_ready: false,
            pending: Vec::new(),
        })
    }

    // Streams are shared by every invocation in the same time bucket, so
    // another invocation may have created it already.
    async fn ensure_stream(&mut self) -> Result<(), SinkError> {
        if self.stream_ready {
            return Ok(());
        }
        match self
            .client
            .create_log_stream()
            .log_group_name(&self.log_group)
            .log_stream_name(&self.log_stream)
            .send()
            .await
        {
            Ok(_) => debug!(log_stream = %self.log_stream, "Created log stream"),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_already_exists_exception()) => {}
            Err(err) => return Err(aws_sdk_cloudwatchlogs::Error::from(err).into()),
        }
        self.stream_ready = true;
        Ok(())
    }
}

impl LogSink for CloudWatchSink {
    fn emit(&mut self, message: &str) {
        self.pending.push(PendingEvent::now(message));
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        // CloudWatch rejects a whole request containing an empty message.
        let (empty, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|event| event.message.is_empty());
        if !empty.is_empty() {
            debug!(dropped = empty.len(), "Dropped empty messages before delivery");
        }
        if pending.is_empty() {
            return Ok(());
        }
        self.ensure_stream().await?;

        for batch in batches(pending) {
            let events = batch
                .into_iter()
                .map(|event| {
                    InputLogEvent::builder()
                        .timestamp(event.timestamp)
                        .message(event.message)
                        .build()
                })
                .collect::<Result<Vec<_>, _>>()?;
            let count = events.len();

            let output = self
                .client
                .put_log_events()
                .log_group_name(&self.log_group)
                .log_stream_name(&self.log_stream)
                .set_log_events(Some(events))
                .send()
                .await
                .map_err(aws_sdk_cloudwatchlogs::Error::from)?;

            if let Some(rejected) = output.rejected_log_events_info() {
                warn!(?rejected, "CloudWatch Logs rejected part of a batch");
            }
            debug!(count, log_stream = %self.log_stream, "Delivered log events");
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use aws_sdk_cloudwatchlogs::types::error::ServiceUnavailableException;

    use super::LogSink;
    use crate::error::SinkError;

    /// Records what the relay does to its sink.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSink {
        pub emitted: Vec<String>,
        /// Number of emitted messages seen by each flush call.
        pub flushes: Vec<usize>,
        pub fail_flush: bool,
    }

    impl LogSink for RecordingSink {
        fn emit(&mut self, message: &str) {
            self.emitted.push(message.to_owned());
        }

        async fn flush(&mut self) -> Result<(), SinkError> {
            self.flushes.push(self.emitted.len());
            if self.fail_flush {
                return Err(SinkError::Api(
                    aws_sdk_cloudwatchlogs::Error::ServiceUnavailableException(
                        ServiceUnavailableException::builder()
                            .message("flush failed")
                            .build(),
                    ),
                ));
            }
            Ok(())
        }
    }
}
