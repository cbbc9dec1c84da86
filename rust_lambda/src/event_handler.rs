use aws_sdk_cloudwatchlogs::Client as CwClient;
use chrono::Utc;
use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::instrument::WithSubscriber;
use tracing::{Instrument, info, warn};

use crate::config::Config;
use crate::diagnostics;
use crate::envelope::{self, RecordOutcome};
use crate::error::SinkError;
use crate::sink::{CloudWatchSink, LogSink};

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct RelaySummary {
    pub forwarded: usize,
    pub skipped: usize,
}

/// Forwards every SNS message body in `payload` to `sink`, in record order,
/// then flushes the sink exactly once.
///
/// Malformed envelopes and records are reported as warnings and never stop the
/// rest of the batch.
pub(crate) async fn relay<S: LogSink>(
    payload: &Value,
    sink: &mut S,
) -> Result<RelaySummary, SinkError> {
    let mut summary = RelaySummary::default();

    match envelope::records(payload) {
        None => warn!(lambda_event = %payload, "Unexpected event format - missing Records"),
        Some(records) => {
            for record in records {
                match envelope::classify(record) {
                    RecordOutcome::Forward(message) => {
                        sink.emit(message);
                        summary.forwarded += 1;
                    }
                    RecordOutcome::MissingSource => {
                        warn!(%record, "Unexpected record format - missing EventSource");
                        summary.skipped += 1;
                    }
                    RecordOutcome::ForeignSource(source) => {
                        warn!(%source, %record, "Skipping record - EventSource is not aws:sns");
                        summary.skipped += 1;
                    }
                    RecordOutcome::MissingMessage => {
                        warn!(%record, "Unexpected SNS record format - missing Sns.Message");
                        summary.skipped += 1;
                    }
                }
            }
        }
    }

    sink.flush().await?;
    Ok(summary)
}

async fn handle(payload: &Value, logs_client: &CwClient, config: &Config) -> Result<(), Error> {
    let log_stream = config.stream_name(Utc::now())?;
    let mut sink = CloudWatchSink::connect(
        logs_client.clone(),
        &config.log_group,
        &log_stream,
        config.create_log_group,
    )
    .await?;

    let summary = relay(payload, &mut sink).await?;
    info!(
        forwarded = summary.forwarded,
        skipped = summary.skipped,
        log_group = %config.log_group,
        log_stream = %log_stream,
        "Relayed SNS records"
    );
    Ok(())
}

pub(crate) async fn function_handler(
    event: LambdaEvent<Value>,
    logs_client: &CwClient,
) -> Result<(), Error> {
    let LambdaEvent { payload, context } = event;
    let config = Config::from_env()?;

    async {
        let span = tracing::info_span!("invocation", request_id = %context.request_id);
        handle(&payload, logs_client, &config).instrument(span).await
    }
    .with_subscriber(diagnostics::dispatch(config.log_level))
    .await
}
