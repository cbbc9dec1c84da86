//! Lenient view over the SNS invocation payload.
//!
//! The payload stays a `serde_json::Value` so that a missing `Records` field, a
//! record without `EventSource` and a record without `Sns.Message` can each be
//! reported on their own instead of failing deserialization as a whole.

use serde_json::Value;

/// `EventSource` value carried by SNS notification records.
pub(crate) const SNS_EVENT_SOURCE: &str = "aws:sns";

#[derive(Debug, PartialEq)]
pub(crate) enum RecordOutcome<'a> {
    /// Eligible record; the message body is forwarded as-is.
    Forward(&'a str),
    MissingSource,
    /// `EventSource` is present but is not SNS.
    ForeignSource(&'a Value),
    /// SNS record without a string `Sns.Message`.
    MissingMessage,
}

/// Returns the records of the envelope, or `None` when it has no usable `Records` array.
pub(crate) fn records(payload: &Value) -> Option<&[Value]> {
    payload.get("Records")?.as_array().map(Vec::as_slice)
}

pub(crate) fn classify(record: &Value) -> RecordOutcome<'_> {
    let Some(source) = record.get("EventSource") else {
        return RecordOutcome::MissingSource;
    };
    if source.as_str() != Some(SNS_EVENT_SOURCE) {
        return RecordOutcome::ForeignSource(source);
    }
    match record
        .get("Sns")
        .and_then(|sns| sns.get("Message"))
        .and_then(Value::as_str)
    {
        Some(message) => RecordOutcome::Forward(message),
        None => RecordOutcome::MissingMessage,
    }
}
