//! Bounded body capture.
//!
//! A body is read until it ends, fails, or passes the capture limit. The
//! bytes read so far are kept for logging and the body is rebuilt so the
//! receiver sees exactly what the sender produced, including a
//! mid-stream error.

use axum::body::{Body, Bytes};
use futures_util::{stream, StreamExt};

/// Appended to a logged body that was cut at the capture limit.
pub const TRUNCATED_MARKER: &str = "[truncated]";

/// Appended to a logged body whose stream failed before it ended.
pub const INCOMPLETE_MARKER: &str = "[incomplete]";

/// How reading a body for logging ended.
#[derive(Debug)]
pub enum CaptureOutcome {
    Complete,
    /// More than the limit was available; the rest was not read.
    Truncated,
    /// The stream failed; the error is replayed to the receiver.
    Failed(String),
}

pub struct CapturedBody {
    /// The full body, for the next receiver.
    pub body: Body,
    /// At most `limit` bytes, for logging.
    pub bytes: Bytes,
    pub outcome: CaptureOutcome,
}

impl CapturedBody {
    /// Captured bytes as text, marked when they are not the whole body.
    pub fn logged_text(&self) -> String {
        let mut text = String::from_utf8_lossy(&self.bytes).into_owned();
        let marker = match self.outcome {
            CaptureOutcome::Complete => return text,
            CaptureOutcome::Truncated => TRUNCATED_MARKER,
            CaptureOutcome::Failed(_) => INCOMPLETE_MARKER,
        };
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(marker);
        text
    }
}

enum ReadEnd {
    Complete,
    Truncated,
    Failed(axum::Error),
}

/// Read up to `limit` bytes of `body` for logging without consuming it.
pub async fn capture_body(body: Body, limit: usize) -> CapturedBody {
    let mut data = body.into_data_stream();
    let mut chunks: Vec<Bytes> = Vec::new();
    let mut read = 0usize;

    let end = loop {
        if read > limit {
            break ReadEnd::Truncated;
        }
        match data.next().await {
            Some(Ok(chunk)) => {
                read += chunk.len();
                chunks.push(chunk);
            }
            Some(Err(e)) => break ReadEnd::Failed(e),
            None => break ReadEnd::Complete,
        }
    };

    let mut kept = Vec::with_capacity(read.min(limit));
    for chunk in &chunks {
        let room = limit - kept.len();
        if room == 0 {
            break;
        }
        kept.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }
    let bytes = Bytes::from(kept);

    match end {
        ReadEnd::Complete => CapturedBody {
            body: Body::from(bytes.clone()),
            bytes,
            outcome: CaptureOutcome::Complete,
        },
        ReadEnd::Truncated => {
            let replay = stream::iter(chunks.into_iter().map(Ok::<Bytes, axum::Error>)).chain(data);
            CapturedBody {
                body: Body::from_stream(replay),
                bytes,
                outcome: CaptureOutcome::Truncated,
            }
        }
        ReadEnd::Failed(e) => {
            let message = e.to_string();
            let replay = chunks.into_iter().map(Ok).chain(std::iter::once(Err(e)));
            CapturedBody {
                body: Body::from_stream(stream::iter(replay)),
                bytes,
                outcome: CaptureOutcome::Failed(message),
            }
        }
    }
}
