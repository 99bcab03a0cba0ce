use std::pin::Pin;
use std::sync::Arc;

use fitfi_core::TelemetrySink;
use fitfi_schema::{ChatMessage, ChatMode, StreamEvent};
use futures_core::Stream;
use tokio_stream::StreamExt;

use crate::markers::{parse_line, ParsedLine};

/// Per-event callback; receives exactly the events the stream yields.
pub type EventObserver = Arc<dyn Fn(&StreamEvent) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct NovaConfig {
    /// Full URL of the Nova streaming endpoint.
    pub base_url: String,
    /// Administrative gate: when false, `stream_chat` short-circuits
    /// to a single error event without a network call.
    pub streaming_enabled: bool,
    /// Anonymous visitor id sent in the identification headers.
    pub visitor_id: String,
}

impl NovaConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            streaming_enabled: true,
            visitor_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_streaming(mut self, enabled: bool) -> Self {
        self.streaming_enabled = enabled;
        self
    }

    pub fn with_visitor_id(mut self, visitor_id: impl Into<String>) -> Self {
        self.visitor_id = visitor_id.into();
        self
    }
}

#[derive(Default)]
struct StreamStats {
    content_events: usize,
    products: usize,
}

/// Client for the Nova streaming chat endpoint.
///
/// Every failure mode surfaces as a protocol event, never as an `Err`
/// or a panic: the consumer's render loop stays uniform regardless of
/// what went wrong. Holds no state across invocations; concurrent
/// streams are independent. Dropping the returned stream aborts the
/// underlying request.
#[derive(Clone)]
pub struct NovaClient {
    client: reqwest::Client,
    config: NovaConfig,
    telemetry: Arc<dyn TelemetrySink>,
}

impl NovaClient {
    pub fn new(config: NovaConfig, telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            config,
            telemetry,
        }
    }

    pub fn stream_chat(
        &self,
        mode: ChatMode,
        messages: Vec<ChatMessage>,
    ) -> Pin<Box<dyn Stream<Item = StreamEvent> + Send>> {
        self.stream_chat_observed(mode, messages, None)
    }

    /// Like `stream_chat`, but additionally forwards every event to
    /// `observer` before it is yielded.
    pub fn stream_chat_observed(
        &self,
        mode: ChatMode,
        messages: Vec<ChatMessage>,
        observer: Option<EventObserver>,
    ) -> Pin<Box<dyn Stream<Item = StreamEvent> + Send>> {
        let client = self.client.clone();
        let config = self.config.clone();
        let telemetry = Arc::clone(&self.telemetry);

        Box::pin(async_stream::stream! {
            if !config.streaming_enabled {
                tracing::debug!("nova streaming disabled by configuration");
                telemetry.track(
                    "nova:stream_error",
                    serde_json::json!({"reason": "streaming_disabled"}),
                );
                let event = StreamEvent::Error;
                notify(&observer, &event);
                yield event;
                return;
            }

            // Validate before spending a connection; a rejected payload
            // would be indistinguishable from a server-side failure.
            if messages.is_empty() || messages.iter().any(ChatMessage::is_blank) {
                tracing::warn!(
                    count = messages.len(),
                    "rejecting chat turn with empty or blank messages"
                );
                telemetry.track(
                    "nova:stream_error",
                    serde_json::json!({"reason": "invalid_messages"}),
                );
                let event = StreamEvent::Error;
                notify(&observer, &event);
                yield event;
                return;
            }

            telemetry.track(
                "nova:stream_start",
                serde_json::json!({"mode": mode.as_str(), "messages": messages.len()}),
            );

            let body = serde_json::json!({"messages": messages, "mode": mode});
            let response = client
                .post(&config.base_url)
                .header("content-type", "application/json")
                .header("x-fitfi-tier", "visitor")
                .header("x-fitfi-uid", &config.visitor_id)
                .json(&body)
                .send()
                .await;

            let response = match response {
                Ok(response) => response,
                Err(error) => {
                    tracing::warn!(%error, "nova request failed");
                    telemetry.track(
                        "nova:stream_error",
                        serde_json::json!({"reason": "request_failed"}),
                    );
                    let event = StreamEvent::Error;
                    notify(&observer, &event);
                    yield event;
                    return;
                }
            };

            let status = response.status();
            if !status.is_success() {
                tracing::warn!(%status, "nova returned error status");
                telemetry.track(
                    "nova:stream_error",
                    serde_json::json!({"reason": "http_status", "status": status.as_u16()}),
                );
                let event = StreamEvent::Error;
                notify(&observer, &event);
                yield event;
                return;
            }

            let byte_stream = response.bytes_stream();
            tokio::pin!(byte_stream);

            // Bytes pending UTF-8 completion, then decoded text pending
            // a newline. Both carry over across chunk boundaries.
            let mut pending = Vec::new();
            let mut text = String::new();
            let mut stats = StreamStats::default();

            loop {
                let chunk = match byte_stream.next().await {
                    Some(Ok(chunk)) => chunk,
                    Some(Err(error)) => {
                        tracing::warn!(%error, "nova stream read failed");
                        telemetry.track(
                            "nova:stream_error",
                            serde_json::json!({"reason": "read_failed"}),
                        );
                        let event = StreamEvent::Error;
                        notify(&observer, &event);
                        yield event;
                        return;
                    }
                    None => break,
                };

                pending.extend_from_slice(&chunk);
                drain_utf8(&mut pending, &mut text);

                while let Some(newline) = text.find('\n') {
                    let line: String = text.drain(..=newline).collect();
                    let line = line.trim_end_matches(['\n', '\r']);
                    if let Some(event) = line_event(line, &telemetry, &mut stats) {
                        notify(&observer, &event);
                        yield event;
                    }
                }
            }

            // A final data line without a trailing newline still counts.
            if !text.is_empty() {
                let line = text.trim_end_matches('\r').to_string();
                if let Some(event) = line_event(&line, &telemetry, &mut stats) {
                    notify(&observer, &event);
                    yield event;
                }
            }

            telemetry.track(
                "nova:stream_done",
                serde_json::json!({
                    "content_events": stats.content_events,
                    "products": stats.products,
                }),
            );
            let event = StreamEvent::Done;
            notify(&observer, &event);
            yield event;
        })
    }
}

fn notify(observer: &Option<EventObserver>, event: &StreamEvent) {
    if let Some(observer) = observer {
        observer(event);
    }
}

/// Map one complete line to at most one event. A malformed embedded
/// block yields a recoverable error event; framing lines yield nothing.
fn line_event(
    line: &str,
    telemetry: &Arc<dyn TelemetrySink>,
    stats: &mut StreamStats,
) -> Option<StreamEvent> {
    match parse_line(line) {
        ParsedLine::NotData | ParsedLine::Empty => None,
        ParsedLine::Content(token) => {
            stats.content_events += 1;
            Some(StreamEvent::Content { text: token })
        }
        ParsedLine::Products(products) => {
            stats.products += products.len();
            telemetry.track(
                "nova:products",
                serde_json::json!({"count": products.len()}),
            );
            Some(StreamEvent::Products { products })
        }
        ParsedLine::Malformed => {
            telemetry.track("nova:parse_error", serde_json::Value::Null);
            Some(StreamEvent::Error)
        }
    }
}

/// Move as much of `pending` into `out` as decodes cleanly. A valid
/// multi-byte suffix split by a chunk boundary stays pending; actually
/// invalid bytes become U+FFFD so a corrupt chunk cannot stall the
/// stream.
fn drain_utf8(pending: &mut Vec<u8>, out: &mut String) {
    loop {
        match std::str::from_utf8(pending) {
            Ok(valid) => {
                out.push_str(valid);
                pending.clear();
                return;
            }
            Err(error) => {
                let valid_up_to = error.valid_up_to();
                if let Ok(valid) = std::str::from_utf8(&pending[..valid_up_to]) {
                    out.push_str(valid);
                }
                match error.error_len() {
                    Some(invalid_len) => {
                        out.push(char::REPLACEMENT_CHARACTER);
                        pending.drain(..valid_up_to + invalid_len);
                    }
                    None => {
                        // Incomplete trailing sequence; wait for more bytes.
                        pending.drain(..valid_up_to);
                        return;
                    }
                }
            }
        }
    }
}
