//! Realtime websocket channel with bounded reconnect.
//!
//! The gateway pushes update hints over a per-user socket. The client
//! authenticates with the session token right after the handshake, keeps
//! the link alive with periodic pings, and reconnects with exponential
//! backoff on abnormal closes. A normal close (code 1000) is final.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{protocol::frame::coding::CloseCode, Message},
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, warn};

use crate::infra::config::RealtimeConfig;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Events surfaced to the consumer of the realtime channel.
#[derive(Debug, Clone)]
pub enum RealtimeEvent {
    Connected,
    Disconnected,
    /// A parsed server frame; consumers decide what to refresh from it.
    Frame(serde_json::Value),
    Error(String),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame {
    Auth { token: String },
    Ping,
}

#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("maximum reconnection attempts reached")]
    AttemptsExhausted,
    #[cfg_attr(not(test), allow(dead_code))]
    #[error("connection not available")]
    NotAvailable,
    #[error("connection timeout after {0:?}")]
    Timeout(Duration),
    #[error("websocket error: {0}")]
    WebSocket(String),
}

struct Inner {
    url: String,
    token: Option<String>,
    max_attempts: u32,
    connect_timeout: Duration,
    ping_interval: Duration,
    base_delay: Duration,
    max_delay: Duration,
    state: RwLock<ConnectionState>,
    attempts: AtomicU32,
    writer: Mutex<Option<WsWriter>>,
    events: mpsc::UnboundedSender<RealtimeEvent>,
    read_task: Mutex<Option<JoinHandle<()>>>,
    ping_task: Mutex<Option<JoinHandle<()>>>,
    reconnect_task: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Clone)]
pub struct RealtimeClient {
    inner: Arc<Inner>,
}

impl RealtimeClient {
    pub fn new(
        url: String,
        token: Option<String>,
        config: &RealtimeConfig,
    ) -> (Self, mpsc::UnboundedReceiver<RealtimeEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let client = Self {
            inner: Arc::new(Inner {
                url,
                token,
                max_attempts: config.max_reconnect_attempts,
                connect_timeout: Duration::from_millis(config.connect_timeout_ms),
                ping_interval: Duration::from_millis(config.ping_interval_ms),
                base_delay: Duration::from_millis(config.base_reconnect_delay_ms),
                max_delay: Duration::from_millis(config.max_reconnect_delay_ms),
                state: RwLock::new(ConnectionState::Disconnected),
                attempts: AtomicU32::new(0),
                writer: Mutex::new(None),
                events,
                read_task: Mutex::new(None),
                ping_task: Mutex::new(None),
                reconnect_task: Mutex::new(None),
            }),
        };
        (client, receiver)
    }

    pub async fn state(&self) -> ConnectionState {
        *self.inner.state.read().await
    }

    pub async fn connect(&self) -> Result<(), RealtimeError> {
        if self.inner.attempts.load(Ordering::SeqCst) >= self.inner.max_attempts {
            self.emit(RealtimeEvent::Error(
                "maximum reconnection attempts reached".to_owned(),
            ));
            return Err(RealtimeError::AttemptsExhausted);
        }

        let url = url::Url::parse(&self.inner.url)
            .map_err(|error| RealtimeError::WebSocket(error.to_string()))?;
        if url.scheme() != "ws" && url.scheme() != "wss" {
            return Err(RealtimeError::WebSocket(format!(
                "URL must use ws:// or wss:// scheme, got: {}",
                url.scheme()
            )));
        }

        self.stop_tasks().await;
        *self.inner.state.write().await = ConnectionState::Connecting;

        let stream = match timeout(
            self.inner.connect_timeout,
            connect_async(self.inner.url.as_str()),
        )
        .await
        {
            Err(_) => {
                let error = RealtimeError::Timeout(self.inner.connect_timeout);
                self.handle_connect_failure(&error).await;
                return Err(error);
            }
            Ok(Err(source)) => {
                let error = RealtimeError::WebSocket(source.to_string());
                self.handle_connect_failure(&error).await;
                return Err(error);
            }
            Ok(Ok((stream, _response))) => stream,
        };

        let (mut writer, reader) = stream.split();

        if let Some(token) = &self.inner.token {
            let frame = ClientFrame::Auth {
                token: token.clone(),
            };
            if let Err(source) = writer.send(frame_message(&frame)).await {
                let error = RealtimeError::WebSocket(source.to_string());
                self.handle_connect_failure(&error).await;
                return Err(error);
            }
        }

        *self.inner.writer.lock().await = Some(writer);
        self.inner.attempts.store(0, Ordering::SeqCst);
        *self.inner.state.write().await = ConnectionState::Connected;
        self.emit(RealtimeEvent::Connected);
        debug!(url = %self.inner.url, "realtime channel connected");

        *self.inner.ping_task.lock().await = Some(self.spawn_ping_task());
        *self.inner.read_task.lock().await = Some(self.spawn_read_task(reader));
        Ok(())
    }

    /// Sends a frame over the live socket. Fails without queuing when the
    /// channel is not connected. No caller upstream yet; the gateway does
    /// not read client frames beyond auth and ping.
    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn send(&self, payload: &serde_json::Value) -> Result<(), RealtimeError> {
        if *self.inner.state.read().await != ConnectionState::Connected {
            return Err(RealtimeError::NotAvailable);
        }

        let mut writer = self.inner.writer.lock().await;
        let writer = writer.as_mut().ok_or(RealtimeError::NotAvailable)?;
        let text =
            serde_json::to_string(payload).map_err(|error| RealtimeError::WebSocket(error.to_string()))?;
        writer
            .send(Message::Text(text))
            .await
            .map_err(|error| RealtimeError::WebSocket(error.to_string()))
    }

    /// Closes the channel for good: pins the attempt counter so pending
    /// and future reconnects give up immediately.
    pub async fn disconnect(&self) {
        self.inner
            .attempts
            .store(self.inner.max_attempts, Ordering::SeqCst);
        self.stop_tasks().await;

        if let Some(mut writer) = self.inner.writer.lock().await.take() {
            if let Err(error) = writer.send(Message::Close(None)).await {
                debug!(error = %error, "close frame not delivered");
            }
        }

        *self.inner.state.write().await = ConnectionState::Disconnected;
        self.emit(RealtimeEvent::Disconnected);
    }

    fn spawn_ping_task(&self) -> JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(client.inner.ping_interval);
            // the first tick fires immediately, right after the auth frame
            interval.tick().await;
            loop {
                interval.tick().await;
                let mut writer = client.inner.writer.lock().await;
                let Some(writer) = writer.as_mut() else {
                    break;
                };
                if let Err(error) = writer.send(frame_message(&ClientFrame::Ping)).await {
                    warn!(error = %error, "ping failed");
                    break;
                }
            }
        })
    }

    fn spawn_read_task(
        &self,
        mut reader: futures_util::stream::SplitStream<WsStream>,
    ) -> JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move {
            let mut reconnect = false;
            while let Some(frame) = reader.next().await {
                match frame {
                    Ok(Message::Text(text)) => match parse_frame(&text) {
                        Some(value) => client.emit(RealtimeEvent::Frame(value)),
                        None => warn!("dropping malformed realtime frame"),
                    },
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                    Ok(Message::Close(close_frame)) => {
                        let normal = close_frame
                            .as_ref()
                            .map(|frame| frame.code == CloseCode::Normal)
                            .unwrap_or(true);
                        if !normal {
                            warn!(?close_frame, "server closed the channel abnormally");
                            reconnect = true;
                        }
                        break;
                    }
                    Ok(_) => {}
                    Err(error) => {
                        warn!(error = %error, "realtime read error");
                        client.emit(RealtimeEvent::Error(error.to_string()));
                        reconnect = true;
                        break;
                    }
                }
            }

            *client.inner.writer.lock().await = None;
            *client.inner.state.write().await = ConnectionState::Disconnected;
            client.emit(RealtimeEvent::Disconnected);
            if reconnect {
                client.schedule_reconnect().await;
            }
        })
    }

    async fn handle_connect_failure(&self, error: &RealtimeError) {
        *self.inner.state.write().await = ConnectionState::Disconnected;
        self.emit(RealtimeEvent::Error(error.to_string()));
        self.schedule_reconnect().await;
    }

    async fn schedule_reconnect(&self) {
        let attempt = self.inner.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt > self.inner.max_attempts {
            self.emit(RealtimeEvent::Error(
                "maximum reconnection attempts reached".to_owned(),
            ));
            return;
        }

        let delay = reconnect_delay(self.inner.base_delay, self.inner.max_delay, attempt);
        debug!(attempt, ?delay, "scheduling realtime reconnect");

        let client = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // drop our own handle first so connect's task teardown does
            // not abort the very task running it
            *client.inner.reconnect_task.lock().await = None;
            client.reconnect().await;
        });
        *self.inner.reconnect_task.lock().await = Some(handle);
    }

    // Boxed so the connect/reconnect cycle does not build an infinitely
    // sized future type.
    fn reconnect(&self) -> futures_util::future::BoxFuture<'_, ()> {
        Box::pin(async move {
            if let Err(error) = self.connect().await {
                debug!(error = %error, "reconnect attempt failed");
            }
        })
    }

    async fn stop_tasks(&self) {
        for slot in [
            &self.inner.read_task,
            &self.inner.ping_task,
            &self.inner.reconnect_task,
        ] {
            if let Some(task) = slot.lock().await.take() {
                task.abort();
            }
        }
    }

    fn emit(&self, event: RealtimeEvent) {
        // nobody listening is fine
        let _ = self.inner.events.send(event);
    }
}

fn frame_message(frame: &ClientFrame) -> Message {
    // serializing a field-and-unit enum with string fields cannot fail
    Message::Text(serde_json::to_string(frame).unwrap_or_default())
}

fn parse_frame(text: &str) -> Option<serde_json::Value> {
    serde_json::from_str(text).ok()
}

/// Exponential backoff: base doubled per attempt, capped.
fn reconnect_delay(base: Duration, cap: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> RealtimeConfig {
        RealtimeConfig {
            base_url: "ws://127.0.0.1:1".to_owned(),
            max_reconnect_attempts: 3,
            connect_timeout_ms: 1_000,
            ping_interval_ms: 60_000,
            base_reconnect_delay_ms: 10,
            max_reconnect_delay_ms: 40,
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let base = Duration::from_secs(1);
        let cap = Duration::from_secs(30);

        assert_eq!(reconnect_delay(base, cap, 1), Duration::from_secs(1));
        assert_eq!(reconnect_delay(base, cap, 2), Duration::from_secs(2));
        assert_eq!(reconnect_delay(base, cap, 5), Duration::from_secs(16));
        assert_eq!(reconnect_delay(base, cap, 6), Duration::from_secs(30));
        assert_eq!(reconnect_delay(base, cap, 40), Duration::from_secs(30));
    }

    #[test]
    fn malformed_frames_are_dropped() {
        assert!(parse_frame("not json").is_none());
        assert!(parse_frame(r#"{"type": "message_update"}"#).is_some());
    }

    #[tokio::test]
    async fn connect_refuses_after_attempts_exhausted() {
        let mut config = fast_config();
        config.max_reconnect_attempts = 0;
        let (client, mut events) = RealtimeClient::new(config.base_url.clone(), None, &config);

        let result = client.connect().await;

        assert!(matches!(result, Err(RealtimeError::AttemptsExhausted)));
        assert!(matches!(
            events.recv().await,
            Some(RealtimeEvent::Error(_))
        ));
    }

    #[tokio::test]
    async fn send_is_refused_while_disconnected() {
        let config = fast_config();
        let (client, _events) = RealtimeClient::new(config.base_url.clone(), None, &config);

        let result = client.send(&serde_json::json!({"type": "ack"})).await;

        assert!(matches!(result, Err(RealtimeError::NotAvailable)));
    }

    #[tokio::test]
    async fn disconnect_pins_the_attempt_counter() {
        let config = fast_config();
        let (client, _events) = RealtimeClient::new(config.base_url.clone(), None, &config);

        client.disconnect().await;

        assert_eq!(
            client.inner.attempts.load(Ordering::SeqCst),
            config.max_reconnect_attempts
        );
        assert!(matches!(
            client.connect().await,
            Err(RealtimeError::AttemptsExhausted)
        ));
    }

    #[tokio::test]
    async fn authenticates_then_forwards_parsed_frames() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback");
        let addr = listener.local_addr().expect("local addr");

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut socket = tokio_tungstenite::accept_async(stream)
                .await
                .expect("handshake");

            let first = socket.next().await.expect("auth frame").expect("read");
            let auth: serde_json::Value = match first {
                Message::Text(text) => serde_json::from_str(&text).expect("auth json"),
                other => panic!("expected text frame, got {other:?}"),
            };
            assert_eq!(auth["type"], "auth");
            assert_eq!(auth["token"], "tok-123");

            socket
                .send(Message::Text("not json".to_owned()))
                .await
                .expect("send malformed");
            socket
                .send(Message::Text(
                    r#"{"type": "message_update", "channel_id": "ch-9"}"#.to_owned(),
                ))
                .await
                .expect("send frame");

            let reply = socket.next().await.expect("client frame").expect("read");
            match reply {
                Message::Text(text) => {
                    let value: serde_json::Value = serde_json::from_str(&text).expect("json");
                    assert_eq!(value["type"], "ack");
                }
                other => panic!("expected text frame, got {other:?}"),
            }
        });

        let config = fast_config();
        let (client, mut events) = RealtimeClient::new(
            format!("ws://{addr}"),
            Some("tok-123".to_owned()),
            &config,
        );
        client.connect().await.expect("connect");

        assert!(matches!(events.recv().await, Some(RealtimeEvent::Connected)));
        match events.recv().await {
            Some(RealtimeEvent::Frame(value)) => {
                assert_eq!(value["type"], "message_update");
                assert_eq!(value["channel_id"], "ch-9");
            }
            other => panic!("expected frame event, got {other:?}"),
        }

        client
            .send(&serde_json::json!({"type": "ack"}))
            .await
            .expect("send over live socket");

        client.disconnect().await;
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn reconnects_after_abnormal_close_then_exhausts_the_budget() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback");
        let addr = listener.local_addr().expect("local addr");

        // Two sessions, each ended with a server-side 1011, then the
        // listener goes away so further attempts are refused.
        let server = tokio::spawn(async move {
            for _ in 0..2 {
                let (stream, _) = listener.accept().await.expect("accept");
                let mut socket = tokio_tungstenite::accept_async(stream)
                    .await
                    .expect("handshake");
                socket
                    .send(Message::Close(Some(
                        tokio_tungstenite::tungstenite::protocol::CloseFrame {
                            code: CloseCode::Error,
                            reason: "restarting".into(),
                        },
                    )))
                    .await
                    .expect("send close");
            }
        });

        let mut config = fast_config();
        config.max_reconnect_attempts = 2;
        let (client, mut events) = RealtimeClient::new(format!("ws://{addr}"), None, &config);
        client.connect().await.expect("connect");

        let mut connects = 0;
        let mut disconnects = 0;
        let mut terminal = false;
        let collect = async {
            while let Some(event) = events.recv().await {
                match event {
                    RealtimeEvent::Connected => connects += 1,
                    RealtimeEvent::Disconnected => disconnects += 1,
                    RealtimeEvent::Error(message) => {
                        if message.contains("maximum reconnection attempts") {
                            terminal = true;
                            break;
                        }
                    }
                    RealtimeEvent::Frame(_) => {}
                }
            }
        };
        timeout(Duration::from_secs(5), collect)
            .await
            .expect("terminal error before the deadline");

        assert!(terminal);
        assert_eq!(connects, 2, "initial connect plus one successful reconnect");
        assert_eq!(disconnects, 2);
        // a successful reconnect reset the counter; the refused attempts
        // then spent the whole budget
        assert_eq!(
            client.inner.attempts.load(Ordering::SeqCst),
            config.max_reconnect_attempts
        );

        server.await.expect("server task");
    }
}
