//! Realtime connection to the backend, one per authenticated session.
//!
//! The backend runs Socket.IO. The client joins through the Engine.IO
//! websocket transport directly (no long-polling phase), answers server
//! pings, and treats a server silent for longer than the advertised
//! `pingInterval + pingTimeout` as a dropped connection.

use std::fmt;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::common::{RealtimeEvent, UserId};

use super::frame::{self, Inbound, OutboundEvent};

const ENGINE_PATH: &str = "/socket.io/";
const OUTBOUND_BUFFER: usize = 64;
/// Socket.IO server defaults, used until the handshake says otherwise.
const DEFAULT_LIVENESS: Duration = Duration::from_millis(25_000 + 20_000);

#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    #[error("invalid socket url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("no realtime connection")]
    NotConnected,
    #[error("outbound queue is full")]
    QueueFull,
}

/// Distinguishes successive connections of one manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The listener of one connection. Dropping it detaches the listener.
///
/// Events queue without bound until they are taken, so a UI that stops
/// polling (a minimised window) loses nothing.
#[derive(Debug)]
pub struct Subscription {
    connection_id: ConnectionId,
    receiver: mpsc::UnboundedReceiver<RealtimeEvent>,
}

impl Subscription {
    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Takes every event queued so far without waiting.
    pub fn drain(&mut self) -> Vec<RealtimeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Waits for the next event; `None` once the connection is gone.
    pub async fn recv(&mut self) -> Option<RealtimeEvent> {
        self.receiver.recv().await
    }
}

struct Connection {
    id: ConnectionId,
    identity: UserId,
    /// Handed out once by [`ConnectionManager::subscribe`].
    listener: Option<mpsc::UnboundedReceiver<RealtimeEvent>>,
    outbound: mpsc::Sender<OutboundEvent>,
    shutdown: Option<oneshot::Sender<()>>,
    #[cfg(test)]
    events: mpsc::UnboundedSender<RealtimeEvent>,
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        log::info!("Realtime connection {} for {} closed", self.id, self.identity);
    }
}

/// Keeps at most one live connection, tagged with the session identity.
pub struct ConnectionManager {
    engine_url: Url,
    reconnect_delay: Duration,
    runtime: Handle,
    next_id: u64,
    current: Option<Connection>,
}

impl ConnectionManager {
    /// `socket_url` is the Socket.IO server origin; `http(s)` and `ws(s)`
    /// are both accepted.
    pub fn new(
        socket_url: &str,
        reconnect_delay: Duration,
        runtime: Handle,
    ) -> Result<Self, SocketError> {
        Ok(Self {
            engine_url: engine_url(socket_url)?,
            reconnect_delay,
            runtime,
            next_id: 0,
            current: None,
        })
    }

    /// Opens a connection for `identity`, tearing down any previous one
    /// first. `None` closes the connection. Same identity is a no-op.
    pub fn set_identity(&mut self, identity: Option<&UserId>) {
        if self.identity() == identity {
            return;
        }

        // The old connection must be gone before the new one is opened.
        self.current = None;

        if let Some(identity) = identity {
            self.current = Some(self.open(identity.clone()));
        }
    }

    pub fn disconnect(&mut self) {
        self.set_identity(None);
    }

    pub fn identity(&self) -> Option<&UserId> {
        self.current.as_ref().map(|connection| &connection.identity)
    }

    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.current.as_ref().map(|connection| connection.id)
    }

    /// Takes the listener of the current connection. Each connection has a
    /// single listener; events received before this call wait in its queue.
    pub fn subscribe(&mut self) -> Option<Subscription> {
        let connection = self.current.as_mut()?;
        let receiver = connection.listener.take()?;
        Some(Subscription {
            connection_id: connection.id,
            receiver,
        })
    }

    /// Queues an outbound frame. It goes out once the connection has joined;
    /// there is no delivery acknowledgement.
    pub fn emit(&self, event: OutboundEvent) -> Result<(), SocketError> {
        let connection = self.current.as_ref().ok_or(SocketError::NotConnected)?;
        connection.outbound.try_send(event).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => SocketError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SocketError::NotConnected,
        })
    }

    fn open(&mut self, identity: UserId) -> Connection {
        self.next_id += 1;
        let id = ConnectionId(self.next_id);

        let mut url = self.engine_url.clone();
        url.query_pairs_mut().append_pair("userId", identity.as_str());

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        log::info!("Opening realtime connection {id} for {identity}");
        self.runtime.spawn(run_connection(
            id,
            url,
            events_tx.clone(),
            outbound_rx,
            shutdown_rx,
            self.reconnect_delay,
        ));

        Connection {
            id,
            identity,
            listener: Some(events_rx),
            outbound: outbound_tx,
            shutdown: Some(shutdown_tx),
            #[cfg(test)]
            events: events_tx,
        }
    }

    #[cfg(test)]
    pub(crate) fn deliver(&self, event: RealtimeEvent) {
        if let Some(sink) = self.event_sink() {
            let _ = sink.send(event);
        }
    }

    #[cfg(test)]
    pub(crate) fn event_sink(&self) -> Option<mpsc::UnboundedSender<RealtimeEvent>> {
        self.current
            .as_ref()
            .map(|connection| connection.events.clone())
    }
}

/// Maps the server origin to its Engine.IO websocket endpoint.
fn engine_url(socket_url: &str) -> Result<Url, SocketError> {
    let invalid = |reason: String| SocketError::InvalidUrl {
        url: socket_url.to_string(),
        reason,
    };

    let mut url = Url::parse(socket_url).map_err(|err| invalid(err.to_string()))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(invalid(format!("unsupported scheme `{other}`"))),
    };
    url.set_scheme(scheme)
        .map_err(|()| invalid(format!("cannot use scheme `{scheme}`")))?;
    url.set_path(ENGINE_PATH);
    url.query_pairs_mut()
        .append_pair("EIO", "4")
        .append_pair("transport", "websocket");
    Ok(url)
}

enum SessionEnd {
    Shutdown,
    Dropped,
}

/// What the session loop does after one inbound packet.
enum Step {
    Continue,
    Reply(&'static str),
    End,
}

async fn run_connection(
    id: ConnectionId,
    url: Url,
    events: mpsc::UnboundedSender<RealtimeEvent>,
    mut outbound: mpsc::Receiver<OutboundEvent>,
    mut shutdown: oneshot::Receiver<()>,
    reconnect_delay: Duration,
) {
    loop {
        let connected = tokio::select! {
            _ = &mut shutdown => return,
            result = connect_async(url.as_str()) => result,
        };

        match connected {
            Ok((stream, _)) => {
                log::info!("Realtime connection {id} established");
                match run_session(id, stream, &events, &mut outbound, &mut shutdown).await {
                    SessionEnd::Shutdown => return,
                    SessionEnd::Dropped => log::warn!("Realtime connection {id} dropped"),
                }
            }
            Err(err) => log::error!("Realtime connection {id} error: {err}"),
        }

        tokio::select! {
            _ = &mut shutdown => return,
            () = tokio::time::sleep(reconnect_delay) => {}
        }
    }
}

async fn run_session<S>(
    id: ConnectionId,
    stream: S,
    events: &mpsc::UnboundedSender<RealtimeEvent>,
    outbound: &mut mpsc::Receiver<OutboundEvent>,
    shutdown: &mut oneshot::Receiver<()>,
) -> SessionEnd
where
    S: futures::Stream<Item = Result<Message, tungstenite::Error>>
        + futures::Sink<Message, Error = tungstenite::Error>
        + Unpin,
{
    let (mut write, mut read) = stream.split();
    // Outbound frames wait in the queue until the namespace is joined.
    let mut joined = false;
    let mut liveness = DEFAULT_LIVENESS;
    let silence = tokio::time::sleep(liveness);
    tokio::pin!(silence);

    loop {
        tokio::select! {
            _ = &mut *shutdown => {
                let _ = write.send(Message::text(frame::DISCONNECT)).await;
                let _ = write.send(Message::Close(None)).await;
                return SessionEnd::Shutdown;
            }
            () = silence.as_mut() => {
                log::warn!("Realtime connection {id}: server silent for {liveness:?}");
                return SessionEnd::Dropped;
            }
            command = outbound.recv(), if joined => {
                let Some(event) = command else {
                    let _ = write.send(Message::Close(None)).await;
                    return SessionEnd::Shutdown;
                };
                let text = match frame::encode(&event) {
                    Ok(text) => text,
                    Err(err) => {
                        log::warn!("Failed to encode outbound frame: {err}");
                        continue;
                    }
                };
                if let Err(err) = write.send(Message::text(text)).await {
                    log::error!("Realtime connection {id} send error: {err}");
                    return SessionEnd::Dropped;
                }
            }
            incoming = read.next() => {
                let step = match incoming {
                    Some(Ok(Message::Text(text))) => {
                        silence.as_mut().reset(Instant::now() + liveness);
                        on_packet(id, text.as_str(), events, &mut joined, &mut liveness)
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = write.send(Message::Pong(payload)).await;
                        Step::Continue
                    }
                    Some(Ok(Message::Close(_))) | None => Step::End,
                    Some(Ok(_)) => Step::Continue,
                    Some(Err(err)) => {
                        log::error!("Realtime connection {id} read error: {err}");
                        Step::End
                    }
                };

                match step {
                    Step::Continue => {}
                    Step::Reply(text) => {
                        if let Err(err) = write.send(Message::text(text)).await {
                            log::error!("Realtime connection {id} send error: {err}");
                            return SessionEnd::Dropped;
                        }
                    }
                    Step::End => return SessionEnd::Dropped,
                }
            }
        }
    }
}

fn on_packet(
    id: ConnectionId,
    text: &str,
    events: &mpsc::UnboundedSender<RealtimeEvent>,
    joined: &mut bool,
    liveness: &mut Duration,
) -> Step {
    match frame::decode(text) {
        Ok(Inbound::Open(handshake)) => {
            *liveness = handshake.liveness();
            Step::Reply(frame::CONNECT)
        }
        Ok(Inbound::Connected) => {
            log::info!("Realtime connection {id} joined");
            *joined = true;
            Step::Continue
        }
        Ok(Inbound::ConnectRefused(reason)) => {
            log::error!("Realtime connection {id} refused: {reason}");
            Step::End
        }
        Ok(Inbound::Ping) => Step::Reply(frame::PONG),
        Ok(Inbound::Close | Inbound::Disconnected) => Step::End,
        Ok(Inbound::Event(event)) => {
            // The listener may already be gone; the event is simply not observed.
            let _ = events.send(event);
            Step::Continue
        }
        Ok(Inbound::Ignored) => {
            log::debug!("Connection {id}: ignoring packet {text}");
            Step::Continue
        }
        Err(err) => {
            log::debug!("Connection {id}: malformed packet ({err}): {text}");
            Step::Continue
        }
    }
}
