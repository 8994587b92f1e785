use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use rcon_core::{ConnectionState, OutboundFrame, RequestId, SessionConfig, SessionIdentity};
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tracing::{debug, info, trace, warn};

use crate::{
    RconError, Transport, TransportLink, WebSocketTransport,
    codec::{decode_frame, encode},
    correlation::{CorrelationTable, IdAllocator, ReplyTx},
    lifecycle::{FixedDelay, ReconnectPolicy, ReconnectTimer},
    router::{Listeners, route},
};

/// Handle to a running RCON session.
///
/// All state lives on one background task; handles only enqueue work. The
/// task stops on [`shutdown`](Self::shutdown) or once every handle is dropped.
#[derive(Clone)]
pub struct RconSession {
    identity: Arc<SessionIdentity>,
    commands: mpsc::UnboundedSender<SessionCommand>,
    state: watch::Receiver<ConnectionState>,
}

impl RconSession {
    /// Starts configuring a session.
    pub fn builder(config: SessionConfig) -> SessionBuilder {
        SessionBuilder {
            config,
            listeners: Listeners::new(),
            transport: None,
            policy: None,
        }
    }

    /// Spawns a websocket session with the given broadcast listeners.
    /// Must be called inside a tokio runtime.
    pub fn spawn(config: SessionConfig, listeners: Listeners) -> Self {
        Self::builder(config).listeners(listeners).spawn()
    }

    /// Sends one command and resolves with the reply text.
    ///
    /// The command is queued immediately, so identifiers follow call order
    /// even if the returned futures are awaited in a different order.
    pub fn send_command(&self, command: impl Into<String>) -> PendingReply {
        let (reply, outcome) = oneshot::channel();
        let queued = self.commands.send(SessionCommand::Send(QueuedCommand {
            command: command.into(),
            reply,
        }));
        PendingReply {
            outcome: queued.ok().map(|()| outcome),
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watches connection state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Identity this session was spawned with.
    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    /// Stops the session task. Outstanding commands fail with
    /// [`RconError::SessionClosed`].
    pub fn shutdown(&self) {
        let _ = self.commands.send(SessionCommand::Shutdown);
    }
}

/// Builder returned by [`RconSession::builder`].
pub struct SessionBuilder {
    config: SessionConfig,
    listeners: Listeners,
    transport: Option<Arc<dyn Transport>>,
    policy: Option<Box<dyn ReconnectPolicy>>,
}

impl SessionBuilder {
    /// Replaces every broadcast listener at once.
    pub fn listeners(mut self, listeners: Listeners) -> Self {
        self.listeners = listeners;
        self
    }

    /// Registers the generic broadcast listener.
    pub fn message_listener(mut self, listener: impl Fn(&str) + Send + 'static) -> Self {
        self.listeners = self.listeners.on_message(listener);
        self
    }

    /// Registers the chat broadcast listener.
    pub fn chat_listener(mut self, listener: impl Fn(i64, &str, &str) + Send + 'static) -> Self {
        self.listeners = self.listeners.on_chat(listener);
        self
    }

    /// Replaces the default websocket transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replaces the default fixed reconnect delay.
    pub fn reconnect_policy(mut self, policy: impl ReconnectPolicy) -> Self {
        self.policy = Some(Box::new(policy));
        self
    }

    /// Spawns the session task. Must be called inside a tokio runtime.
    pub fn spawn(self) -> RconSession {
        let identity = Arc::new(self.config.identity.clone());
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let (events, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(ConnectionState::Disconnected);

        let policy: Box<dyn ReconnectPolicy> = match self.policy {
            Some(policy) => policy,
            None => Box::new(FixedDelay(self.config.reconnect_delay)),
        };
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(WebSocketTransport),
        };

        let actor = SessionActor {
            signature: identity.signature(),
            config: self.config,
            transport,
            policy,
            listeners: self.listeners,
            ids: IdAllocator::default(),
            table: CorrelationTable::default(),
            link: Link::Disconnected,
            attempt: None,
            reconnect: ReconnectTimer::default(),
            events,
            state: state_tx,
        };
        tokio::spawn(actor.run(commands_rx, events_rx));

        RconSession {
            identity,
            commands,
            state,
        }
    }
}

/// Reply to one [`RconSession::send_command`] call. Settles exactly once.
///
/// Dropping it discards the result but does not cancel the command.
#[derive(Debug)]
pub struct PendingReply {
    outcome: Option<oneshot::Receiver<Result<String, RconError>>>,
}

impl Future for PendingReply {
    type Output = Result<String, RconError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(outcome) = self.outcome.as_mut() else {
            return Poll::Ready(Err(RconError::SessionClosed));
        };
        Pin::new(outcome)
            .poll(cx)
            .map(|result| result.unwrap_or(Err(RconError::SessionClosed)))
    }
}

enum SessionCommand {
    Send(QueuedCommand),
    Shutdown,
}

struct QueuedCommand {
    command: String,
    reply: ReplyTx,
}

enum SessionEvent {
    /// Outcome of the in-flight connection attempt.
    Attempted(Result<TransportLink, RconError>),
    /// Reply window for a request closed.
    Expired(RequestId),
    ReconnectDue,
}

enum Link {
    Disconnected,
    /// Commands wait here for the single in-flight attempt.
    Connecting {
        queued: Vec<QueuedCommand>,
    },
    Connected(TransportLink),
}

impl Link {
    fn state(&self) -> ConnectionState {
        match self {
            Link::Disconnected => ConnectionState::Disconnected,
            Link::Connecting { .. } => ConnectionState::Connecting,
            Link::Connected(_) => ConnectionState::Connected,
        }
    }
}

struct SessionActor {
    config: SessionConfig,
    signature: String,
    transport: Arc<dyn Transport>,
    policy: Box<dyn ReconnectPolicy>,
    listeners: Listeners,
    ids: IdAllocator,
    table: CorrelationTable,
    link: Link,
    attempt: Option<JoinHandle<()>>,
    reconnect: ReconnectTimer,
    events: mpsc::UnboundedSender<SessionEvent>,
    state: watch::Sender<ConnectionState>,
}

impl SessionActor {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        mut events: mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        if self.config.connect_on_start {
            self.ensure_connected();
        }

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(SessionCommand::Send(command)) => self.submit(command),
                    Some(SessionCommand::Shutdown) | None => break,
                },
                Some(event) = events.recv() => self.handle_event(event),
                inbound = next_inbound(&mut self.link) => match inbound {
                    Some(text) => self.dispatch(&text),
                    None => self.handle_close(),
                },
            }
        }

        self.reconnect.cancel();
        if let Some(attempt) = self.attempt.take() {
            attempt.abort();
        }
        self.set_link(Link::Disconnected);
        info!(session = %self.signature, pending = self.table.len(), "session stopped");
    }

    /// Starts one connection attempt unless one is already in flight or open.
    fn ensure_connected(&mut self) {
        self.reconnect.cancel();
        if !matches!(self.link, Link::Disconnected) {
            return;
        }

        self.set_link(Link::Connecting { queued: Vec::new() });
        debug!(session = %self.signature, "connecting");

        let transport = Arc::clone(&self.transport);
        let url = self.config.identity.url();
        let events = self.events.clone();
        self.attempt = Some(tokio::spawn(async move {
            let outcome = transport.connect(&url).await;
            let _ = events.send(SessionEvent::Attempted(outcome));
        }));
    }

    fn submit(&mut self, command: QueuedCommand) {
        self.ensure_connected();
        match self.link {
            Link::Connecting { ref mut queued } => queued.push(command),
            Link::Connected(_) => self.write_command(command),
            Link::Disconnected => {
                let _ = command
                    .reply
                    .send(Err(RconError::ConnectionFailed("not connected".to_string())));
            }
        }
    }

    fn write_command(&mut self, command: QueuedCommand) {
        let Link::Connected(link) = &self.link else {
            let _ = command
                .reply
                .send(Err(RconError::ConnectionFailed("not connected".to_string())));
            return;
        };

        let id = self.ids.next_id();
        let frame = OutboundFrame {
            name: self.config.identity.name.clone(),
            identifier: id,
            message: command.command,
        };
        let text = match encode(&frame) {
            Ok(text) => text,
            Err(err) => {
                let _ = command.reply.send(Err(err));
                return;
            }
        };

        if !link.write(text) {
            debug!(session = %self.signature, id = %id, "transport gone before write");
        }
        self.table.register(id, command.reply);

        let window = self.config.reply_timeout;
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let _ = events.send(SessionEvent::Expired(id));
        });
        trace!(session = %self.signature, id = %id, "command written");
    }

    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Attempted(Ok(link)) => self.handle_open(link),
            SessionEvent::Attempted(Err(err)) => self.handle_failed(err),
            SessionEvent::Expired(id) => {
                let after_ms = self.config.reply_timeout.as_millis().try_into().unwrap_or(u64::MAX);
                if self.table.expire(id, RconError::Timeout { id, after_ms }) {
                    debug!(session = %self.signature, id = %id, "request timed out");
                }
            }
            SessionEvent::ReconnectDue => {
                debug!(session = %self.signature, "reconnect timer fired");
                self.ensure_connected();
            }
        }
    }

    fn handle_open(&mut self, link: TransportLink) {
        self.attempt = None;
        let queued = match std::mem::replace(&mut self.link, Link::Connected(link)) {
            Link::Connecting { queued } => queued,
            Link::Disconnected | Link::Connected(_) => Vec::new(),
        };
        self.publish_state();
        self.policy.reset();
        info!(session = %self.signature, queued = queued.len(), "connected");

        for command in queued {
            self.write_command(command);
        }
    }

    fn handle_failed(&mut self, err: RconError) {
        self.attempt = None;
        let err = match err {
            RconError::ConnectionFailed(_) => err,
            other => RconError::ConnectionFailed(other.to_string()),
        };

        let queued = match std::mem::replace(&mut self.link, Link::Disconnected) {
            Link::Connecting { queued } => queued,
            other => {
                self.link = other;
                return;
            }
        };
        self.publish_state();
        debug!(session = %self.signature, error = %err, queued = queued.len(), "connection attempt failed");

        for command in queued {
            let _ = command.reply.send(Err(err.clone()));
        }
        self.schedule_reconnect();
    }

    fn handle_close(&mut self) {
        self.set_link(Link::Disconnected);
        info!(session = %self.signature, pending = self.table.len(), "disconnected");
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&mut self) {
        let delay = self.policy.next_delay();
        let events = self.events.clone();
        self.reconnect.arm(delay, async move {
            let _ = events.send(SessionEvent::ReconnectDue);
        });
        debug!(session = %self.signature, delay = ?delay, "reconnect scheduled");
    }

    fn dispatch(&mut self, text: &str) {
        match decode_frame(text) {
            Ok(frame) => {
                let routed = route(frame, &self.listeners, &mut self.table);
                trace!(session = %self.signature, route = ?routed, "frame routed");
            }
            Err(err) => {
                warn!(session = %self.signature, error = %err, "dropping malformed frame");
            }
        }
    }

    fn set_link(&mut self, link: Link) {
        self.link = link;
        self.publish_state();
    }

    fn publish_state(&self) {
        self.state.send_replace(self.link.state());
    }
}

async fn next_inbound(link: &mut Link) -> Option<String> {
    match link {
        Link::Connected(link) => link.inbound.recv().await,
        Link::Disconnected | Link::Connecting { .. } => std::future::pending().await,
    }
}
