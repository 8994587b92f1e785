use std::{fmt, time::Duration};

/// How long a command waits for its reply before failing.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_millis(1_000);
/// Fixed pause between a dropped connection and the next attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5_000);

/// Who the session is and where it connects. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Display name sent with every command.
    pub name: String,
    /// Remote host name or address.
    pub host: String,
    /// Remote port.
    pub port: u16,
    /// Credential embedded in the connection URL path.
    credential: String,
}

impl SessionIdentity {
    /// Builds an identity from its parts.
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
            credential: credential.into(),
        }
    }

    /// Connection URL. Contains the credential in clear text; never log it.
    pub fn url(&self) -> String {
        format!("ws://{}:{}/{}", self.host, self.port, self.credential)
    }

    /// Connection URL with the credential masked.
    pub fn redacted_url(&self) -> String {
        format!("ws://{}:{}/***", self.host, self.port)
    }

    /// Short label used to tag diagnostics for this session.
    pub fn signature(&self) -> String {
        format!("{} [{}]", self.name, self.redacted_url())
    }
}

impl fmt::Debug for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionIdentity")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("credential", &"***")
            .finish()
    }
}

/// Tunables for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Session identity and endpoint.
    pub identity: SessionIdentity,
    /// Per-command reply window.
    pub reply_timeout: Duration,
    /// Delay before reconnecting after a close.
    pub reconnect_delay: Duration,
    /// Whether to start connecting as soon as the session is spawned.
    pub connect_on_start: bool,
}

impl SessionConfig {
    /// Default tunables for `identity`.
    pub fn new(identity: SessionIdentity) -> Self {
        Self {
            identity,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_on_start: true,
        }
    }

    /// Overrides the default reply timeout.
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// Overrides the default reconnect delay.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Defers the first connection attempt until the first command.
    pub fn with_connect_on_start(mut self, connect_on_start: bool) -> Self {
        self.connect_on_start = connect_on_start;
        self
    }
}
