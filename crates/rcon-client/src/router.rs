use std::fmt;

use rcon_core::{ChatMessage, Frame, RequestId};

use crate::correlation::CorrelationTable;

/// Receives generic broadcast payloads.
pub type MessageListener = Box<dyn Fn(&str) + Send + 'static>;
/// Receives chat broadcasts as `(user_id, username, text)`.
pub type ChatListener = Box<dyn Fn(i64, &str, &str) + Send + 'static>;

/// Broadcast consumers registered on a session.
///
/// Listeners run synchronously on the session task, so they must return
/// quickly and must not panic; a panic stops the session.
#[derive(Default)]
pub struct Listeners {
    message: Option<MessageListener>,
    chat: Option<ChatListener>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the generic broadcast listener.
    pub fn on_message(mut self, listener: impl Fn(&str) + Send + 'static) -> Self {
        self.message = Some(Box::new(listener));
        self
    }

    /// Registers the chat broadcast listener.
    pub fn on_chat(mut self, listener: impl Fn(i64, &str, &str) + Send + 'static) -> Self {
        self.chat = Some(Box::new(listener));
        self
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("message", &self.message.is_some())
            .field("chat", &self.chat.is_some())
            .finish()
    }
}

/// Where a routed frame ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Delivered to the chat listener.
    Chat,
    /// Delivered to the generic listener.
    Generic,
    /// Resolved the outstanding request with this identifier.
    Reply(RequestId),
    /// Chat payload failed to decode for a registered chat listener.
    Malformed,
    /// Nobody wanted it.
    Dropped,
}

/// Hands one classified frame to exactly one consumer.
///
/// Chat payloads are only decoded when a chat listener is registered.
pub fn route(frame: Frame, listeners: &Listeners, table: &mut CorrelationTable) -> Route {
    match frame {
        Frame::ChatBroadcast(payload) => {
            let Some(listener) = &listeners.chat else {
                return Route::Dropped;
            };
            match ChatMessage::parse(&payload) {
                Ok(chat) => {
                    listener(chat.user_id, &chat.username, &chat.message);
                    Route::Chat
                }
                Err(err) => {
                    tracing::warn!(error = %err, "dropping chat broadcast");
                    Route::Malformed
                }
            }
        }
        Frame::GenericBroadcast(message) => match &listeners.message {
            Some(listener) => {
                listener(&message);
                Route::Generic
            }
            None => Route::Dropped,
        },
        Frame::Reply {
            id,
            message,
            stacktrace,
        } => {
            if !stacktrace.is_empty() {
                tracing::debug!(id = %id, stacktrace = %stacktrace, "reply carried a stacktrace");
            }
            if table.resolve(id, message) {
                Route::Reply(id)
            } else {
                Route::Dropped
            }
        }
        Frame::Unroutable(_) => Route::Dropped,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rcon_core::{Frame, FrameKind, InboundFrame, RequestId};
    use tokio::sync::oneshot;

    use super::{Listeners, Route, route};
    use crate::correlation::CorrelationTable;

    type Seen = Arc<Mutex<Vec<String>>>;

    fn recording_listeners() -> (Listeners, Seen) {
        let seen: Seen = Arc::default();
        let generic = Arc::clone(&seen);
        let chat = Arc::clone(&seen);
        let listeners = Listeners::new()
            .on_message(move |text| {
                generic
                    .lock()
                    .expect("lock")
                    .push(format!("generic:{text}"));
            })
            .on_chat(move |user_id, username, text| {
                chat.lock()
                    .expect("lock")
                    .push(format!("chat:{user_id}:{username}:{text}"));
            });
        (listeners, seen)
    }

    #[test]
    fn chat_listener_receives_user_name_and_text() {
        let (listeners, seen) = recording_listeners();
        let mut table = CorrelationTable::default();
        let frame = Frame::ChatBroadcast(
            r##"{"UserId":76561198,"Username":"ana","Message":"gg","Color":"#5af","Time":1.0}"##
                .to_string(),
        );

        assert_eq!(route(frame, &listeners, &mut table), Route::Chat);
        assert_eq!(*seen.lock().expect("lock"), vec!["chat:76561198:ana:gg"]);
    }

    #[test]
    fn generic_listener_receives_raw_payload() {
        let (listeners, seen) = recording_listeners();
        let mut table = CorrelationTable::default();
        let frame = Frame::GenericBroadcast("  Saved 1024 ents  ".to_string());

        assert_eq!(route(frame, &listeners, &mut table), Route::Generic);
        assert_eq!(
            *seen.lock().expect("lock"),
            vec!["generic:  Saved 1024 ents  "]
        );
    }

    #[test]
    fn broadcasts_without_listeners_are_dropped() {
        let listeners = Listeners::new();
        let mut table = CorrelationTable::default();

        let generic = Frame::GenericBroadcast("log".to_string());
        assert_eq!(route(generic, &listeners, &mut table), Route::Dropped);

        let chat =
            Frame::ChatBroadcast(r#"{"UserId":1,"Username":"bo","Message":"hey"}"#.to_string());
        assert_eq!(route(chat, &listeners, &mut table), Route::Dropped);
    }

    #[test]
    fn bad_chat_payload_without_listener_is_dropped_unread() {
        let seen: Seen = Arc::default();
        let generic = Arc::clone(&seen);
        let listeners = Listeners::new().on_message(move |text| {
            generic.lock().expect("lock").push(text.to_string());
        });
        let mut table = CorrelationTable::default();

        let chat = Frame::ChatBroadcast("{not json".to_string());
        assert_eq!(route(chat, &listeners, &mut table), Route::Dropped);
        assert!(seen.lock().expect("lock").is_empty());
    }

    #[test]
    fn bad_chat_payload_with_listener_is_malformed() {
        let (listeners, seen) = recording_listeners();
        let mut table = CorrelationTable::default();

        let chat = Frame::ChatBroadcast("[]".to_string());
        assert_eq!(route(chat, &listeners, &mut table), Route::Malformed);
        assert!(seen.lock().expect("lock").is_empty());
    }

    #[test]
    fn reply_resolves_matching_request_only() {
        let (listeners, seen) = recording_listeners();
        let mut table = CorrelationTable::default();
        let (tx, mut rx) = oneshot::channel();
        table.register(RequestId(5), tx);

        let unknown = Frame::Reply {
            id: RequestId(6),
            message: "stray".to_string(),
            stacktrace: String::new(),
        };
        assert_eq!(route(unknown, &listeners, &mut table), Route::Dropped);
        assert!(table.contains(RequestId(5)));

        let matching = Frame::Reply {
            id: RequestId(5),
            message: "players: 3".to_string(),
            stacktrace: String::new(),
        };
        assert_eq!(
            route(matching, &listeners, &mut table),
            Route::Reply(RequestId(5))
        );
        assert_eq!(
            rx.try_recv().expect("reply delivered"),
            Ok("players: 3".to_string())
        );
        assert!(seen.lock().expect("lock").is_empty());
    }

    #[test]
    fn unroutable_frames_touch_nothing() {
        let (listeners, seen) = recording_listeners();
        let mut table = CorrelationTable::default();
        let frame = Frame::Unroutable(InboundFrame {
            kind: FrameKind::Generic,
            identifier: RequestId::BROADCAST,
            message: "noise".to_string(),
            stacktrace: String::new(),
        });

        assert_eq!(route(frame, &listeners, &mut table), Route::Dropped);
        assert!(seen.lock().expect("lock").is_empty());
    }
}
