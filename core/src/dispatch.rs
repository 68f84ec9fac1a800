//! Transport boundary: inbound messages in, replies out.
//!
//! Each message runs on its own thread. There is no queue and no bound on
//! in-flight handlers; `drain` waits for all of them.

use crate::{
    error::BotResult,
    router::{CommandRouter, Outcome},
    types::{ChannelId, UserId},
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

/// The only fields of a platform message the bot reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub author_id: UserId,
    pub channel_id: ChannelId,
    pub content: String,
}

impl InboundMessage {
    pub fn new(
        author_id: impl Into<UserId>,
        channel_id: impl Into<ChannelId>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            author_id: author_id.into(),
            channel_id: channel_id.into(),
            content: content.into(),
        }
    }
}

/// Sends a reply to a channel. Implemented by the transport.
pub trait ReplySink: Send + Sync {
    fn send(&self, channel_id: &str, content: &str) -> BotResult<()>;
}

pub struct Dispatcher {
    router: Arc<CommandRouter>,
    sink: Arc<dyn ReplySink>,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl Dispatcher {
    pub fn new(router: Arc<CommandRouter>, sink: Arc<dyn ReplySink>) -> Self {
        Self {
            router,
            sink,
            in_flight: Mutex::new(Vec::new()),
        }
    }

    pub fn router(&self) -> &CommandRouter {
        &self.router
    }

    /// Handle `msg` on a new thread and return immediately.
    pub fn dispatch(&self, msg: InboundMessage) {
        let router = Arc::clone(&self.router);
        let sink = Arc::clone(&self.sink);
        let handle = std::thread::spawn(move || {
            handle_and_reply(&router, sink.as_ref(), &msg);
        });

        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }

    /// Handle `msg` on the calling thread.
    pub fn dispatch_blocking(&self, msg: &InboundMessage) -> Outcome {
        handle_and_reply(&self.router, self.sink.as_ref(), msg)
    }

    /// Wait for every in-flight handler. Returns how many were joined.
    pub fn drain(&self) -> usize {
        let handles: Vec<_> = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        let joined = handles.len();
        for handle in handles {
            if handle.join().is_err() {
                log::error!("A message handler panicked");
            }
        }
        joined
    }
}

fn handle_and_reply(router: &CommandRouter, sink: &dyn ReplySink, msg: &InboundMessage) -> Outcome {
    let outcome = router.handle(msg);
    if let Some(reply) = outcome.reply() {
        if let Err(e) = sink.send(&msg.channel_id, reply) {
            log::error!("Error sending reply to {}: {e}", msg.channel_id);
        }
    }
    outcome
}
