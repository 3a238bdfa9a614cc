//! Flow progress events.
//!
//! The presentation collaborator subscribes before a flow starts and
//! receives the few notifications it needs to render progress without
//! polling the flow.
use std::sync::{Arc, Mutex};

use crate::chan;

/// Notifications emitted while a channel open flow runs.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// The remote node was already among our peers, no dial needed.
    PeerAlreadyConnected { node_id: String },
    /// A fresh peer connection to the remote node came up.
    PeerConnected { node_id: String },
    /// The final channel-open request went out to the service. Sent
    /// exactly once per execution, right when the callback step begins.
    OpenRequested { service: String },
}

/// Publishes events to subscribers.
#[derive(Clone)]
pub struct Emitter<T> {
    subscribers: Arc<Mutex<Vec<chan::Sender<T>>>>,
}

impl<T> Default for Emitter<T> {
    fn default() -> Self {
        Self {
            subscribers: Default::default(),
        }
    }
}

impl<T: Clone> Emitter<T> {
    /// Emit an event to every subscriber, dropping the ones that went
    /// away in the meantime.
    pub fn emit(&self, event: T) {
        self.subscribers
            .lock()
            .unwrap()
            .retain(|sub| sub.try_send(event.clone()).is_ok());
    }

    /// Create a subscriber handle from this emitter.
    pub fn subscriber(&self) -> Subscriber<T> {
        Subscriber {
            subscribers: self.subscribers.clone(),
        }
    }
}

/// Subscribes to events.
#[derive(Clone)]
pub struct Subscriber<T> {
    subscribers: Arc<Mutex<Vec<chan::Sender<T>>>>,
}

impl<T: Clone> Subscriber<T> {
    /// Open a receiving channel for broadcast events.
    pub fn subscribe(&self) -> chan::Receiver<T> {
        let (sender, receiver) = chan::unbounded();
        self.subscribers.lock().unwrap().push(sender);
        receiver
    }
}
