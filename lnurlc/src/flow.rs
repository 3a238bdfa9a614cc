//! Channel open flow.
//!
//! The orchestration behind a service-initiated channel open: make
//! sure the node has a peer connection to the remote node named by the
//! request, hand the service its callback so it can fund the channel,
//! and report one terminal outcome back to the caller.
use std::sync::Arc;

use futures::FutureExt;
use triggered::Listener;

use lnurlc_common::callback::CallbackClient;
use lnurlc_common::conf::LnurlcConf;
use lnurlc_common::error;
use lnurlc_common::event::{ChannelEvent, Emitter, Subscriber};
use lnurlc_common::model::request::{ChannelRequest, OpenRequest};
use lnurlc_common::model::NodeAddress;
use lnurlc_common::node::NodeControl;

use crate::validate;

/// Where an execution currently is. Transitions are one-way, no state
/// is ever revisited within one execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    CheckingPeers,
    AlreadyConnected,
    Connecting,
    SendingCallback,
    Validating,
    Terminal,
}

/// The one terminal value an execution produces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowOutcome {
    Success,
    Failure(String),
}

/// A single channel open execution.
///
/// Create one per user action, subscribe to [`Self::events`] if
/// progress matters, then [`Self::run`] it to its outcome. A retry
/// after failure is a brand new flow.
pub struct ChannelOpenFlow {
    conf: Arc<LnurlcConf>,
    node: Arc<dyn NodeControl>,
    callback: Arc<dyn CallbackClient>,
    /// Our own identity public key, echoed to the service as `remoteid`.
    local_id: String,
    emitter: Emitter<ChannelEvent>,
    state: FlowState,
}

impl ChannelOpenFlow {
    pub fn new(
        conf: Arc<LnurlcConf>,
        node: Arc<dyn NodeControl>,
        callback: Arc<dyn CallbackClient>,
        local_id: String,
    ) -> Self {
        Self {
            conf,
            node,
            callback,
            local_id,
            emitter: Emitter::default(),
            state: FlowState::Idle,
        }
    }

    /// Subscribe to progress events, before calling [`Self::run`].
    pub fn events(&self) -> Subscriber<ChannelEvent> {
        self.emitter.subscriber()
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    fn transition(&mut self, next: FlowState) {
        log::trace!(target: "lnurlc", "flow `{:?}` -> `{:?}`", self.state, next);
        self.state = next;
    }

    fn terminal(&mut self, outcome: FlowOutcome) -> Option<FlowOutcome> {
        self.transition(FlowState::Terminal);
        Some(outcome)
    }

    fn fail(&mut self, reason: &str) -> Option<FlowOutcome> {
        self.terminal(FlowOutcome::Failure(reason.to_owned()))
    }

    /// Drive the request to its terminal outcome.
    ///
    /// Consumes the flow. Returns `None` when `cancel` fires first:
    /// the pending call is detached and nothing, outcome or event or
    /// log line, escapes the flow afterwards.
    pub async fn run(mut self, request: &ChannelRequest, cancel: Listener) -> Option<FlowOutcome> {
        if abandoned(&cancel) {
            return None;
        }
        log::trace!(target: "lnurlc", "remote node uri: {}", request.uri);
        let address: NodeAddress = match request.uri.parse() {
            Ok(address) => address,
            Err(err) => {
                log::error!(target: "lnurlc", "node uri could not be parsed: {err}");
                return self.fail("invalid remote node data");
            }
        };

        self.transition(FlowState::CheckingPeers);
        if abandoned(&cancel) {
            return None;
        }
        let peers = tokio::select! {
            _ = cancel.clone() => return None,
            peers = self.node.list_peers(self.conf.peer_timeout()) => peers,
        };
        let peers = match peers {
            Ok(peers) => peers,
            Err(err) => {
                log::error!(target: "lnurlc", "error listing peers: {err}");
                return self.fail(classify_lookup(&err));
            }
        };

        let connected = peers
            .iter()
            .any(|peer| peer.public_key == address.public_key);
        if connected {
            log::trace!(target: "lnurlc", "already connected to peer, moving on");
            self.transition(FlowState::AlreadyConnected);
            self.emitter.emit(ChannelEvent::PeerAlreadyConnected {
                node_id: address.public_key.clone(),
            });
        } else {
            log::trace!(target: "lnurlc", "not connected to peer, trying to connect");
            self.transition(FlowState::Connecting);
            if abandoned(&cancel) {
                return None;
            }
            let connect = tokio::select! {
                _ = cancel.clone() => return None,
                result = self.node.connect_peer(&address, self.conf.peer_timeout()) => result,
            };
            if let Err(err) = connect {
                log::error!(target: "lnurlc", "error connecting to peer: {err}");
                return match classify_connect(&err) {
                    Some(reason) => self.fail(reason),
                    // no rule matched, the raw transport message is the
                    // best reason we have
                    None => self.terminal(FlowOutcome::Failure(format!("{err}"))),
                };
            }
            log::trace!(target: "lnurlc", "successfully connected to peer");
            self.emitter.emit(ChannelEvent::PeerConnected {
                node_id: address.public_key.clone(),
            });
        }

        let open = OpenRequest::new(request, &self.local_id);
        self.transition(FlowState::SendingCallback);
        if abandoned(&cancel) {
            return None;
        }
        self.emitter.emit(ChannelEvent::OpenRequested {
            service: service_host(&open.callback),
        });
        let query = open.query();
        let body = tokio::select! {
            _ = cancel.clone() => return None,
            body = self
                .callback
                .get(&open.callback, &query, self.conf.callback_timeout()) => body,
        };
        let body = match body {
            Ok(body) => body,
            Err(err) => {
                log::error!(target: "lnurlc", "final request failed: {err}");
                return self.fail("final request failed");
            }
        };

        self.transition(FlowState::Validating);
        let response = match validate::validate(&body) {
            Ok(response) => response,
            Err(err) => {
                log::error!(target: "lnurlc", "invalid response from service: {err}");
                return self.fail("invalid response from service");
            }
        };
        if response.is_ok() {
            log::debug!(target: "lnurlc", "success, the service initiated the channel opening");
            self.terminal(FlowOutcome::Success)
        } else {
            let reason = response.reason();
            log::error!(target: "lnurlc", "service refused to open the channel: {reason}");
            self.terminal(FlowOutcome::Failure(reason))
        }
    }
}

/// Whether the caller already raised the cancellation signal. A single
/// poll, never blocks.
fn abandoned(cancel: &Listener) -> bool {
    cancel.clone().now_or_never().is_some()
}

/// A timeout, phrased any of the ways our transports phrase one.
fn timed_out(message: &str) -> bool {
    message.contains("terminated") || message.contains("timed out") || message.contains("timeout")
}

fn classify_lookup(err: &error::Error) -> &'static str {
    let message = format!("{err}").to_lowercase();
    if timed_out(&message) {
        "peer lookup timed out"
    } else {
        "peer lookup failed"
    }
}

/// `None` when no classification rule matches.
fn classify_connect(err: &error::Error) -> Option<&'static str> {
    let message = format!("{err}").to_lowercase();
    if message.contains("refused") {
        Some("peer refused connection")
    } else if message.contains("self") {
        Some("cannot connect to self")
    } else if timed_out(&message) {
        Some("peer connection timed out")
    } else {
        None
    }
}

/// Host of the callback url, for display only. A malformed url never
/// aborts the flow at this point.
fn service_host(callback: &str) -> String {
    reqwest::Url::parse(callback)
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_owned()))
        .unwrap_or_else(|| "unknown".to_owned())
}
