//! Channel open flow tests against mocked transports.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use lnurlc::flow::{ChannelOpenFlow, FlowOutcome, FlowState};
use lnurlc_common::callback::CallbackClient;
use lnurlc_common::conf::LnurlcConf;
use lnurlc_common::error;
use lnurlc_common::event::ChannelEvent;
use lnurlc_common::model::request::ChannelRequest;
use lnurlc_common::model::NodeAddress;
use lnurlc_common::node::{NodeControl, Peer};

use crate::init;

const LOCAL_ID: &str = "03beef00112233445566778899aabbccddeeff00112233445566778899aabbccdd";
const REMOTE_ID: &str = "02aa11bb22cc33dd44ee55ff6677889900aabbccddeeff112233445566778899aa";

struct MockNode {
    peers: Result<Vec<Peer>, String>,
    connect: Result<(), String>,
    delay: Option<Duration>,
    list_calls: AtomicUsize,
    connect_calls: AtomicUsize,
}

impl MockNode {
    fn with_peers(peers: &[&str]) -> Self {
        Self {
            peers: Ok(peers
                .iter()
                .map(|public_key| Peer {
                    public_key: (*public_key).to_owned(),
                })
                .collect()),
            connect: Ok(()),
            delay: None,
            list_calls: AtomicUsize::new(0),
            connect_calls: AtomicUsize::new(0),
        }
    }

    fn lookup_failure(message: &str) -> Self {
        Self {
            peers: Err(message.to_owned()),
            ..Self::with_peers(&[])
        }
    }

    fn connect_failure(message: &str) -> Self {
        Self {
            connect: Err(message.to_owned()),
            ..Self::with_peers(&[])
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::with_peers(&[])
        }
    }
}

#[async_trait]
impl NodeControl for MockNode {
    async fn list_peers(&self, _timeout: Duration) -> error::Result<Vec<Peer>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.peers {
            Ok(peers) => Ok(peers.clone()),
            Err(message) => error::bail!("{message}"),
        }
    }

    async fn connect_peer(&self, _addr: &NodeAddress, _timeout: Duration) -> error::Result<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        match &self.connect {
            Ok(()) => Ok(()),
            Err(message) => error::bail!("{message}"),
        }
    }

    async fn identity(&self, _timeout: Duration) -> error::Result<String> {
        Ok(LOCAL_ID.to_owned())
    }
}

struct MockCallback {
    body: Result<String, String>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl MockCallback {
    fn with_body(body: &str) -> Self {
        Self {
            body: Ok(body.to_owned()),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            body: Err(message.to_owned()),
            ..Self::with_body("")
        }
    }
}

#[async_trait]
impl CallbackClient for MockCallback {
    async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
        _timeout: Duration,
    ) -> error::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((url.to_owned(), params.to_vec()));
        match &self.body {
            Ok(body) => Ok(body.clone()),
            Err(message) => error::bail!("{message}"),
        }
    }
}

fn request() -> ChannelRequest {
    // the exact record shape the upstream LNURL decoding hands over
    serde_json::from_str(&format!(
        r#"{{"tag":"channelRequest","callback":"https://svc.example/cb","k1":"abc","uri":"{REMOTE_ID}@10.0.0.1:9735"}}"#
    ))
    .expect("channel request fixture")
}

fn flow(node: Arc<MockNode>, callback: Arc<MockCallback>) -> ChannelOpenFlow {
    let conf = Arc::new(LnurlcConf::new("https://127.0.0.1:8080"));
    ChannelOpenFlow::new(conf, node, callback, LOCAL_ID.to_owned())
}

#[tokio::test]
async fn already_connected_skips_connect_and_succeeds() {
    init();
    let node = Arc::new(MockNode::with_peers(&[REMOTE_ID]));
    let callback = Arc::new(MockCallback::with_body(r#"{"status":"OK"}"#));
    let flow = flow(node.clone(), callback.clone());
    assert_eq!(flow.state(), FlowState::Idle);

    let (_trigger, cancel) = triggered::trigger();
    let outcome = flow.run(&request(), cancel).await;
    log::debug!("outcome: {:?}", outcome);

    assert_eq!(outcome, Some(FlowOutcome::Success));
    assert_eq!(node.list_calls.load(Ordering::SeqCst), 1);
    assert_eq!(node.connect_calls.load(Ordering::SeqCst), 0);
    assert_eq!(callback.calls.load(Ordering::SeqCst), 1);

    let seen = callback.seen.lock().unwrap();
    let (url, params) = &seen[0];
    assert_eq!(url, "https://svc.example/cb");
    assert_eq!(
        params,
        &vec![
            ("k1".to_owned(), "abc".to_owned()),
            ("remoteid".to_owned(), LOCAL_ID.to_owned()),
            ("private".to_owned(), "0".to_owned()),
        ]
    );
}

#[tokio::test]
async fn connects_when_not_peered() {
    init();
    let node = Arc::new(MockNode::with_peers(&[]));
    let callback = Arc::new(MockCallback::with_body(r#"{"status":"OK"}"#));
    let flow = flow(node.clone(), callback.clone());

    let (_trigger, cancel) = triggered::trigger();
    let outcome = flow.run(&request(), cancel).await;

    assert_eq!(outcome, Some(FlowOutcome::Success));
    assert_eq!(node.connect_calls.load(Ordering::SeqCst), 1);
    assert_eq!(callback.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn refused_connect_never_sends_callback() {
    init();
    let node = Arc::new(MockNode::connect_failure("dial tcp: connection refused"));
    let callback = Arc::new(MockCallback::with_body(r#"{"status":"OK"}"#));
    let flow = flow(node.clone(), callback.clone());

    let (_trigger, cancel) = triggered::trigger();
    let outcome = flow.run(&request(), cancel).await;

    assert_eq!(
        outcome,
        Some(FlowOutcome::Failure("peer refused connection".to_owned()))
    );
    assert_eq!(callback.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn lookup_terminated_is_a_timeout() {
    init();
    let node = Arc::new(MockNode::lookup_failure(
        "The source did not signal an event and has been terminated",
    ));
    let callback = Arc::new(MockCallback::with_body(r#"{"status":"OK"}"#));
    let flow = flow(node, callback.clone());

    let (_trigger, cancel) = triggered::trigger();
    let outcome = flow.run(&request(), cancel).await;

    assert_eq!(
        outcome,
        Some(FlowOutcome::Failure("peer lookup timed out".to_owned()))
    );
    assert_eq!(callback.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn lookup_failure_is_generic() {
    init();
    let node = Arc::new(MockNode::lookup_failure("UNAVAILABLE: connection closed"));
    let callback = Arc::new(MockCallback::with_body(r#"{"status":"OK"}"#));
    let flow = flow(node, callback);

    let (_trigger, cancel) = triggered::trigger();
    let outcome = flow.run(&request(), cancel).await;

    assert_eq!(
        outcome,
        Some(FlowOutcome::Failure("peer lookup failed".to_owned()))
    );
}

#[tokio::test]
async fn connect_to_self_is_classified() {
    init();
    let node = Arc::new(MockNode::connect_failure("cannot make connection to self"));
    let callback = Arc::new(MockCallback::with_body(r#"{"status":"OK"}"#));
    let flow = flow(node, callback);

    let (_trigger, cancel) = triggered::trigger();
    let outcome = flow.run(&request(), cancel).await;

    assert_eq!(
        outcome,
        Some(FlowOutcome::Failure("cannot connect to self".to_owned()))
    );
}

#[tokio::test]
async fn connect_timeout_is_classified() {
    init();
    let node = Arc::new(MockNode::connect_failure("peer connection timed out after 10s"));
    let callback = Arc::new(MockCallback::with_body(r#"{"status":"OK"}"#));
    let flow = flow(node, callback);

    let (_trigger, cancel) = triggered::trigger();
    let outcome = flow.run(&request(), cancel).await;

    assert_eq!(
        outcome,
        Some(FlowOutcome::Failure("peer connection timed out".to_owned()))
    );
}

#[tokio::test]
async fn unclassified_connect_error_keeps_raw_message() {
    init();
    let node = Arc::new(MockNode::connect_failure("chain backend is rescanning"));
    let callback = Arc::new(MockCallback::with_body(r#"{"status":"OK"}"#));
    let flow = flow(node, callback);

    let (_trigger, cancel) = triggered::trigger();
    let outcome = flow.run(&request(), cancel).await;

    assert_eq!(
        outcome,
        Some(FlowOutcome::Failure(
            "chain backend is rescanning".to_owned()
        ))
    );
}

#[tokio::test]
async fn callback_transport_failure() {
    init();
    let node = Arc::new(MockNode::with_peers(&[REMOTE_ID]));
    let callback = Arc::new(MockCallback::failing("connection reset by peer"));
    let flow = flow(node, callback.clone());

    let (_trigger, cancel) = triggered::trigger();
    let outcome = flow.run(&request(), cancel).await;

    assert_eq!(
        outcome,
        Some(FlowOutcome::Failure("final request failed".to_owned()))
    );
    assert_eq!(callback.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn garbage_body_is_an_invalid_response() {
    init();
    let node = Arc::new(MockNode::with_peers(&[REMOTE_ID]));
    let callback = Arc::new(MockCallback::with_body("not-json"));
    let flow = flow(node, callback);

    let (_trigger, cancel) = triggered::trigger();
    let outcome = flow.run(&request(), cancel).await;

    assert_eq!(
        outcome,
        Some(FlowOutcome::Failure(
            "invalid response from service".to_owned()
        ))
    );
}

#[tokio::test]
async fn empty_object_is_an_invalid_response() {
    init();
    let node = Arc::new(MockNode::with_peers(&[REMOTE_ID]));
    let callback = Arc::new(MockCallback::with_body("{}"));
    let flow = flow(node, callback);

    let (_trigger, cancel) = triggered::trigger();
    let outcome = flow.run(&request(), cancel).await;

    assert_eq!(
        outcome,
        Some(FlowOutcome::Failure(
            "invalid response from service".to_owned()
        ))
    );
}

#[tokio::test]
async fn service_rejection_reason_is_surfaced() {
    init();
    let node = Arc::new(MockNode::with_peers(&[REMOTE_ID]));
    let callback = Arc::new(MockCallback::with_body(
        r#"{"status":"ERROR","reason":"no liquidity"}"#,
    ));
    let flow = flow(node, callback);

    let (_trigger, cancel) = triggered::trigger();
    let outcome = flow.run(&request(), cancel).await;

    assert_eq!(outcome, Some(FlowOutcome::Failure("no liquidity".to_owned())));
}

#[tokio::test]
async fn invalid_uri_fails_without_touching_the_network() {
    init();
    let node = Arc::new(MockNode::with_peers(&[REMOTE_ID]));
    let callback = Arc::new(MockCallback::with_body(r#"{"status":"OK"}"#));
    let flow = flow(node.clone(), callback.clone());

    let mut request = request();
    request.uri = "svc.example:9735".to_owned();

    let (_trigger, cancel) = triggered::trigger();
    let outcome = flow.run(&request, cancel).await;

    assert_eq!(
        outcome,
        Some(FlowOutcome::Failure("invalid remote node data".to_owned()))
    );
    assert_eq!(node.list_calls.load(Ordering::SeqCst), 0);
    assert_eq!(callback.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancel_before_start_produces_no_outcome() {
    init();
    let node = Arc::new(MockNode::with_peers(&[REMOTE_ID]));
    let callback = Arc::new(MockCallback::with_body(r#"{"status":"OK"}"#));
    let flow = flow(node.clone(), callback.clone());

    let (trigger, cancel) = triggered::trigger();
    trigger.trigger();
    let outcome = flow.run(&request(), cancel).await;

    assert_eq!(outcome, None);
    assert_eq!(node.list_calls.load(Ordering::SeqCst), 0);
    assert_eq!(callback.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancel_during_lookup_detaches_the_result() {
    init();
    let node = Arc::new(MockNode::slow(Duration::from_millis(500)));
    let callback = Arc::new(MockCallback::with_body(r#"{"status":"OK"}"#));
    let flow = flow(node.clone(), callback.clone());

    let (trigger, cancel) = triggered::trigger();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.trigger();
    });
    let outcome = flow.run(&request(), cancel).await;

    assert_eq!(outcome, None);
    assert_eq!(node.list_calls.load(Ordering::SeqCst), 1);
    assert_eq!(node.connect_calls.load(Ordering::SeqCst), 0);
    assert_eq!(callback.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn open_requested_event_is_emitted_once() {
    init();
    let node = Arc::new(MockNode::with_peers(&[]));
    let callback = Arc::new(MockCallback::with_body(r#"{"status":"OK"}"#));
    let flow = flow(node, callback);
    let events = flow.events().subscribe();

    let (_trigger, cancel) = triggered::trigger();
    let outcome = flow.run(&request(), cancel).await;
    assert_eq!(outcome, Some(FlowOutcome::Success));

    let mut open_requested = 0;
    while let Ok(event) = events.try_recv() {
        if let ChannelEvent::OpenRequested { service } = event {
            assert_eq!(service, "svc.example");
            open_requested += 1;
        }
    }
    assert_eq!(open_requested, 1);
}
