//! LNURL-channel client implementation.
//!
//! A service hands us a channel request record; we make sure our node
//! has a peer connection to the node the record names, confirm on the
//! service's callback, and report one terminal outcome.
pub mod flow;
pub mod http;
pub mod validate;

pub use flow::{ChannelOpenFlow, FlowOutcome, FlowState};
