mod args;

use std::sync::Arc;

use clap::Parser;

use lnurlc::flow::{ChannelOpenFlow, FlowOutcome};
use lnurlc::http::HttpCallback;
use lnurlc_common::conf::LnurlcConf;
use lnurlc_common::error;
use lnurlc_common::event::ChannelEvent;
use lnurlc_common::json;
use lnurlc_common::logger;
use lnurlc_common::model::request::ChannelRequest;
use lnurlc_common::node::NodeControl as _;
use lnurlc_lnd::LndRest;

use crate::args::LnurlcCliArgs;

fn main() -> error::Result<()> {
    let args = LnurlcCliArgs::parse();
    let conf: LnurlcConf = args.clone().try_into()?;
    logger::init(&conf.log_level, conf.log_file.clone())
        .expect("unable to init the logger for the first time");
    run(args, conf)
}

fn run(args: LnurlcCliArgs, conf: LnurlcConf) -> error::Result<()> {
    let request: ChannelRequest = json::from_str(&args.request)
        .map_err(|err| error::anyhow!("invalid channel request: {err}"))?;

    let (trigger, cancel) = triggered::trigger();
    ctrlc::set_handler(move || trigger.trigger())?;

    let conf = Arc::new(conf);
    let node = Arc::new(LndRest::new(&conf.node_url, conf.macaroon.clone())?);
    let callback = Arc::new(HttpCallback::new()?);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let local_id = node.identity(conf.peer_timeout()).await?;
        log::debug!(target: "lnurlc-cli", "wallet identity `{local_id}`");

        let flow = ChannelOpenFlow::new(conf, node, callback, local_id);
        let events = flow.events().subscribe();
        std::thread::spawn(move || {
            while let Ok(event) = events.recv() {
                match event {
                    ChannelEvent::PeerAlreadyConnected { node_id } => {
                        log::info!(target: "lnurlc-cli", "already peered with `{node_id}`")
                    }
                    ChannelEvent::PeerConnected { node_id } => {
                        log::info!(target: "lnurlc-cli", "peered with `{node_id}`")
                    }
                    ChannelEvent::OpenRequested { service } => {
                        println!("waiting for `{service}` to open the channel ...")
                    }
                }
            }
        });

        match flow.run(&request, cancel).await {
            Some(FlowOutcome::Success) => {
                println!("channel open initiated by the service");
                Ok(())
            }
            Some(FlowOutcome::Failure(reason)) => {
                error::bail!("channel open failed: {reason}")
            }
            // ctrl-c: the flow was abandoned, nothing to report
            None => Ok(()),
        }
    })
}
