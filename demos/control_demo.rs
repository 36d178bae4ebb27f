// ABOUTME: Minimal runnable Control Agent wiring a stub decoder around the real transport
// ABOUTME: Prints frame arrivals instead of rendering them; a stand-in for the windowing layer

use std::sync::Arc;
use std::time::Duration;

use argh::FromArgs;

use deskstream::{Config, ControlAgent, DecoderStrategy, Frame, Role, VideoData};

#[derive(FromArgs)]
/// Control Agent demo: connects to an Obedient Agent and logs incoming frames.
struct Args {
    /// host of the Obedient Agent to connect to
    #[argh(option, default = "String::from(\"127.0.0.1\")")]
    host: String,

    /// port of the Obedient Agent to connect to
    #[argh(option, default = "5900")]
    port: u16,
}

struct StubDecoder;

impl DecoderStrategy for StubDecoder {
    async fn decode_packet(&self, video_data: &VideoData) -> deskstream::Result<Vec<Frame>> {
        Ok(vec![Frame {
            width: video_data.width,
            height: video_data.height,
            rgb_bytes: video_data.body.encoded_frame.clone(),
        }])
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let args: Args = argh::from_env();

    let config = Config::new(Role::Client {
        host: args.host,
        port: args.port,
    });

    let agent = Arc::new(ControlAgent::new(config));
    agent.start(Arc::new(StubDecoder));

    tracing::info!("control agent running, ctrl-c to stop");
    let poller = {
        let agent = Arc::clone(&agent);
        tokio::spawn(async move {
            loop {
                if let Some((video_data, frames)) = agent.poll_frame() {
                    tracing::info!(
                        "received {}x{} frame, decoded into {} image(s)",
                        video_data.width,
                        video_data.height,
                        frames.len()
                    );
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
    };

    tokio::signal::ctrl_c().await.expect("failed to listen for ctrl-c");
    poller.abort();
    agent.stop().await;
}
