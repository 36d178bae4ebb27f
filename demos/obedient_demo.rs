// ABOUTME: Minimal runnable Obedient Agent wiring stub backends around the real transport
// ABOUTME: The screen grabber, codec and input backend here are placeholders, not production strategies

use std::sync::Arc;
use std::time::Duration;

use argh::FromArgs;
use bytes::Bytes;

use deskstream::{CaptureStrategy, Config, EncoderStrategy, Image, InputBackend, MouseButton, ObedientAgent, Role};

#[derive(FromArgs)]
/// Obedient Agent demo: captures a stub image and streams it to a Control Agent peer.
struct Args {
    /// address to bind and wait for a Control Agent on
    #[argh(option, default = "String::from(\"0.0.0.0:5900\")")]
    bind: String,

    /// target frames per second
    #[argh(option, default = "30")]
    fps: u32,
}

struct StubCapture;

impl CaptureStrategy for StubCapture {
    async fn capture_screen(&self) -> Option<Image> {
        Some(Image {
            width: 1920,
            height: 1080,
            rgb_bytes: Bytes::from_static(&[0u8; 16]),
        })
    }

    fn monitor_width(&self) -> u32 {
        1920
    }

    fn monitor_height(&self) -> u32 {
        1080
    }
}

struct StubEncoder;

impl EncoderStrategy for StubEncoder {
    async fn encode_frame(&self, _width: u32, _height: u32, rgb_bytes: &[u8]) -> Option<Bytes> {
        Some(Bytes::copy_from_slice(rgb_bytes))
    }
}

struct LoggingInput;

impl InputBackend for LoggingInput {
    async fn mouse_move(&self, x: u32, y: u32) {
        tracing::info!("mouse_move({x}, {y})");
    }

    async fn mouse_down(&self, x: u32, y: u32, button: MouseButton) {
        tracing::info!("mouse_down({x}, {y}, {button:?})");
    }

    async fn mouse_up(&self, x: u32, y: u32, button: MouseButton) {
        tracing::info!("mouse_up({x}, {y}, {button:?})");
    }

    async fn scroll(&self, delta: i32, x: u32, y: u32) {
        tracing::info!("scroll({delta}, {x}, {y})");
    }

    async fn key_down(&self, key_name: &str) {
        tracing::info!("key_down({key_name})");
    }

    async fn key_up(&self, key_name: &str) {
        tracing::info!("key_up({key_name})");
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let args: Args = argh::from_env();

    let mut config = Config::new(Role::Server {
        bind_addr: args.bind.parse().expect("invalid --bind address"),
    });
    config.fps = args.fps;

    let agent = ObedientAgent::new(config, Arc::new(StubCapture), Arc::new(StubEncoder));
    agent.start(Arc::new(LoggingInput));

    tracing::info!("obedient agent running, ctrl-c to stop");
    tokio::signal::ctrl_c().await.expect("failed to listen for ctrl-c");

    agent.stop().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
}
