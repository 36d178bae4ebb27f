// ABOUTME: Crate root for the bidirectional remote-desktop streaming transport
// ABOUTME: See README/SPEC_FULL.md for the Obedient/Control agent roles this wires together

pub mod agent;
pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod link;
pub mod pipeline;
pub mod primitives;
pub mod task;
pub mod wire;

pub use agent::{ControlAgent, ObedientAgent};
pub use backend::{CaptureStrategy, DecoderStrategy, EncoderStrategy, Frame, Image, InputBackend};
pub use config::{Config, Role};
pub use error::{Result, TransportError};
pub use wire::{ButtonState, FrameKind, MouseButton, Packet, PacketKind, VideoBody, VideoData};

/// # Example
///
/// Wiring an Obedient Agent (the capture/replay side) requires a
/// [`CaptureStrategy`], an [`EncoderStrategy`] and an [`InputBackend`] —
/// the screen grabber, codec and OS input injector are left to the caller.
///
/// ```rust,no_run
/// use deskstream::{Config, ObedientAgent, Role};
/// # use deskstream::{CaptureStrategy, EncoderStrategy, InputBackend, Image, MouseButton};
/// # use std::sync::Arc;
/// # struct NoCapture;
/// # impl CaptureStrategy for NoCapture {
/// #     async fn capture_screen(&self) -> Option<Image> { None }
/// #     fn monitor_width(&self) -> u32 { 0 }
/// #     fn monitor_height(&self) -> u32 { 0 }
/// # }
/// # struct NoEncoder;
/// # impl EncoderStrategy for NoEncoder {
/// #     async fn encode_frame(&self, _w: u32, _h: u32, _rgb: &[u8]) -> Option<bytes::Bytes> { None }
/// # }
/// # struct NoInput;
/// # impl InputBackend for NoInput {
/// #     async fn mouse_move(&self, _x: u32, _y: u32) {}
/// #     async fn mouse_down(&self, _x: u32, _y: u32, _b: MouseButton) {}
/// #     async fn mouse_up(&self, _x: u32, _y: u32, _b: MouseButton) {}
/// #     async fn scroll(&self, _d: i32, _x: u32, _y: u32) {}
/// #     async fn key_down(&self, _k: &str) {}
/// #     async fn key_up(&self, _k: &str) {}
/// # }
/// # async fn run() {
/// let config = Config::new(Role::Server {
///     bind_addr: "0.0.0.0:5900".parse().unwrap(),
/// });
/// let agent = ObedientAgent::new(config, Arc::new(NoCapture), Arc::new(NoEncoder));
/// agent.start(Arc::new(NoInput));
/// agent.stop().await;
/// # }
/// ```
pub const CRATE_NAME: &str = "deskstream";
