// ABOUTME: Trait boundaries for the OS/codec collaborators the core pipelines drive
// ABOUTME: Screen capture, frame encode/decode and input injection are all plugged in here

use std::future::Future;

use bytes::Bytes;

use crate::error::Result;
use crate::wire::packet::VideoData;

/// A captured screen image: packed RGB bytes plus its dimensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub rgb_bytes: Bytes,
}

/// A decoded frame ready for rendering: packed RGB bytes plus dimensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgb_bytes: Bytes,
}

/// Grabs the primary (or selected) display. Implementations are expected to
/// be cheap to call repeatedly from the capture loop; a `None` return is a
/// transient grab failure and the caller skips the frame rather than erroring.
pub trait CaptureStrategy: Send + Sync {
    fn capture_screen(&self) -> impl Future<Output = Option<Image>> + Send;

    fn monitor_width(&self) -> u32;
    fn monitor_height(&self) -> u32;
}

/// Turns a captured image into the nested VideoData body bytes (encoder id,
/// frame kind, encoded blob). The core never reinterprets the returned
/// bytes; it only prefixes them with a length and the outer envelope.
pub trait EncoderStrategy: Send + Sync {
    fn encode_frame(
        &self,
        width: u32,
        height: u32,
        rgb_bytes: &[u8],
    ) -> impl Future<Output = Option<Bytes>> + Send;
}

/// Turns a received [`VideoData`] packet into zero or more renderable
/// frames. Zero frames means "more data is needed before a frame can be
/// produced" (room for a future delta/diff codec), not an error. A
/// transient decode failure (e.g. a corrupted compressed blob) is `Err`;
/// the read-decode pipeline logs it and continues rather than terminating.
pub trait DecoderStrategy: Send + Sync {
    fn decode_packet(&self, video_data: &VideoData) -> impl Future<Output = Result<Vec<Frame>>> + Send;
}

/// Replays input events against the local OS. Every method is infallible
/// from the caller's perspective: implementations swallow their own errors
/// and the replay loop never stops because one event was rejected.
pub trait InputBackend: Send + Sync {
    fn mouse_move(&self, x: u32, y: u32) -> impl Future<Output = ()> + Send;
    fn mouse_down(&self, x: u32, y: u32, button: crate::wire::packet::MouseButton) -> impl Future<Output = ()> + Send;
    fn mouse_up(&self, x: u32, y: u32, button: crate::wire::packet::MouseButton) -> impl Future<Output = ()> + Send;
    fn scroll(&self, delta: i32, x: u32, y: u32) -> impl Future<Output = ()> + Send;
    fn key_down(&self, key_name: &str) -> impl Future<Output = ()> + Send;
    fn key_up(&self, key_name: &str) -> impl Future<Output = ()> + Send;
}
