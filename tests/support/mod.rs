// ABOUTME: Stub CaptureStrategy/EncoderStrategy/DecoderStrategy/InputBackend for integration tests
// ABOUTME: Not picked up as its own test binary — colocated under tests/support/ per cargo convention

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use bytes::Bytes;

use deskstream::{CaptureStrategy, DecoderStrategy, EncoderStrategy, Frame, Image, InputBackend, MouseButton, Result, VideoData};

/// Emits a fixed-size solid image on every call, counting how many times it
/// has been invoked so tests can assert on capture cadence.
pub struct CountingCapture {
    pub width: u32,
    pub height: u32,
    pub calls: AtomicU32,
}

impl CountingCapture {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calls: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CaptureStrategy for CountingCapture {
    async fn capture_screen(&self) -> Option<Image> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Some(Image {
            width: self.width,
            height: self.height,
            rgb_bytes: Bytes::from(vec![0u8; (self.width * self.height) as usize]),
        })
    }

    fn monitor_width(&self) -> u32 {
        self.width
    }

    fn monitor_height(&self) -> u32 {
        self.height
    }
}

/// Pass-through "encoder": the encoded body is just the raw captured bytes.
pub struct IdentityEncoder;

impl EncoderStrategy for IdentityEncoder {
    async fn encode_frame(&self, _width: u32, _height: u32, rgb_bytes: &[u8]) -> Option<Bytes> {
        Some(Bytes::copy_from_slice(rgb_bytes))
    }
}

/// Pass-through decoder: treats the encoded body as already-decoded RGB.
pub struct IdentityDecoder;

impl DecoderStrategy for IdentityDecoder {
    async fn decode_packet(&self, video_data: &VideoData) -> Result<Vec<Frame>> {
        Ok(vec![Frame {
            width: video_data.width,
            height: video_data.height,
            rgb_bytes: video_data.body.encoded_frame.clone(),
        }])
    }
}

#[derive(Default, Debug, Clone, PartialEq)]
pub struct RecordedInput {
    pub moves: Vec<(u32, u32)>,
    pub downs: Vec<(u32, u32, MouseButton)>,
    pub ups: Vec<(u32, u32, MouseButton)>,
    pub scrolls: Vec<(i32, u32, u32)>,
    pub key_downs: Vec<String>,
    pub key_ups: Vec<String>,
}

/// Records every input event it receives instead of touching the OS, so
/// tests can assert exactly what the replay pipeline invoked.
#[derive(Default)]
pub struct RecordingInputBackend {
    pub events: Mutex<RecordedInput>,
}

impl RecordingInputBackend {
    pub fn snapshot(&self) -> RecordedInput {
        self.events.lock().unwrap().clone()
    }
}

impl InputBackend for RecordingInputBackend {
    async fn mouse_move(&self, x: u32, y: u32) {
        self.events.lock().unwrap().moves.push((x, y));
    }

    async fn mouse_down(&self, x: u32, y: u32, button: MouseButton) {
        self.events.lock().unwrap().downs.push((x, y, button));
    }

    async fn mouse_up(&self, x: u32, y: u32, button: MouseButton) {
        self.events.lock().unwrap().ups.push((x, y, button));
    }

    async fn scroll(&self, delta: i32, x: u32, y: u32) {
        self.events.lock().unwrap().scrolls.push((delta, x, y));
    }

    async fn key_down(&self, key_name: &str) {
        self.events.lock().unwrap().key_downs.push(key_name.to_string());
    }

    async fn key_up(&self, key_name: &str) {
        self.events.lock().unwrap().key_ups.push(key_name.to_string());
    }
}
