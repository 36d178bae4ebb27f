// ABOUTME: The three staged pipelines that sit on top of the link/wire/dispatch layers
// ABOUTME: Capture->encode->send and read->decode run on the Control/Obedient sides respectively

pub mod capture_send;
pub mod input_replay;
pub mod read_decode;

pub use capture_send::CaptureSendPipeline;
pub use input_replay::InputReplayPipeline;
pub use read_decode::{DecodedFrame, ReadDecodePipeline};
