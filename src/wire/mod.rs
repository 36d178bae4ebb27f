// ABOUTME: Wire-level framing: the packet tagged union (packet) and its reader/writer

pub mod packet;
pub mod reader;
pub mod writer;

pub use packet::{ButtonState, FrameKind, MouseButton, Packet, PacketKind, VideoBody, VideoData};
pub use reader::PacketReader;
pub use writer::PacketWriter;
