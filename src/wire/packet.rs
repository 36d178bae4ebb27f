// ABOUTME: The on-wire packet tagged union and its nested VideoData body
// ABOUTME: Encoding/decoding lives here; framing (buffering, resync) lives in wire::reader/writer

use bytes::{Buf, BufMut, Bytes, BytesMut};
use num_enum::TryFromPrimitive;
use std::io::Cursor;

use crate::error::TransportError;

/// The 8-byte payload a `Sync` packet carries and that the reader scans for
/// when it loses framing alignment.
pub const SYNC_SEQUENCE: [u8; 8] = [0x00, 0x01, 0x00, 0x01, 0x00, 0x01, 0x00, 0x01];

/// Tag byte identifying a packet's kind. An unrecognised value is not an
/// error type of its own — the reader treats it as a signal to resync.
#[derive(TryFromPrimitive, Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketKind {
    Sync = 0,
    VideoData = 1,
    MouseClick = 2,
    MouseMove = 3,
    KeyEvent = 4,
}

/// State of a mouse button or key: released or pressed.
#[derive(TryFromPrimitive, Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ButtonState {
    Release = 0,
    Press = 1,
}

/// The four-value mouse button enumeration exercised by the control/obedient
/// handlers (an alternate three-value LEFT/MIDDLE/RIGHT form also appears in
/// the reference implementation's history; this is the canonical one).
#[derive(TryFromPrimitive, Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MouseButton {
    Left = 1,
    WheelUp = 2,
    WheelDown = 3,
    Right = 4,
}

/// Whether a VideoData body is independently decodable or a delta against
/// a prior frame.
#[derive(TryFromPrimitive, Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum FrameKind {
    FullFrame = 1,
    DiffFrame = 2,
}

/// The nested, codec-agnostic body of a VideoData packet: an encoder
/// identifier, a frame kind, and the encoder's opaque output bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoBody {
    pub encoder_id: u32,
    pub frame_kind: FrameKind,
    pub encoded_frame: Bytes,
}

impl VideoBody {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.encoder_id);
        buf.put_u32(self.frame_kind as u32);
        buf.put_u32(self.encoded_frame.len() as u32);
        buf.put_slice(&self.encoded_frame);
    }

    pub fn decode(src: &mut Cursor<&[u8]>) -> Result<Self, TransportError> {
        if src.remaining() < 8 {
            return Err(TransportError::Framing("truncated VideoData body header".into()));
        }
        let encoder_id = src.get_u32();
        let frame_kind_raw = src.get_u32();
        let frame_kind = FrameKind::try_from_primitive(frame_kind_raw).map_err(|_| {
            TransportError::DecodeError(format!("unsupported frame kind {frame_kind_raw}"))
        })?;
        if src.remaining() < 4 {
            return Err(TransportError::Framing("truncated VideoData body length".into()));
        }
        let len = src.get_u32() as usize;
        if src.remaining() < len {
            return Err(TransportError::Framing("truncated VideoData encoded_frame".into()));
        }
        let encoded_frame = Bytes::copy_from_slice(&src.chunk()[..len]);
        src.advance(len);
        Ok(VideoBody {
            encoder_id,
            frame_kind,
            encoded_frame,
        })
    }
}

/// A full VideoData packet: the outer, codec-agnostic capture dimensions
/// plus the nested [`VideoBody`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoData {
    pub width: u32,
    pub height: u32,
    pub body: VideoBody,
}

/// The on-wire packet tagged union (spec §3).
#[derive(Clone, Debug, PartialEq)]
pub enum Packet {
    Sync,
    VideoData(VideoData),
    MouseClick {
        button: MouseButton,
        state: ButtonState,
        x: u32,
        y: u32,
    },
    MouseMove {
        x: u32,
        y: u32,
    },
    KeyEvent {
        key_name: String,
        state: ButtonState,
    },
}

impl Packet {
    pub fn kind(&self) -> PacketKind {
        match self {
            Packet::Sync => PacketKind::Sync,
            Packet::VideoData(_) => PacketKind::VideoData,
            Packet::MouseClick { .. } => PacketKind::MouseClick,
            Packet::MouseMove { .. } => PacketKind::MouseMove,
            Packet::KeyEvent { .. } => PacketKind::KeyEvent,
        }
    }

    /// Serialise this packet (tag byte + payload) onto `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.kind() as u8);
        match self {
            Packet::Sync => {
                buf.put_u32(SYNC_SEQUENCE.len() as u32);
                buf.put_slice(&SYNC_SEQUENCE);
            }
            Packet::VideoData(video) => {
                buf.put_u32(video.width);
                buf.put_u32(video.height);
                let mut body_buf = BytesMut::new();
                video.body.encode(&mut body_buf);
                buf.put_u32(body_buf.len() as u32);
                buf.put_slice(&body_buf);
            }
            Packet::MouseClick {
                button,
                state,
                x,
                y,
            } => {
                buf.put_u8(*button as u8);
                buf.put_u8(*state as u8);
                buf.put_u32(*x);
                buf.put_u32(*y);
            }
            Packet::MouseMove { x, y } => {
                buf.put_u32(*x);
                buf.put_u32(*y);
            }
            Packet::KeyEvent { key_name, state } => {
                let bytes = key_name.as_bytes();
                buf.put_u32(bytes.len() as u32);
                buf.put_slice(bytes);
                buf.put_u8(*state as u8);
            }
        }
    }

    /// Decode the payload belonging to `kind` from `src`. Assumes the tag
    /// byte has already been consumed by the caller (see `wire::reader`).
    pub fn decode_body(kind: PacketKind, src: &mut Cursor<&[u8]>) -> Result<Packet, TransportError> {
        match kind {
            PacketKind::Sync => {
                let len = read_u32(src)?;
                let body = read_exact(src, len as usize)?;
                if body.as_ref() != SYNC_SEQUENCE {
                    return Err(TransportError::Framing("malformed Sync payload".into()));
                }
                Ok(Packet::Sync)
            }
            PacketKind::VideoData => {
                let width = read_u32(src)?;
                let height = read_u32(src)?;
                let body_len = read_u32(src)? as usize;
                let body_bytes = read_exact(src, body_len)?;
                let mut body_cursor = Cursor::new(body_bytes.as_ref());
                let body = VideoBody::decode(&mut body_cursor)?;
                Ok(Packet::VideoData(VideoData {
                    width,
                    height,
                    body,
                }))
            }
            PacketKind::MouseClick => {
                let button_raw = read_u8(src)?;
                let button = MouseButton::try_from_primitive(button_raw)
                    .map_err(|_| TransportError::Framing(format!("bad mouse button {button_raw}")))?;
                let state_raw = read_u8(src)?;
                let state = ButtonState::try_from_primitive(state_raw)
                    .map_err(|_| TransportError::Framing(format!("bad button state {state_raw}")))?;
                let x = read_u32(src)?;
                let y = read_u32(src)?;
                Ok(Packet::MouseClick {
                    button,
                    state,
                    x,
                    y,
                })
            }
            PacketKind::MouseMove => {
                let x = read_u32(src)?;
                let y = read_u32(src)?;
                Ok(Packet::MouseMove { x, y })
            }
            PacketKind::KeyEvent => {
                let len = read_u32(src)?;
                let name_bytes = read_exact(src, len as usize)?;
                let key_name = String::from_utf8(name_bytes.to_vec())
                    .map_err(|e| TransportError::Framing(format!("bad key name: {e}")))?;
                let state_raw = read_u8(src)?;
                let state = ButtonState::try_from_primitive(state_raw)
                    .map_err(|_| TransportError::Framing(format!("bad button state {state_raw}")))?;
                Ok(Packet::KeyEvent { key_name, state })
            }
        }
    }
}

fn read_u8(src: &mut Cursor<&[u8]>) -> Result<u8, TransportError> {
    if src.remaining() < 1 {
        return Err(TransportError::Framing("truncated u8".into()));
    }
    Ok(src.get_u8())
}

fn read_u32(src: &mut Cursor<&[u8]>) -> Result<u32, TransportError> {
    if src.remaining() < 4 {
        return Err(TransportError::Framing("truncated u32".into()));
    }
    Ok(src.get_u32())
}

fn read_exact(src: &mut Cursor<&[u8]>, len: usize) -> Result<Bytes, TransportError> {
    if src.remaining() < len {
        return Err(TransportError::Framing("truncated length-prefixed field".into()));
    }
    let out = Bytes::copy_from_slice(&src.chunk()[..len]);
    src.advance(len);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(packet: Packet) {
        let mut buf = BytesMut::new();
        packet.encode(&mut buf);
        let tag = buf[0];
        let kind = PacketKind::try_from_primitive(tag).unwrap();
        let mut cursor = Cursor::new(&buf[1..]);
        let decoded = Packet::decode_body(kind, &mut cursor).unwrap();
        assert_eq!(decoded, packet);
        assert_eq!(cursor.position() as usize, buf.len() - 1);
    }

    #[test]
    fn sync_round_trips() {
        roundtrip(Packet::Sync);
    }

    #[test]
    fn video_data_round_trips() {
        roundtrip(Packet::VideoData(VideoData {
            width: 1920,
            height: 1080,
            body: VideoBody {
                encoder_id: 1,
                frame_kind: FrameKind::FullFrame,
                encoded_frame: Bytes::from_static(b"pretend-jpeg-bytes"),
            },
        }));
    }

    #[test]
    fn mouse_click_round_trips() {
        roundtrip(Packet::MouseClick {
            button: MouseButton::Left,
            state: ButtonState::Press,
            x: 100,
            y: 200,
        });
    }

    #[test]
    fn mouse_move_round_trips() {
        roundtrip(Packet::MouseMove { x: 42, y: 7 });
    }

    #[test]
    fn key_event_round_trips() {
        roundtrip(Packet::KeyEvent {
            key_name: "Return".to_string(),
            state: ButtonState::Release,
        });
    }

    /// Scenario 4: on-wire bytes for a left mouse-button press at (100, 200).
    #[test]
    fn mouse_click_matches_documented_wire_bytes() {
        let packet = Packet::MouseClick {
            button: MouseButton::Left,
            state: ButtonState::Press,
            x: 100,
            y: 200,
        };
        let mut buf = BytesMut::new();
        packet.encode(&mut buf);
        assert_eq!(
            &buf[..],
            &[0x02, 0x01, 0x01, 0x00, 0x00, 0x00, 0x64, 0x00, 0x00, 0x00, 0xC8][..]
        );
    }

    /// Scenario 5: the writer's injected Sync packet byte layout.
    #[test]
    fn sync_packet_matches_documented_wire_bytes() {
        let mut buf = BytesMut::new();
        Packet::Sync.encode(&mut buf);
        assert_eq!(
            &buf[..],
            &[0x00, 0x00, 0x00, 0x00, 0x08, 0x00, 0x01, 0x00, 0x01, 0x00, 0x01, 0x00, 0x01][..]
        );
    }

    #[test]
    fn unknown_tag_is_not_a_packet_kind() {
        assert!(PacketKind::try_from_primitive(99).is_err());
    }

    #[test]
    fn diff_frame_decode_is_rejected() {
        // DIFF_FRAME is accepted as a valid tag (Open Question 2: treated as
        // an unimplemented decode branch, not a framing error) ...
        let mut body_buf = BytesMut::new();
        body_buf.put_u32(1);
        body_buf.put_u32(FrameKind::DiffFrame as u32);
        body_buf.put_u32(4);
        body_buf.put_slice(b"data");
        let mut cursor = Cursor::new(&body_buf[..]);
        // ... FrameKind itself decodes fine; rejection happens one layer up,
        // in the decode pipeline which treats DiffFrame as a DecodeError.
        let body = VideoBody::decode(&mut cursor).unwrap();
        assert_eq!(body.frame_kind, FrameKind::DiffFrame);
    }

    #[test]
    fn concatenated_packets_decode_in_order() {
        let packets = vec![
            Packet::MouseMove { x: 1, y: 2 },
            Packet::MouseMove { x: 3, y: 4 },
            Packet::Sync,
        ];
        let mut buf = BytesMut::new();
        for p in &packets {
            p.encode(&mut buf);
        }
        let mut remaining = &buf[..];
        for expected in &packets {
            let tag = remaining[0];
            let kind = PacketKind::try_from_primitive(tag).unwrap();
            let mut cursor = Cursor::new(&remaining[1..]);
            let decoded = Packet::decode_body(kind, &mut cursor).unwrap();
            assert_eq!(&decoded, expected);
            let consumed = 1 + cursor.position() as usize;
            remaining = &remaining[consumed..];
        }
        assert!(remaining.is_empty());
    }
}
