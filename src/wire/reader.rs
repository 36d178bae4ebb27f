// ABOUTME: Growable-buffer packet reader: ensure(n), packet decode, and mid-stream resync
// ABOUTME: Refills from a DuplexLink on demand; never owns the socket itself

use std::sync::Arc;

use bytes::{Buf, BytesMut};
use tracing::warn;

use crate::error::{Result, TransportError};
use crate::link::DuplexLink;
use crate::wire::packet::{Packet, PacketKind, SYNC_SEQUENCE};

const REFILL_CHUNK: usize = 4096;

/// Reads packets off a [`DuplexLink`], buffering partial reads and
/// resynchronising on framing corruption.
pub struct PacketReader {
    link: Arc<DuplexLink>,
    buffer: BytesMut,
}

impl PacketReader {
    pub fn new(link: Arc<DuplexLink>) -> Self {
        Self {
            link,
            buffer: BytesMut::new(),
        }
    }

    /// Discard any buffered bytes. Called when the link transitions to
    /// `Disconnected` — stale pre-disconnect bytes must never be stitched
    /// onto a new connection's stream.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Loop reading from the link until at least `n` unconsumed bytes are
    /// buffered.
    async fn ensure(&mut self, n: usize) -> Result<()> {
        while self.buffer.len() < n {
            let chunk = self.link.read(REFILL_CHUNK).await?;
            self.buffer.extend_from_slice(&chunk);
        }
        Ok(())
    }

    /// Read and decode the next packet, resynchronising transparently if
    /// the tag byte doesn't match a known packet kind.
    pub async fn read_packet(&mut self) -> Result<Packet> {
        loop {
            self.ensure(1).await?;
            let tag = self.buffer[0];

            let Ok(kind) = PacketKind::try_from(tag) else {
                self.resync().await?;
                continue;
            };

            match self.try_decode(kind) {
                Ok(Some(packet)) => return Ok(packet),
                Ok(None) => {
                    // Not enough data buffered yet for this packet's body;
                    // read more and retry the same tag.
                    let chunk = self.link.read(REFILL_CHUNK).await?;
                    self.buffer.extend_from_slice(&chunk);
                }
                Err(_) => {
                    // A malformed body behind an otherwise valid tag is
                    // treated the same as an unknown tag: resync past it.
                    self.resync().await?;
                }
            }
        }
    }

    /// Attempt to parse one packet starting at the buffer head. Returns
    /// `Ok(None)` if more bytes are needed, `Err` on malformed framing.
    fn try_decode(&mut self, kind: PacketKind) -> std::result::Result<Option<Packet>, TransportError> {
        let mut cursor = std::io::Cursor::new(&self.buffer[1..]);
        match Packet::decode_body(kind, &mut cursor) {
            Ok(packet) => {
                let consumed = 1 + cursor.position() as usize;
                self.buffer.advance(consumed);
                Ok(Some(packet))
            }
            Err(TransportError::Framing(msg)) if msg.starts_with("truncated") => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Scan the buffer for [`SYNC_SEQUENCE`]; bytes up to and including the
    /// match are discarded. If the buffer is exhausted without a match,
    /// compact and refill from the link, never discarding bytes that have
    /// not yet been checked for the sequence.
    async fn resync(&mut self) -> Result<()> {
        warn!("packet framing corrupted, entering resync");
        loop {
            if let Some(pos) = find_sync_sequence(&self.buffer) {
                self.buffer.advance(pos + SYNC_SEQUENCE.len());
                return Ok(());
            }
            // Keep the last (len - 1) bytes: a sync sequence could start at
            // the very end of the buffer and complete on the next refill.
            let keep_from = self.buffer.len().saturating_sub(SYNC_SEQUENCE.len() - 1);
            self.buffer.advance(keep_from);
            let chunk = self.link.read(REFILL_CHUNK).await?;
            self.buffer.extend_from_slice(&chunk);
        }
    }
}

fn find_sync_sequence(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(SYNC_SEQUENCE.len())
        .position(|window| window == SYNC_SEQUENCE)
}
