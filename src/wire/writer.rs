// ABOUTME: Serialises packets onto a DuplexLink and injects periodic Sync packets
// ABOUTME: Sync injection is timer-driven and re-armed after each injection (spec C3)

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::BytesMut;

use crate::error::Result;
use crate::link::DuplexLink;
use crate::wire::packet::Packet;

/// Writes packets to a [`DuplexLink`], injecting a `Sync` packet ahead of
/// any real packet once `sync_interval` has elapsed since the previous
/// injection. If the writer never writes, no `Sync` is ever emitted.
pub struct PacketWriter {
    link: Arc<DuplexLink>,
    sync_interval: Duration,
    last_sync: Option<Instant>,
}

impl PacketWriter {
    pub fn new(link: Arc<DuplexLink>, sync_interval: Duration) -> Self {
        Self {
            link,
            sync_interval,
            last_sync: None,
        }
    }

    /// Write `packet`, first injecting a `Sync` packet if the interval has
    /// elapsed since the last one.
    pub async fn write_packet(&mut self, packet: &Packet) -> Result<()> {
        self.maybe_inject_sync().await?;
        self.write_raw(packet).await
    }

    /// Force a `Sync` packet immediately and re-arm the cadence timer.
    /// Exposed mainly for tests exercising resync behavior.
    pub async fn inject_sync_now(&mut self) -> Result<()> {
        self.write_raw(&Packet::Sync).await?;
        self.last_sync = Some(Instant::now());
        Ok(())
    }

    async fn maybe_inject_sync(&mut self) -> Result<()> {
        let due = match self.last_sync {
            None => true,
            Some(last) => last.elapsed() >= self.sync_interval,
        };
        if due {
            self.write_raw(&Packet::Sync).await?;
            self.last_sync = Some(Instant::now());
        }
        Ok(())
    }

    async fn write_raw(&self, packet: &Packet) -> Result<()> {
        let mut buf = BytesMut::new();
        packet.encode(&mut buf);
        self.link.write(&buf).await
    }
}
