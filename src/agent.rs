// ABOUTME: Endpoint wiring: composes link + dispatcher + pipelines into the Obedient and Control roles
// ABOUTME: Thin composition root, analogous to the teacher's DefaultClient — no protocol logic of its own

use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;

use crate::backend::{CaptureStrategy, DecoderStrategy, EncoderStrategy, InputBackend};
use crate::config::Config;
use crate::dispatch::{Dispatcher, PacketQueues};
use crate::link::DuplexLink;
use crate::pipeline::{CaptureSendPipeline, DecodedFrame, InputReplayPipeline, ReadDecodePipeline};
use crate::wire::packet::{ButtonState, MouseButton, Packet};
use crate::wire::writer::PacketWriter;

/// The endpoint that captures its own screen, streams it out, and replays
/// input received from a Control Agent peer.
pub struct ObedientAgent<C, E> {
    link: Arc<DuplexLink>,
    dispatcher: Dispatcher,
    queues: Arc<PacketQueues>,
    capture_send: CaptureSendPipeline<C, E>,
    input_replay: InputReplayPipeline,
    config: Config,
}

impl<C, E> ObedientAgent<C, E>
where
    C: CaptureStrategy + 'static,
    E: EncoderStrategy + 'static,
{
    pub fn new(config: Config, capture: Arc<C>, encoder: Arc<E>) -> Self {
        Self {
            link: Arc::new(DuplexLink::new(config.role.clone(), config.retry_timeout)),
            dispatcher: Dispatcher::new(config.dispatcher_idle_sleep),
            queues: PacketQueues::new(config.video_queue_depth, config.input_queue_depth),
            capture_send: CaptureSendPipeline::new(capture, encoder),
            input_replay: InputReplayPipeline::new(),
            config,
        }
    }

    pub fn start<I>(&self, input_backend: Arc<I>)
    where
        I: InputBackend + 'static,
    {
        self.link.start();
        self.dispatcher.start(Arc::clone(&self.link), Arc::clone(&self.queues));
        self.capture_send
            .start(Arc::clone(&self.link), self.config.fps, self.config.sync_interval);
        self.input_replay.start(
            Arc::clone(&self.queues),
            input_backend,
            self.config.dispatcher_idle_sleep,
        );
    }

    /// Stops the link first: that closes the socket, which is what
    /// unblocks the dispatcher's task if it is parked waiting for the next
    /// packet from a peer that never sends one. Stopping the dispatcher (or
    /// the pipelines) before the link would instead wait on that same
    /// parked read forever.
    pub async fn stop(&self) {
        self.link.stop().await;
        self.dispatcher.stop().await;
        self.capture_send.stop().await;
        self.input_replay.stop().await;
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }
}

/// The endpoint that renders a remote screen and sends user input back to
/// an Obedient Agent peer.
pub struct ControlAgent {
    link: Arc<DuplexLink>,
    dispatcher: Dispatcher,
    queues: Arc<PacketQueues>,
    read_decode: ReadDecodePipeline,
    writer: AsyncMutex<PacketWriter>,
    config: Config,
}

impl ControlAgent {
    pub fn new(config: Config) -> Self {
        let link = Arc::new(DuplexLink::new(config.role.clone(), config.retry_timeout));
        let writer = AsyncMutex::new(PacketWriter::new(Arc::clone(&link), config.sync_interval));
        Self {
            link,
            dispatcher: Dispatcher::new(config.dispatcher_idle_sleep),
            queues: PacketQueues::new(config.video_queue_depth, config.input_queue_depth),
            read_decode: ReadDecodePipeline::new(config.bandwidth_window),
            writer,
            config,
        }
    }

    pub fn start<D>(&self, decoder: Arc<D>)
    where
        D: DecoderStrategy + 'static,
    {
        self.link.start();
        self.dispatcher.start(Arc::clone(&self.link), Arc::clone(&self.queues));
        self.read_decode.start(
            Arc::clone(&self.queues),
            decoder,
            self.config.dispatcher_idle_sleep,
        );
    }

    /// See [`ObedientAgent::stop`]: the link must close first so a
    /// dispatcher task parked waiting for the next packet is unblocked
    /// before anything tries to join it.
    pub async fn stop(&self) {
        self.link.stop().await;
        self.dispatcher.stop().await;
        self.read_decode.stop().await;
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    /// Next decoded frame for the renderer, if one is ready.
    pub fn poll_frame(&self) -> Option<DecodedFrame> {
        self.read_decode.output().pop()
    }

    pub async fn send_mouse_move(&self, x: u32, y: u32) {
        self.send(Packet::MouseMove { x, y }).await;
    }

    pub async fn send_mouse_click(&self, x: u32, y: u32, button: MouseButton, state: ButtonState) {
        self.send(Packet::MouseClick { button, state, x, y }).await;
    }

    pub async fn send_key_event(&self, key_name: impl Into<String>, state: ButtonState) {
        self.send(Packet::KeyEvent {
            key_name: key_name.into(),
            state,
        })
        .await;
    }

    async fn send(&self, packet: Packet) {
        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.write_packet(&packet).await {
            tracing::debug!("control agent: input event dropped, {e}");
        }
    }
}
