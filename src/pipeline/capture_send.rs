// ABOUTME: Capture -> encode -> send pipeline, one paced task per spec C5
// ABOUTME: Runs on the Obedient Agent; strategy cells allow live rate/quality swaps

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::backend::{CaptureStrategy, EncoderStrategy};
use crate::link::DuplexLink;
use crate::primitives::{FrameRateLimiter, MutexCell};
use crate::task::Task;
use crate::wire::packet::{FrameKind, Packet, VideoBody, VideoData};
use crate::wire::writer::PacketWriter;

const DEFAULT_ENCODER_ID: u32 = 1;

/// One paced task: grab a frame, encode it, write it. Capture and encoder
/// strategies live in mutex cells so they can be swapped without
/// restarting the loop.
pub struct CaptureSendPipeline<C, E> {
    task: Task,
    capture: Arc<MutexCell<Arc<C>>>,
    encoder: Arc<MutexCell<Arc<E>>>,
}

impl<C, E> CaptureSendPipeline<C, E>
where
    C: CaptureStrategy + 'static,
    E: EncoderStrategy + 'static,
{
    pub fn new(capture: Arc<C>, encoder: Arc<E>) -> Self {
        Self {
            task: Task::new(),
            capture: Arc::new(MutexCell::new(capture)),
            encoder: Arc::new(MutexCell::new(encoder)),
        }
    }

    /// Swap the active capture strategy without stopping the pipeline.
    pub fn set_capture(&self, capture: Arc<C>) {
        self.capture.set(capture);
    }

    /// Swap the active encoder strategy without stopping the pipeline.
    pub fn set_encoder(&self, encoder: Arc<E>) {
        self.encoder.set(encoder);
    }

    pub fn start(&self, link: Arc<DuplexLink>, fps: u32, sync_interval: Duration) {
        let running = self.task.running_flag();
        let capture_cell = Arc::clone(&self.capture);
        let encoder_cell = Arc::clone(&self.encoder);
        self.task.spawn(async move {
            let mut writer = PacketWriter::new(link, sync_interval);
            let mut limiter = FrameRateLimiter::new(fps);
            while running.get() {
                let capture = capture_cell.get();
                let encoder = encoder_cell.get();

                if let Some(image) = capture.capture_screen().await {
                    if let Some(encoded) = encoder
                        .encode_frame(image.width, image.height, &image.rgb_bytes)
                        .await
                    {
                        let packet = Packet::VideoData(VideoData {
                            width: image.width,
                            height: image.height,
                            body: VideoBody {
                                encoder_id: DEFAULT_ENCODER_ID,
                                frame_kind: FrameKind::FullFrame,
                                encoded_frame: encoded,
                            },
                        });
                        if let Err(e) = writer.write_packet(&packet).await {
                            debug!("capture-send: frame discarded, {e}");
                        }
                    }
                }

                limiter.tick().await;
            }
        });
    }

    pub async fn stop(&self) {
        self.task.stop().await;
    }

    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }
}
