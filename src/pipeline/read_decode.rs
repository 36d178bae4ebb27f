// ABOUTME: Read -> decode pipeline, one task per spec C6
// ABOUTME: Pops VideoData from the dispatcher's video queue, decodes, fans out a drop-newest output queue

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::warn;

use crate::backend::{DecoderStrategy, Frame};
use crate::dispatch::PacketQueue;
use crate::dispatch::PacketQueues;
use crate::primitives::FrameRateCalculator;
use crate::task::Task;
use crate::wire::packet::VideoData;

/// A decoded VideoData packet alongside the frame(s) its decoder produced.
pub type DecodedFrame = (VideoData, Vec<Frame>);

/// Pops VideoData packets from the dispatcher, decodes them, and places
/// the result on a single-element drop-newest output queue. A renderer
/// polls `output` non-blockingly; this pipeline never terminates on a
/// decode error, it logs and continues.
pub struct ReadDecodePipeline {
    task: Task,
    output: Arc<PacketQueue<DecodedFrame>>,
    rate: Arc<Mutex<FrameRateCalculator>>,
}

impl ReadDecodePipeline {
    pub fn new(window: Duration) -> Self {
        Self {
            task: Task::new(),
            output: Arc::new(PacketQueue::new(1)),
            rate: Arc::new(Mutex::new(FrameRateCalculator::new(window))),
        }
    }

    pub fn output(&self) -> &PacketQueue<DecodedFrame> {
        &self.output
    }

    /// The achieved decode rate over the configured window, for diagnostics.
    pub fn decode_rate(&self) -> f64 {
        self.rate.lock().unwrap().rate()
    }

    pub fn start<D>(&self, queues: Arc<PacketQueues>, decoder: Arc<D>, idle_sleep: Duration)
    where
        D: DecoderStrategy + 'static,
    {
        let running = self.task.running_flag();
        let output = Arc::clone(&self.output);
        let rate = Arc::clone(&self.rate);
        self.task.spawn(async move {
            while running.get() {
                let Some(video_data) = queues.video.pop() else {
                    tokio::time::sleep(idle_sleep).await;
                    continue;
                };

                match decoder.decode_packet(&video_data).await {
                    Ok(frames) => {
                        rate.lock().unwrap().tick();
                        output.push((video_data, frames));
                    }
                    Err(e) => warn!("decode error, dropping packet: {e}"),
                }
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
