// ABOUTME: Reads packets off the wire and routes them into per-kind bounded queues (spec C4)
// ABOUTME: Video queue is depth-1 drop-newest; input queues are high-headroom drop-newest

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use crate::error::TransportError;
use crate::link::DuplexLink;
use crate::task::Task;
use crate::wire::packet::{ButtonState, MouseButton, VideoData};
use crate::wire::reader::PacketReader;
use crate::wire::packet::Packet;

/// A single-producer/single-consumer bounded FIFO with drop-newest
/// overflow: when full, the incoming item is discarded and the queue is
/// left unchanged.
pub struct PacketQueue<T> {
    inner: Mutex<VecDeque<T>>,
    capacity: usize,
}

impl<T> PacketQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Returns `true` if the item was enqueued, `false` if it was dropped
    /// because the queue was full.
    pub fn push(&self, item: T) -> bool {
        let mut guard = self.inner.lock().unwrap();
        if guard.len() >= self.capacity {
            return false;
        }
        guard.push_back(item);
        true
    }

    pub fn pop(&self) -> Option<T> {
        self.inner.lock().unwrap().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MouseClickEvent {
    pub button: MouseButton,
    pub state: ButtonState,
    pub x: u32,
    pub y: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MouseMoveEvent {
    pub x: u32,
    pub y: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key_name: String,
    pub state: ButtonState,
}

/// Every per-kind queue a dispatcher feeds. Held behind an `Arc` and
/// shared between the dispatcher task (producer) and exactly one consumer
/// per kind.
pub struct PacketQueues {
    pub video: PacketQueue<VideoData>,
    pub mouse_move: PacketQueue<MouseMoveEvent>,
    pub mouse_click: PacketQueue<MouseClickEvent>,
    pub key_event: PacketQueue<KeyEvent>,
}

impl PacketQueues {
    pub fn new(video_depth: usize, input_depth: usize) -> Arc<Self> {
        Arc::new(Self {
            video: PacketQueue::new(video_depth),
            mouse_move: PacketQueue::new(input_depth),
            mouse_click: PacketQueue::new(input_depth),
            key_event: PacketQueue::new(input_depth),
        })
    }

    fn route(&self, packet: Packet) {
        let enqueued = match packet {
            Packet::Sync => true, // consumed by the reader, nothing to route
            Packet::VideoData(video) => self.video.push(video),
            Packet::MouseMove { x, y } => self.mouse_move.push(MouseMoveEvent { x, y }),
            Packet::MouseClick { button, state, x, y } => {
                self.mouse_click.push(MouseClickEvent { button, state, x, y })
            }
            Packet::KeyEvent { key_name, state } => {
                self.key_event.push(KeyEvent { key_name, state })
            }
        };
        if !enqueued {
            debug!("dropped packet: queue full");
        }
    }
}

/// Loops reading packets off a [`DuplexLink`] and routing them into
/// [`PacketQueues`]. Consumers pop non-blockingly through the queues
/// directly (`queue.pop()`), matching the `get_packet_data` access
/// pattern from the spec.
pub struct Dispatcher {
    task: Task,
    idle_sleep: Duration,
}

impl Dispatcher {
    pub fn new(idle_sleep: Duration) -> Self {
        Self {
            task: Task::new(),
            idle_sleep,
        }
    }

    pub fn start(&self, link: Arc<DuplexLink>, queues: Arc<PacketQueues>) {
        let running = self.task.running_flag();
        let idle_sleep = self.idle_sleep;
        self.task.spawn(async move {
            let mut reader = PacketReader::new(link);
            while running.get() {
                match reader.read_packet().await {
                    Ok(packet) => queues.route(packet),
                    Err(TransportError::NoConnection) => {
                        reader.reset();
                        tokio::time::sleep(idle_sleep).await;
                    }
                    Err(TransportError::NoDataAvailable) => {
                        tokio::time::sleep(idle_sleep).await;
                    }
                    Err(TransportError::Stopped) => break,
                    Err(e) => {
                        tracing::warn!("dispatcher read error: {e}");
                        tokio::time::sleep(idle_sleep).await;
                    }
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
