// ABOUTME: Input replay pipeline, C7 -- Obedient-side only
// ABOUTME: Drains the dispatcher's three input queues and replays each event against the OS backend

use std::sync::Arc;
use std::time::Duration;

use crate::backend::InputBackend;
use crate::dispatch::PacketQueues;
use crate::task::Task;
use crate::wire::packet::{ButtonState, MouseButton};

/// Drains MouseMove/MouseClick/KeyEvent queues and replays each against an
/// [`InputBackend`]. Runs on the Obedient Agent only. A malformed or
/// rejected event never stops the loop — the backend swallows its own
/// errors.
pub struct InputReplayPipeline {
    task: Task,
}

impl InputReplayPipeline {
    pub fn new() -> Self {
        Self { task: Task::new() }
    }

    pub fn start<I>(&self, queues: Arc<PacketQueues>, backend: Arc<I>, idle_sleep: Duration)
    where
        I: InputBackend + 'static,
    {
        let running = self.task.running_flag();
        self.task.spawn(async move {
            while running.get() {
                let mut did_work = false;

                if let Some(m) = queues.mouse_move.pop() {
                    backend.mouse_move(m.x, m.y).await;
                    did_work = true;
                }

                if let Some(c) = queues.mouse_click.pop() {
                    replay_click(&*backend, c.button, c.state, c.x, c.y).await;
                    did_work = true;
                }

                if let Some(k) = queues.key_event.pop() {
                    match k.state {
                        ButtonState::Press => backend.key_down(&k.key_name).await,
                        ButtonState::Release => backend.key_up(&k.key_name).await,
                    }
                    did_work = true;
                }

                if !did_work {
                    tokio::time::sleep(idle_sleep).await;
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

impl Default for InputReplayPipeline {
    fn default() -> Self {
        Self::new()
    }
}

async fn replay_click<I: InputBackend>(
    backend: &I,
    button: MouseButton,
    state: ButtonState,
    x: u32,
    y: u32,
) {
    match button {
        MouseButton::Left | MouseButton::Right => match state {
            ButtonState::Press => backend.mouse_down(x, y, button).await,
            ButtonState::Release => backend.mouse_up(x, y, button).await,
        },
        MouseButton::WheelUp => backend.scroll(1, x, y).await,
        MouseButton::WheelDown => backend.scroll(-1, x, y).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default, Debug, Clone, PartialEq)]
    struct RecordedEvents {
        moves: Vec<(u32, u32)>,
        downs: Vec<(u32, u32, MouseButton)>,
        ups: Vec<(u32, u32, MouseButton)>,
        scrolls: Vec<(i32, u32, u32)>,
        key_downs: Vec<String>,
        key_ups: Vec<String>,
    }

    #[derive(Default)]
    struct RecordingBackend {
        events: Mutex<RecordedEvents>,
    }

    impl InputBackend for RecordingBackend {
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

    #[tokio::test]
    async fn mouse_move_is_replayed() {
        let queues = PacketQueues::new(1, 8);
        queues.mouse_move.push(crate::dispatch::MouseMoveEvent { x: 1, y: 2 });
        let backend = Arc::new(RecordingBackend::default());
        let pipeline = InputReplayPipeline::new();
        pipeline.start(queues, Arc::clone(&backend), Duration::from_millis(5));

        wait_until(|| !backend.events.lock().unwrap().moves.is_empty()).await;
        assert_eq!(backend.events.lock().unwrap().moves, vec![(1, 2)]);
        pipeline.stop().await;
    }

    #[tokio::test]
    async fn wheel_click_becomes_scroll_not_mouse_down() {
        let queues = PacketQueues::new(1, 8);
        queues.mouse_click.push(crate::dispatch::MouseClickEvent {
            button: MouseButton::WheelUp,
            state: ButtonState::Press,
            x: 5,
            y: 5,
        });
        let backend = Arc::new(RecordingBackend::default());
        let pipeline = InputReplayPipeline::new();
        pipeline.start(queues, Arc::clone(&backend), Duration::from_millis(5));

        wait_until(|| !backend.events.lock().unwrap().scrolls.is_empty()).await;
        assert_eq!(backend.events.lock().unwrap().scrolls, vec![(1, 5, 5)]);
        assert!(backend.events.lock().unwrap().downs.is_empty());
        pipeline.stop().await;
    }

    #[tokio::test]
    async fn key_event_dispatches_down_and_up_by_state() {
        let queues = PacketQueues::new(1, 8);
        queues.key_event.push(crate::dispatch::KeyEvent {
            key_name: "Return".into(),
            state: ButtonState::Press,
        });
        let backend = Arc::new(RecordingBackend::default());
        let pipeline = InputReplayPipeline::new();
        pipeline.start(queues, Arc::clone(&backend), Duration::from_millis(5));

        wait_until(|| !backend.events.lock().unwrap().key_downs.is_empty()).await;
        assert_eq!(backend.events.lock().unwrap().key_downs, vec!["Return".to_string()]);
        pipeline.stop().await;
    }

    async fn wait_until(mut predicate: impl FnMut() -> bool) {
        for _ in 0..200 {
            if predicate() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition never became true");
    }
}
