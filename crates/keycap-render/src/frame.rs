use std::fmt;

pub type FrameTask = Box<dyn FnOnce()>;

/// Single-slot "next frame" queue.
///
/// Tasks scheduled before the host's next tick all run in one [`FrameQueue::flush`], so several
/// completions in the same tick cost one follow-up render.
#[derive(Default)]
pub struct FrameQueue {
    tasks: Vec<FrameTask>,
    armed: bool,
}

impl fmt::Debug for FrameQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameQueue")
            .field("pending", &self.tasks.len())
            .field("armed", &self.armed)
            .finish()
    }
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `task`; returns `true` when this arms the slot and the host should request a tick.
    pub fn schedule(&mut self, task: FrameTask) -> bool {
        self.tasks.push(task);
        !std::mem::replace(&mut self.armed, true)
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Runs every queued task in scheduling order and disarms the slot.
    pub fn flush(&mut self) -> usize {
        self.armed = false;
        let tasks = std::mem::take(&mut self.tasks);
        let n = tasks.len();
        if n > 0 {
            tracing::trace!(tasks = n, "flushing frame queue");
        }
        for task in tasks {
            task();
        }
        n
    }
}
