use crate::audio::catalog::SoundType;
use crossbeam::queue::SegQueue;
use std::sync::Arc;

// Upper bound on commands applied between two buffers
const MAX_COMMANDS_PER_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionCommand {
    /// Swap the active sound and reset every generator.
    SetSound(SoundType),
    /// Swap the active sound, reset, and ramp up from a partial volume.
    Transition {
        sound: SoundType,
        from_volume: f32,
        seconds: f32,
    },
    /// Ramp to silence; the worker exits once the ramp completes.
    FadeOut { seconds: f32 },
}

/// Lock-free command channel from the player to one session's worker.
pub fn session_commands() -> (SessionCommandSender, SessionCommandReceiver) {
    let queue = Arc::new(SegQueue::new());
    (
        SessionCommandSender {
            queue: Arc::clone(&queue),
        },
        SessionCommandReceiver { queue },
    )
}

pub struct SessionCommandSender {
    queue: Arc<SegQueue<SessionCommand>>,
}

impl SessionCommandSender {
    pub fn send(&self, command: SessionCommand) {
        self.queue.push(command);
    }
}

pub struct SessionCommandReceiver {
    queue: Arc<SegQueue<SessionCommand>>,
}

impl SessionCommandReceiver {
    /// Apply pending commands in send order, called before each buffer.
    pub fn drain<F>(&self, mut apply: F)
    where
        F: FnMut(SessionCommand),
    {
        for _ in 0..MAX_COMMANDS_PER_BUFFER {
            match self.queue.pop() {
                Some(command) => apply(command),
                None => break,
            }
        }
    }
}
