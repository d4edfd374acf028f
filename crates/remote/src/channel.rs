//! Bridge between the remote server thread and the render thread.
//!
//! The server never touches the scene. It sends each command with a reply
//! channel and waits; the render thread drains the inbox once per frame.

use lumen_scene::{CommandOutput, Scene, SceneCommand, SceneError};
use std::sync::mpsc;
use std::time::Duration;

/// How long the server waits for the render thread to answer.
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound of commands applied in one frame.
pub const MAX_COMMANDS_PER_FRAME: usize = 64;

pub type CommandReply = Result<CommandOutput, SceneError>;

/// A command plus the channel its result goes back on.
#[derive(Debug)]
pub struct RemoteRequest {
    pub command: SceneCommand,
    pub reply: mpsc::Sender<CommandReply>,
}

/// Why a request got no answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("render loop is not running")]
    Disconnected,
    #[error("render loop did not answer within {0:?}")]
    Timeout(Duration),
}

/// Sending half, held by the server thread.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::Sender<RemoteRequest>,
}

/// Receiving half, held by the render thread.
#[derive(Debug)]
pub struct CommandInbox {
    rx: mpsc::Receiver<RemoteRequest>,
}

pub fn channel() -> (CommandSender, CommandInbox) {
    let (tx, rx) = mpsc::channel();
    (CommandSender { tx }, CommandInbox { rx })
}

impl CommandSender {
    /// Send a command and block until it is applied or `timeout` passes.
    pub fn request(
        &self,
        command: SceneCommand,
        timeout: Duration,
    ) -> Result<CommandReply, ChannelError> {
        let (reply, answer) = mpsc::channel();
        self.tx
            .send(RemoteRequest { command, reply })
            .map_err(|_| ChannelError::Disconnected)?;
        answer.recv_timeout(timeout).map_err(|e| match e {
            mpsc::RecvTimeoutError::Timeout => ChannelError::Timeout(timeout),
            mpsc::RecvTimeoutError::Disconnected => ChannelError::Disconnected,
        })
    }
}

impl CommandInbox {
    /// Apply up to `max` pending commands in arrival order. Returns how many
    /// were applied.
    pub fn drain(&self, scene: &mut Scene, max: usize) -> usize {
        let mut applied = 0;
        while applied < max {
            let Ok(request) = self.rx.try_recv() else {
                break;
            };
            let object = request.command.target();
            let result = scene.apply(request.command);
            if let Err(e) = &result {
                tracing::debug!(?object, "remote command rejected: {e}");
            }
            // The requester may have timed out and gone away.
            let _ = request.reply.send(result);
            applied += 1;
        }
        if applied > 0 {
            tracing::trace!(applied, "remote commands applied");
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use lumen_common::{ModelId, Transform};
    use lumen_scene::Model;
    use std::thread;

    fn scene_with(ids: &[u32]) -> Scene {
        let mut scene = Scene::new();
        for &id in ids {
            scene
                .insert(Model::new(ModelId(id), format!("m{id}"), Vec::new(), Transform::default()))
                .unwrap();
        }
        scene
    }

    #[test]
    fn request_is_answered_by_drain() {
        let (sender, inbox) = channel();
        let requester = thread::spawn(move || {
            sender.request(
                SceneCommand::Move {
                    id: ModelId(0),
                    position: Vec3::X,
                },
                REPLY_TIMEOUT,
            )
        });

        let mut scene = scene_with(&[0]);
        let mut applied = 0;
        while applied == 0 {
            applied = inbox.drain(&mut scene, MAX_COMMANDS_PER_FRAME);
            thread::yield_now();
        }
        assert_eq!(requester.join().unwrap(), Ok(Ok(CommandOutput::Applied)));
        assert_eq!(scene.get(ModelId(0)).unwrap().position(), Vec3::X);
    }

    #[test]
    fn drain_respects_the_per_frame_cap() {
        let (sender, inbox) = channel();
        let mut answers = Vec::new();
        for _ in 0..5 {
            let (reply, answer) = mpsc::channel();
            sender
                .tx
                .send(RemoteRequest {
                    command: SceneCommand::GetObjects,
                    reply,
                })
                .unwrap();
            answers.push(answer);
        }
        let mut scene = scene_with(&[0]);
        assert_eq!(inbox.drain(&mut scene, 3), 3);
        assert_eq!(inbox.drain(&mut scene, 3), 2);
        assert_eq!(inbox.drain(&mut scene, 3), 0);
        assert!(answers.iter().all(|a| a.try_recv().is_ok()));
    }

    #[test]
    fn commands_apply_in_arrival_order() {
        let (sender, inbox) = channel();
        let mut answers = Vec::new();
        for x in 1..=3 {
            let (reply, answer) = mpsc::channel();
            sender
                .tx
                .send(RemoteRequest {
                    command: SceneCommand::Move {
                        id: ModelId(0),
                        position: Vec3::new(x as f32, 0.0, 0.0),
                    },
                    reply,
                })
                .unwrap();
            answers.push(answer);
        }
        let mut scene = scene_with(&[0]);
        inbox.drain(&mut scene, MAX_COMMANDS_PER_FRAME);
        assert_eq!(scene.get(ModelId(0)).unwrap().position().x, 3.0);
    }

    #[test]
    fn unanswered_request_times_out() {
        let (sender, _inbox) = channel();
        let result = sender.request(SceneCommand::GetObjects, Duration::from_millis(20));
        assert_eq!(result, Err(ChannelError::Timeout(Duration::from_millis(20))));
    }

    #[test]
    fn dropped_inbox_is_disconnected() {
        let (sender, inbox) = channel();
        drop(inbox);
        assert_eq!(
            sender.request(SceneCommand::GetObjects, REPLY_TIMEOUT),
            Err(ChannelError::Disconnected)
        );
    }

    #[test]
    fn unknown_id_is_answered_not_dropped() {
        let (sender, inbox) = channel();
        let (reply, answer) = mpsc::channel();
        sender
            .tx
            .send(RemoteRequest {
                command: SceneCommand::Scale {
                    id: ModelId(7),
                    scale: Vec3::ONE,
                },
                reply,
            })
            .unwrap();
        inbox.drain(&mut scene_with(&[0]), MAX_COMMANDS_PER_FRAME);
        assert_eq!(answer.recv().unwrap(), Err(SceneError::NotFound(ModelId(7))));
    }
}
