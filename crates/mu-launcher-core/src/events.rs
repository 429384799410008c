//! Outbound events for the UI.
//!
//! Core components emit [`LauncherEvent`]s on a broadcast [`EventBus`]; the
//! bridge subscribes and forwards them. Emitting with no subscribers is not
//! an error.

use crate::process::ProcessRecord;
use crate::window::WindowHandle;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

const EVENT_CAPACITY: usize = 64;

/// Event pushed from the core to the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum LauncherEvent {
    #[serde(rename_all = "camelCase")]
    GameLaunched { pid: u32, embedding: bool },
    #[serde(rename_all = "camelCase")]
    WindowEmbedded { pid: u32, handle: WindowHandle },
    #[serde(rename_all = "camelCase")]
    WindowNotFound { pid: u32, attempts: u32 },
    #[serde(rename_all = "camelCase")]
    EmbedFailed { pid: u32, message: String },
    #[serde(rename_all = "camelCase")]
    EmbeddingLost { reason: String },
    #[serde(rename_all = "camelCase")]
    UnmanagedProcessDetected { process: ProcessRecord },
    #[serde(rename_all = "camelCase")]
    UpdateAvailable { version: String },
    #[serde(rename_all = "camelCase")]
    DownloadProgress { percent: u8 },
    #[serde(rename_all = "camelCase")]
    UpdateFinished { version: String },
    #[serde(rename_all = "camelCase")]
    UpdateError { message: String },
}

/// Broadcast channel for [`LauncherEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LauncherEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn emit(&self, event: LauncherEvent) {
        trace!("Emitting {:?}", event);
        // Err only means nobody is listening
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LauncherEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_is_tagged() {
        let json = serde_json::to_value(LauncherEvent::WindowNotFound {
            pid: 1000,
            attempts: 10,
        })
        .unwrap();
        assert_eq!(json["event"], "windowNotFound");
        assert_eq!(json["pid"], 1000);
        assert_eq!(json["attempts"], 10);
    }

    #[test]
    fn test_unmanaged_event_uses_record_names() {
        let json = serde_json::to_value(LauncherEvent::UnmanagedProcessDetected {
            process: ProcessRecord {
                pid: 5,
                executable_name: "main.exe".into(),
                creation_time: 17,
            },
        })
        .unwrap();
        assert_eq!(json["event"], "unmanagedProcessDetected");
        assert_eq!(json["process"]["name"], "main.exe");
        assert_eq!(json["process"]["createTime"], 17);
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        EventBus::new().emit(LauncherEvent::EmbeddingLost {
            reason: "closed".into(),
        });
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.emit(LauncherEvent::DownloadProgress { percent: 50 });
        assert_eq!(
            rx.recv().await.unwrap(),
            LauncherEvent::DownloadProgress { percent: 50 }
        );
    }
}
