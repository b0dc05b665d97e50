//! Notifications for the messaging collaborator and timed guidance hints

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::trace;

use crate::anchor::AnchorId;

/// Timed hints shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceKind {
    /// "Find a surface to place an object"
    PlaneEstimation,
    /// "Tap to place an object"
    ContentPlacement,
    /// "Try moving left or right"
    FocusHint,
}

/// Fire-and-forget events for the messaging collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum PlacementMessage {
    SurfaceDetected { anchor: AnchorId },
    SurfaceLost { anchor: AnchorId },
    /// The placement hint came due with no object placed yet
    PlacementSuggested,
    FocusAcquired,
    /// A guidance hint other than placement came due
    Hint { kind: GuidanceKind },
}

impl From<GuidanceKind> for PlacementMessage {
    fn from(kind: GuidanceKind) -> Self {
        match kind {
            GuidanceKind::ContentPlacement => PlacementMessage::PlacementSuggested,
            other => PlacementMessage::Hint { kind: other },
        }
    }
}

/// Sending half of the message stream; delivery is never awaited
#[derive(Debug, Clone)]
pub struct MessageSink {
    tx: mpsc::UnboundedSender<PlacementMessage>,
}

impl MessageSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PlacementMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, message: PlacementMessage) {
        trace!(?message, "emit");
        // Nobody listening is fine
        let _ = self.tx.send(message);
    }
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    delay: Duration,
    /// Clock value when the hint was scheduled; unset until the clock starts
    since: Option<Duration>,
}

/// Pending hints keyed by kind, driven by tracking timestamps
#[derive(Debug, Clone, Default)]
pub struct GuidanceScheduler {
    now: Option<Duration>,
    pending: HashMap<GuidanceKind, Scheduled>,
}

impl GuidanceScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a hint, replacing any pending hint of the same kind
    pub fn schedule(&mut self, kind: GuidanceKind, delay: Duration) {
        self.pending.insert(
            kind,
            Scheduled {
                delay,
                since: self.now,
            },
        );
    }

    /// Cancel a pending hint. Returns whether one was pending.
    pub fn cancel(&mut self, kind: GuidanceKind) -> bool {
        self.pending.remove(&kind).is_some()
    }

    pub fn is_scheduled(&self, kind: GuidanceKind) -> bool {
        self.pending.contains_key(&kind)
    }

    /// Move the clock forward and return hints that came due, earliest first.
    /// Timestamps that go backwards are ignored.
    pub fn advance(&mut self, now: Duration) -> Vec<GuidanceKind> {
        if self.now.is_some_and(|prev| now < prev) {
            return Vec::new();
        }
        self.now = Some(now);

        let mut due: Vec<(Duration, GuidanceKind)> = Vec::new();
        for (kind, entry) in self.pending.iter_mut() {
            let since = *entry.since.get_or_insert(now);
            let deadline = since + entry.delay;
            if now >= deadline {
                due.push((deadline, *kind));
            }
        }
        due.sort_by_key(|(deadline, _)| *deadline);
        for (_, kind) in &due {
            self.pending.remove(kind);
        }
        due.into_iter().map(|(_, kind)| kind).collect()
    }

    /// Drop every pending hint; the clock keeps running
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
