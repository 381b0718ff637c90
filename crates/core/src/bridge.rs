//! Host side of the sandbox communication protocol.
//!
//! A compiled bundle runs in an execution context that may run scripts but is
//! denied persistent storage and top-level navigation. The only channel back
//! to the host is a one-way stream of typed `{type, payload}` messages. This
//! module parses that stream, validates payload structure, dedupes
//! achievements, and enforces the `gameEnd` ordering barrier. Hostile or
//! malformed input is dropped or defaulted, never allowed to panic the host.

use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

/// The permission set the host must apply to the execution context: script
/// execution allowed, storage and navigation denied, same-origin-style
/// messaging kept working.
pub const SANDBOX_PERMISSIONS: &str = "allow-scripts";

/// A structurally validated event from the executing bundle.
#[derive(Debug, Clone, PartialEq)]
pub enum SandboxEvent {
    Achievement { title: String },
    ScoreUpdate { score: f64 },
    GameEnd { final_score: f64 },
}

impl SandboxEvent {
    /// Parses a raw message into a typed event.
    ///
    /// Returns `None` for unknown `type` values (forward compatibility) and
    /// for payloads that cannot be salvaged. Malformed numeric payloads
    /// default to 0; an achievement without a usable title is dropped since
    /// there is nothing sensible to default it to.
    pub fn parse(raw: &str) -> Option<SandboxEvent> {
        let value: Value = serde_json::from_str(raw).ok()?;
        let kind = value.get("type")?.as_str()?;
        let payload = value.get("payload");

        match kind {
            "achievement" => {
                let title = payload?.get("title")?.as_str()?.trim();
                if title.is_empty() {
                    return None;
                }
                Some(SandboxEvent::Achievement {
                    title: title.to_string(),
                })
            }
            "scoreUpdate" => Some(SandboxEvent::ScoreUpdate {
                score: number_or_zero(payload, "score"),
            }),
            "gameEnd" => Some(SandboxEvent::GameEnd {
                final_score: number_or_zero(payload, "finalScore"),
            }),
            other => {
                debug!(kind = other, "ignoring unknown sandbox event type");
                None
            }
        }
    }
}

fn number_or_zero(payload: Option<&Value>, field: &str) -> f64 {
    payload
        .and_then(|p| p.get(field))
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

/// A state change the bridge surfaces to display logic.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeUpdate {
    AchievementUnlocked { title: String },
    ScoreChanged { score: f64 },
    Ended { final_score: f64 },
}

/// Host-side state for one play session of a runtime bundle.
///
/// Events are processed in arrival order. `gameEnd` is terminal: nothing
/// ordered after it is honored.
#[derive(Debug, Default)]
pub struct PlaySession {
    unlocked: BTreeSet<String>,
    score: f64,
    ended: bool,
    final_score: Option<f64>,
}

impl PlaySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Achievement titles unlocked so far, each at most once.
    pub fn unlocked(&self) -> &BTreeSet<String> {
        &self.unlocked
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    pub fn final_score(&self) -> Option<f64> {
        self.final_score
    }

    /// Parses and applies one raw message from the execution context.
    ///
    /// Returns the update to surface to display logic, or `None` when the
    /// message was unknown, malformed, a duplicate achievement, or arrived
    /// after `gameEnd`.
    pub fn handle_raw(&mut self, raw: &str) -> Option<BridgeUpdate> {
        let event = SandboxEvent::parse(raw)?;
        self.apply(event)
    }

    /// Applies a typed event to the session state.
    pub fn apply(&mut self, event: SandboxEvent) -> Option<BridgeUpdate> {
        if self.ended {
            debug!(?event, "dropping sandbox event received after gameEnd");
            return None;
        }
        match event {
            SandboxEvent::Achievement { title } => {
                if self.unlocked.insert(title.clone()) {
                    Some(BridgeUpdate::AchievementUnlocked { title })
                } else {
                    None
                }
            }
            SandboxEvent::ScoreUpdate { score } => {
                self.score = score;
                Some(BridgeUpdate::ScoreChanged { score })
            }
            SandboxEvent::GameEnd { final_score } => {
                self.ended = true;
                self.final_score = Some(final_score);
                Some(BridgeUpdate::Ended { final_score })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_three_known_event_types() {
        assert_eq!(
            SandboxEvent::parse(r#"{"type":"achievement","payload":{"title":"First Sort!"}}"#),
            Some(SandboxEvent::Achievement {
                title: "First Sort!".to_string()
            })
        );
        assert_eq!(
            SandboxEvent::parse(r#"{"type":"scoreUpdate","payload":{"score":7}}"#),
            Some(SandboxEvent::ScoreUpdate { score: 7.0 })
        );
        assert_eq!(
            SandboxEvent::parse(r#"{"type":"gameEnd","payload":{"finalScore":42}}"#),
            Some(SandboxEvent::GameEnd { final_score: 42.0 })
        );
    }

    #[test]
    fn unknown_types_are_ignored() {
        assert_eq!(
            SandboxEvent::parse(r#"{"type":"levelUp","payload":{"level":2}}"#),
            None
        );
    }

    #[test]
    fn malformed_messages_do_not_panic() {
        for raw in [
            "",
            "not json",
            "{}",
            r#"{"type":42}"#,
            r#"{"payload":{"score":1}}"#,
            r#"{"type":"achievement"}"#,
            r#"{"type":"achievement","payload":{"title":""}}"#,
            r#"{"type":"achievement","payload":{"title":7}}"#,
        ] {
            assert_eq!(SandboxEvent::parse(raw), None, "raw: {}", raw);
        }
    }

    #[test]
    fn malformed_numeric_payloads_default_to_zero() {
        assert_eq!(
            SandboxEvent::parse(r#"{"type":"scoreUpdate","payload":{"score":"lots"}}"#),
            Some(SandboxEvent::ScoreUpdate { score: 0.0 })
        );
        assert_eq!(
            SandboxEvent::parse(r#"{"type":"gameEnd"}"#),
            Some(SandboxEvent::GameEnd { final_score: 0.0 })
        );
    }

    #[test]
    fn achievements_are_deduplicated_per_session() {
        let mut session = PlaySession::new();
        let raw = r#"{"type":"achievement","payload":{"title":"Green Thumb"}}"#;
        assert!(matches!(
            session.handle_raw(raw),
            Some(BridgeUpdate::AchievementUnlocked { .. })
        ));
        assert_eq!(session.handle_raw(raw), None);
        assert_eq!(session.handle_raw(raw), None);
        assert_eq!(session.unlocked().len(), 1);
    }

    #[test]
    fn distinct_achievements_all_surface() {
        let mut session = PlaySession::new();
        for title in ["A", "B", "C"] {
            let raw = format!(r#"{{"type":"achievement","payload":{{"title":"{}"}}}}"#, title);
            assert!(session.handle_raw(&raw).is_some());
        }
        assert_eq!(session.unlocked().len(), 3);
    }

    #[test]
    fn game_end_is_a_hard_barrier() {
        let mut session = PlaySession::new();
        assert!(matches!(
            session.handle_raw(r#"{"type":"gameEnd","payload":{"finalScore":10}}"#),
            Some(BridgeUpdate::Ended { .. })
        ));
        assert_eq!(
            session.handle_raw(r#"{"type":"scoreUpdate","payload":{"score":99}}"#),
            None
        );
        assert_eq!(
            session.handle_raw(r#"{"type":"achievement","payload":{"title":"Late"}}"#),
            None
        );
        assert_eq!(
            session.handle_raw(r#"{"type":"gameEnd","payload":{"finalScore":0}}"#),
            None
        );
        assert_eq!(session.score(), 0.0);
        assert!(session.unlocked().is_empty());
        assert_eq!(session.final_score(), Some(10.0));
    }

    #[test]
    fn score_updates_replace_the_session_score() {
        let mut session = PlaySession::new();
        session.handle_raw(r#"{"type":"scoreUpdate","payload":{"score":3}}"#);
        session.handle_raw(r#"{"type":"scoreUpdate","payload":{"score":8}}"#);
        assert_eq!(session.score(), 8.0);
    }
}
