//! Defines the WebSocket message protocol between the browser client and the API server.

use serde::{Deserialize, Serialize};

/// Messages sent from the client (browser) to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Starts a companion session. This must be the first message.
    #[serde(rename = "init")]
    Init {
        name: String,
        age: i64,
        /// Stated accommodation need; empty or "none" when not applicable.
        #[serde(default)]
        disability: String,
    },
    /// A text message from the learner to the companion.
    #[serde(rename = "user_message")]
    UserMessage { text: String },
    /// The learner launched a generated game; resets play tracking.
    #[serde(rename = "play_start")]
    PlayStart,
    /// A raw postMessage payload relayed from the game sandbox.
    #[serde(rename = "sandbox_event")]
    SandboxEvent { message: serde_json::Value },
}

/// Messages sent from the server to the client (browser).
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms successful session initialization with the companion's opening line.
    Initialized { greeting: String },
    /// The companion's reply to a `user_message`.
    AssistantReply { text: String },
    /// A newly earned achievement from the running game.
    AchievementUnlocked { title: String },
    /// The latest score reported by the running game.
    ScoreUpdated { score: f64 },
    /// The running game finished with this final score.
    GameEnded { final_score: f64 },
    /// Reports a fatal error to the client.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_init_message_parses() {
        let text = r#"{"type": "init", "name": "Maya", "age": 7, "disability": "adhd"}"#;
        let msg: ClientMessage = serde_json::from_str(text).unwrap();
        match msg {
            ClientMessage::Init {
                name,
                age,
                disability,
            } => {
                assert_eq!(name, "Maya");
                assert_eq!(age, 7);
                assert_eq!(disability, "adhd");
            }
            _ => panic!("Expected Init"),
        }
    }

    #[test]
    fn test_init_disability_defaults_to_empty() {
        let text = r#"{"type": "init", "name": "Maya", "age": 7}"#;
        let msg: ClientMessage = serde_json::from_str(text).unwrap();
        match msg {
            ClientMessage::Init { disability, .. } => assert_eq!(disability, ""),
            _ => panic!("Expected Init"),
        }
    }

    #[test]
    fn test_sandbox_event_carries_raw_value() {
        let text = r#"{"type": "sandbox_event", "message": {"type": "scoreUpdate", "payload": {"score": 10}}}"#;
        let msg: ClientMessage = serde_json::from_str(text).unwrap();
        match msg {
            ClientMessage::SandboxEvent { message } => {
                assert_eq!(message["type"], json!("scoreUpdate"));
            }
            _ => panic!("Expected SandboxEvent"),
        }
    }

    #[test]
    fn test_server_message_wire_format() {
        let msg = ServerMessage::AchievementUnlocked {
            title: "Green Thumb".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"achievement_unlocked""#));
        assert!(json.contains(r#""title":"Green Thumb""#));
    }

    #[test]
    fn test_game_ended_wire_format() {
        let msg = ServerMessage::GameEnded { final_score: 42.0 };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"game_ended""#));
        assert!(json.contains(r#""final_score":42"#));
    }
}
