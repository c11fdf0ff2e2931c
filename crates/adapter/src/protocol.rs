//! Protocol module - JSON message types for seat clients
//!
//! One JSON object per line. Every message carries `type`, `seq` (sequence
//! number) and `ts` (timestamp in ms). Tiles travel as their names (`"M1"`,
//! `"EAST"`, ...) and actions as their labels (`"PONG"`, `"CHOW M2,M3"`, ...).

use serde::{Deserialize, Serialize};

use crate::core::{Notification, Recipient, SeatView};
use crate::types::{HandOutcome, Meld, Seat, Tile, WinSource, SEATS};

// ============== Client -> Server Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HelloType {
    #[serde(rename = "hello")]
    #[default]
    Hello,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DiscardType {
    #[serde(rename = "discard")]
    #[default]
    Discard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ActionType {
    #[serde(rename = "action")]
    #[default]
    Action,
}

/// Client hello message (first message on a connection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: HelloType,
    pub seq: u64,
    #[serde(default)]
    pub ts: u64,
    pub nickname: String,
    pub protocol_version: String,
}

/// Discard a concealed tile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscardMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: DiscardType,
    pub seq: u64,
    #[serde(default)]
    pub ts: u64,
    pub tile: String,
}

/// Answer an action offer with one of its labels (or `PASS`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: ActionType,
    pub seq: u64,
    #[serde(default)]
    pub ts: u64,
    pub choice: String,
}

// ============== Server -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "handshake_required")]
    HandshakeRequired,
    #[serde(rename = "protocol_mismatch")]
    ProtocolMismatch,
    #[serde(rename = "invalid_command")]
    InvalidCommand,
    #[serde(rename = "table_full")]
    TableFull,
    #[serde(rename = "not_seated")]
    NotSeated,
    #[serde(rename = "backpressure")]
    Backpressure,
}

/// A meld as shown on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeldView {
    pub kind: String,
    pub tiles: Vec<String>,
}

impl From<&Meld> for MeldView {
    fn from(meld: &Meld) -> Self {
        Self {
            kind: meld.kind().as_str().to_string(),
            tiles: meld.tiles().map(|t| t.name().to_string()).collect(),
        }
    }
}

/// Per-seat table view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateView {
    pub my_seat: Seat,
    pub turn: Seat,
    pub phase: String,
    pub hand: Vec<String>,
    pub melds: Vec<Vec<MeldView>>,
    pub hand_counts: Vec<usize>,
    pub sea: Vec<String>,
    pub wall_remaining: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_discard: Option<String>,
    pub nicknames: Vec<String>,
}

impl StateView {
    pub fn from_view(view: &SeatView, nicknames: &[String]) -> Self {
        Self {
            my_seat: view.seat,
            turn: view.turn,
            phase: view.phase.as_str().to_string(),
            hand: tile_names(&view.concealed),
            melds: view
                .melds
                .iter()
                .map(|melds| melds.iter().map(MeldView::from).collect())
                .collect(),
            hand_counts: view.concealed_counts.to_vec(),
            sea: tile_names(&view.sea),
            wall_remaining: view.wall_remaining,
            pending_discard: view.pending_discard.map(|t| t.name().to_string()),
            nicknames: nicknames.to_vec(),
        }
    }
}

/// Body of every server message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol_version: String,
        client_id: u64,
        game_id: String,
    },
    Lobby {
        seated: usize,
        needed: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        seat: Option<Seat>,
    },
    HandStarted {
        dealer: Seat,
        wall_remaining: usize,
        nicknames: Vec<String>,
    },
    State(StateView),
    TileDrawn {
        tile: String,
        replacement: bool,
    },
    DiscardPrompt {
        seat: Seat,
        message: String,
    },
    ActionOffer {
        priority: u8,
        choices: Vec<String>,
        tile: String,
    },
    Discarded {
        seat: Seat,
        tile: String,
    },
    ActionTaken {
        seat: Seat,
        choice: String,
        meld: MeldView,
    },
    HandEnded {
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        winner: Option<Seat>,
        #[serde(skip_serializing_if = "Option::is_none")]
        shape: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        from: Option<Seat>,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
}

impl ServerMessage {
    /// Map a session notification to its wire form and recipient
    pub fn from_notification(
        notification: &Notification,
        nicknames: &[String],
    ) -> (Recipient, ServerMessage) {
        let message = match notification {
            Notification::HandStarted {
                dealer,
                wall_remaining,
            } => ServerMessage::HandStarted {
                dealer: *dealer,
                wall_remaining: *wall_remaining,
                nicknames: nicknames.to_vec(),
            },
            Notification::StateSnapshot(view) => {
                ServerMessage::State(StateView::from_view(view, nicknames))
            }
            Notification::TileDrawn {
                tile, replacement, ..
            } => ServerMessage::TileDrawn {
                tile: tile.name().to_string(),
                replacement: *replacement,
            },
            Notification::DiscardPrompt { seat } => ServerMessage::DiscardPrompt {
                seat: *seat,
                message: "please discard".to_string(),
            },
            Notification::ActionOffer {
                tier,
                choices,
                tile,
                ..
            } => ServerMessage::ActionOffer {
                priority: tier.priority(),
                choices: choices.iter().map(|c| c.label()).collect(),
                tile: tile.name().to_string(),
            },
            Notification::Discarded { seat, tile } => ServerMessage::Discarded {
                seat: *seat,
                tile: tile.name().to_string(),
            },
            Notification::ActionTaken { seat, choice, meld } => ServerMessage::ActionTaken {
                seat: *seat,
                choice: choice.label(),
                meld: MeldView::from(meld),
            },
            Notification::HandEnded { outcome } => hand_ended(outcome),
        };
        (notification.recipient(), message)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ServerMessage::Welcome { .. } => "welcome",
            ServerMessage::Lobby { .. } => "lobby",
            ServerMessage::HandStarted { .. } => "hand_started",
            ServerMessage::State(_) => "state",
            ServerMessage::TileDrawn { .. } => "tile_drawn",
            ServerMessage::DiscardPrompt { .. } => "discard_prompt",
            ServerMessage::ActionOffer { .. } => "action_offer",
            ServerMessage::Discarded { .. } => "discarded",
            ServerMessage::ActionTaken { .. } => "action_taken",
            ServerMessage::HandEnded { .. } => "hand_ended",
            ServerMessage::Error { .. } => "error",
        }
    }
}

fn hand_ended(outcome: &HandOutcome) -> ServerMessage {
    let (shape, from) = match outcome {
        HandOutcome::Win { shape, source, .. } => {
            let from = match source {
                WinSource::Discard { from } => Some(*from),
                WinSource::SelfDraw => None,
            };
            (Some(shape.as_str().to_string()), from)
        }
        HandOutcome::WallExhausted => (None, None),
    };
    ServerMessage::HandEnded {
        reason: outcome.reason().to_string(),
        winner: outcome.winner(),
        shape,
        from,
    }
}

fn tile_names(tiles: &[Tile]) -> Vec<String> {
    tiles.iter().map(|t| t.name().to_string()).collect()
}

/// A server message with its envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerFrame {
    pub seq: u64,
    pub ts: u64,
    #[serde(flatten)]
    pub message: ServerMessage,
}

impl ServerFrame {
    pub fn new(seq: u64, message: ServerMessage) -> Self {
        Self {
            seq,
            ts: current_timestamp_ms(),
            message,
        }
    }
}

// ============== Message Parsing ==============

/// Parse a JSON message from a string
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    #[derive(Debug, Deserialize)]
    #[serde(tag = "type")]
    enum InboundMessage {
        #[serde(rename = "hello")]
        Hello(HelloMessage),
        #[serde(rename = "discard")]
        Discard(DiscardMessage),
        #[serde(rename = "action")]
        Action(ActionMessage),
    }

    match serde_json::from_str::<InboundMessage>(json) {
        Ok(InboundMessage::Hello(m)) => Ok(ParsedMessage::Hello(m)),
        Ok(InboundMessage::Discard(m)) => Ok(ParsedMessage::Discard(m)),
        Ok(InboundMessage::Action(m)) => Ok(ParsedMessage::Action(m)),
        Err(e) => {
            // Unknown message type is not a hard parse error for the protocol.
            #[derive(Debug, Deserialize)]
            struct TypeOnly<'a> {
                #[serde(rename = "type")]
                msg_type: Option<&'a str>,
            }
            let msg_type = serde_json::from_str::<TypeOnly>(json)?
                .msg_type
                .unwrap_or("unknown");
            if !matches!(msg_type, "hello" | "discard" | "action") {
                #[derive(Debug, Deserialize)]
                struct SeqOnly {
                    seq: Option<u64>,
                }
                let seq = serde_json::from_str::<SeqOnly>(json)?.seq.unwrap_or(0);
                return Ok(ParsedMessage::Unknown(UnknownMessage { seq }));
            }
            Err(e)
        }
    }
}

/// Parsed incoming message
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    Discard(DiscardMessage),
    Action(ActionMessage),
    Unknown(UnknownMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
}

// ============== Utility Functions ==============

/// Create a hello message
pub fn create_hello(seq: u64, nickname: &str, protocol_version: &str) -> HelloMessage {
    HelloMessage {
        msg_type: HelloType::Hello,
        seq,
        ts: current_timestamp_ms(),
        nickname: nickname.to_string(),
        protocol_version: protocol_version.to_string(),
    }
}

/// Create a discard message
pub fn create_discard(seq: u64, tile: Tile) -> DiscardMessage {
    DiscardMessage {
        msg_type: DiscardType::Discard,
        seq,
        ts: current_timestamp_ms(),
        tile: tile.name().to_string(),
    }
}

/// Create an action message
pub fn create_action(seq: u64, choice: &str) -> ActionMessage {
    ActionMessage {
        msg_type: ActionType::Action,
        seq,
        ts: current_timestamp_ms(),
        choice: choice.to_string(),
    }
}

/// Create a welcome frame (echoes the hello's seq)
pub fn create_welcome(seq: u64, protocol_version: &str, client_id: u64) -> ServerFrame {
    ServerFrame::new(
        seq,
        ServerMessage::Welcome {
            protocol_version: protocol_version.to_string(),
            client_id,
            game_id: "tw-mahjong".to_string(),
        },
    )
}

/// Create a lobby status frame
pub fn create_lobby(seq: u64, seated: usize, seat: Option<Seat>) -> ServerFrame {
    ServerFrame::new(
        seq,
        ServerMessage::Lobby {
            seated,
            needed: SEATS,
            seat,
        },
    )
}

/// Create an error frame
pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ServerFrame {
    ServerFrame::new(
        seq,
        ServerMessage::Error {
            code,
            message: message.to_string(),
        },
    )
}

/// Get current timestamp in milliseconds
pub(crate) fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PhaseKind;
    use crate::types::{ActionChoice, KongKind, Tier, WinShape};

    #[test]
    fn test_parse_hello() {
        let json = r#"{"type":"hello","seq":1,"ts":1234567890,"nickname":"alice","protocol_version":"1.0.0"}"#;

        let result = parse_message(json).unwrap();
        match result {
            ParsedMessage::Hello(msg) => {
                assert_eq!(msg.msg_type, HelloType::Hello);
                assert_eq!(msg.seq, 1);
                assert_eq!(msg.nickname, "alice");
                assert_eq!(msg.protocol_version, "1.0.0");
            }
            _ => panic!("Expected Hello message"),
        }
    }

    #[test]
    fn test_parse_discard_and_action() {
        let json = r#"{"type":"discard","seq":2,"tile":"P5"}"#;
        match parse_message(json).unwrap() {
            ParsedMessage::Discard(msg) => {
                assert_eq!(msg.seq, 2);
                assert_eq!(msg.ts, 0);
                assert_eq!(msg.tile, "P5");
            }
            _ => panic!("Expected Discard message"),
        }

        let json = r#"{"type":"action","seq":3,"ts":5,"choice":"CHOW M2,M3"}"#;
        match parse_message(json).unwrap() {
            ParsedMessage::Action(msg) => assert_eq!(msg.choice, "CHOW M2,M3"),
            _ => panic!("Expected Action message"),
        }
    }

    #[test]
    fn test_unknown_type_is_not_a_parse_error() {
        let json = r#"{"type":"dance","seq":9}"#;
        match parse_message(json).unwrap() {
            ParsedMessage::Unknown(u) => assert_eq!(u.seq, 9),
            _ => panic!("Expected Unknown message"),
        }
        // known type with missing fields is a real error
        assert!(parse_message(r#"{"type":"discard","seq":1}"#).is_err());
        assert!(parse_message("not json").is_err());
    }

    #[test]
    fn test_error_frame_serializes_flat() {
        let frame = create_error(5, ErrorCode::TableFull, "table is full");
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["seq"], 5);
        assert_eq!(value["code"], "table_full");
        assert_eq!(value["message"], "table is full");
    }

    #[test]
    fn test_offer_mapping_uses_labels() {
        let m2 = Tile::from_name("M2").unwrap();
        let m3 = Tile::from_name("M3").unwrap();
        let n = Notification::ActionOffer {
            seat: 1,
            tier: Tier::Chow,
            choices: vec![ActionChoice::Chow(m2, m3), ActionChoice::Pass],
            tile: Tile::from_name("M4").unwrap(),
        };
        let (recipient, message) = ServerMessage::from_notification(&n, &[]);
        assert_eq!(recipient, Recipient::Seat(1));
        let value = serde_json::to_value(ServerFrame::new(1, message)).unwrap();
        assert_eq!(value["type"], "action_offer");
        assert_eq!(value["priority"], 3);
        assert_eq!(value["choices"][0], "CHOW M2,M3");
        assert_eq!(value["choices"][1], "PASS");
        assert_eq!(value["tile"], "M4");
    }

    #[test]
    fn test_hand_ended_mapping() {
        let n = Notification::HandEnded {
            outcome: HandOutcome::Win {
                winner: 3,
                source: WinSource::Discard { from: 0 },
                shape: WinShape::SevenPairs,
            },
        };
        let (recipient, message) = ServerMessage::from_notification(&n, &[]);
        assert_eq!(recipient, Recipient::All);
        assert_eq!(
            message,
            ServerMessage::HandEnded {
                reason: "win_on_discard".to_string(),
                winner: Some(3),
                shape: Some("seven_pairs".to_string()),
                from: Some(0),
            }
        );

        let n = Notification::HandEnded {
            outcome: HandOutcome::WallExhausted,
        };
        let value = serde_json::to_value(ServerMessage::from_notification(&n, &[]).1).unwrap();
        assert_eq!(value["reason"], "wall_exhausted");
        assert!(value.get("winner").is_none());
    }

    #[test]
    fn test_state_view_hides_other_hands() {
        let east = Tile::from_name("EAST").unwrap();
        let view = SeatView {
            seat: 2,
            turn: 0,
            phase: PhaseKind::AwaitingDiscard,
            concealed: vec![east],
            melds: [vec![Meld::quad(east, KongKind::Exposed)], vec![], vec![], vec![]],
            concealed_counts: [13, 16, 1, 16],
            sea: vec![],
            wall_remaining: 50,
            pending_discard: None,
        };
        let names: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let state = StateView::from_view(&view, &names);
        assert_eq!(state.my_seat, 2);
        assert_eq!(state.hand, vec!["EAST".to_string()]);
        assert_eq!(state.hand_counts, vec![13, 16, 1, 16]);
        assert_eq!(state.melds[0][0].kind, "exposed_quad");
        assert_eq!(state.phase, "awaiting_discard");
        assert_eq!(state.nicknames[3], "d");
    }
}
