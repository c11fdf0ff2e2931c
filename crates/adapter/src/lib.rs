//! Adapter - seat clients over TCP with a JSON line protocol
//!
//! This crate puts a [`GameSession`](tw_mahjong_core::GameSession) on the
//! network. Each session runs inside its own task (see [`runtime`]); the TCP
//! server (see [`server`]) seats clients and turns their lines into seat
//! events.
//!
//! # Protocol Overview
//!
//! 1. **Connection**: Client connects to TCP socket (default: 127.0.0.1:7878)
//! 2. **Handshake**: Client sends `hello`, server responds with `welcome`
//! 3. **Lobby**: The first four handshaken clients take seats 0-3 in arrival
//!    order; later clients get `table_full`
//! 4. **Hand**: Once four seats are taken the server deals and streams
//!    per-seat notifications
//! 5. **Release**: After `hand_ended` the table empties and a new lobby forms
//!
//! # Message Types
//!
//! ## Client → Server
//!
//! - **hello**: nickname and protocol version
//! - **discard**: `{"tile":"M5"}`
//! - **action**: `{"choice":"PONG"}`, `"CHOW M3,M4"`, `"CONCEALED_KONG EAST"`, `"PASS"`
//!
//! ## Server → Client
//!
//! - **welcome**, **lobby**, **error**
//! - **hand_started**, **state**, **tile_drawn**, **discard_prompt**,
//!   **action_offer**, **discarded**, **action_taken**, **hand_ended**
//!
//! Illegal moves are dropped and logged; only transport problems produce an
//! `error` line.
//!
//! # Environment Variables
//!
//! - `MAHJONG_HOST`: Bind address (default: "127.0.0.1")
//! - `MAHJONG_PORT`: Port number (default: 7878)
//! - `MAHJONG_MAX_PENDING`: Session request queue bound (default: 32)
//! - `MAHJONG_SEED`: Fixed wall seed
//! - `MAHJONG_LOG_PATH`: Append every wire line to this file
//! - `MAHJONG_DISABLED`: Set to "1" or "true" to skip the server entirely
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"ts":0,"nickname":"alice","protocol_version":"1.0.0"}
//! Server -> Client: {"seq":1,"ts":...,"type":"welcome","protocol_version":"1.0.0","client_id":1,"game_id":"tw-mahjong"}
//! Server -> Client: {"seq":1,"ts":...,"type":"lobby","seated":1,"needed":4,"seat":0}
//! ...
//! Server -> Client: {"seq":9,"ts":...,"type":"discard_prompt","seat":0,"message":"please discard"}
//! Client -> Server: {"type":"discard","seq":2,"tile":"NORTH"}
//! ```

pub mod protocol;
pub mod runtime;
pub mod server;

pub use tw_mahjong_core as core;
pub use tw_mahjong_types as types;

pub use protocol::{parse_message, ErrorCode, ParsedMessage, ServerFrame, ServerMessage};
pub use runtime::{spawn_session, SessionHandle, SessionOutput, SessionProbe, SubmitError};
pub use server::{run_server, ServerConfig, ServerState};
