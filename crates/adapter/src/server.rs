//! TCP server for seat clients
//!
//! Handles incoming connections, seats the first four handshaken clients at
//! the table and routes session notifications to their seats.
//! Uses tokio for async networking.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Context;
use arrayvec::ArrayVec;
use log::{debug, error, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::core::{Recipient, SeatEvent, SessionConfig};
use crate::protocol::*;
use crate::runtime::{spawn_session, SessionHandle, SessionOutput, SubmitError};
use crate::types::{ActionChoice, Seat, Tile, SEATS};

fn extract_seq_best_effort(s: &str) -> Option<u64> {
    let start = s.find("\"seq\"")?;
    let after_key = &s[start + 5..];
    let colon = after_key.find(':')?;
    let rest = after_key[colon + 1..].trim_start();
    let end = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if end == 0 {
        return None;
    }
    rest[..end].parse::<u64>().ok()
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub protocol_version: String,
    /// Bound of the session request queue
    pub max_pending_events: usize,
    /// Fixed wall seed; the clock is used when unset
    pub seed: Option<u64>,
    pub log_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
            protocol_version: "1.0.0".to_string(),
            max_pending_events: 32,
            seed: None,
            log_path: None,
        }
    }
}

impl ServerConfig {
    /// Create from `MAHJONG_*` environment variables
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let host = env::var("MAHJONG_HOST").unwrap_or(defaults.host);
        let port = env::var("MAHJONG_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let max_pending_events = env::var("MAHJONG_MAX_PENDING")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_pending_events);

        let seed = env::var("MAHJONG_SEED").ok().and_then(|s| s.trim().parse().ok());

        let log_path = env::var("MAHJONG_LOG_PATH")
            .ok()
            .map(|s| s.trim().to_string())
            .and_then(|s| if s.is_empty() { None } else { Some(s) });

        Self {
            host,
            port,
            protocol_version: defaults.protocol_version,
            max_pending_events,
            seed,
            log_path,
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid socket address {}:{}", self.host, self.port))
    }

    fn accepts_version(&self, requested: &str) -> bool {
        let major = |v: &str| v.split('.').next().map(str::to_string);
        major(requested).is_some() && major(requested) == major(&self.protocol_version)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeatOutcome {
    Seated(Seat),
    AlreadySeated(Seat),
    TableFull,
}

/// The single table: who sits where and the hand being played
#[derive(Debug, Default)]
struct Table {
    seats: [Option<usize>; SEATS],
    nicknames: [String; SEATS],
    session: Option<SessionHandle>,
    hands_started: u64,
}

impl Table {
    fn seat_of(&self, client_id: usize) -> Option<Seat> {
        self.seats.iter().position(|s| *s == Some(client_id))
    }

    fn seated(&self) -> usize {
        self.seats.iter().flatten().count()
    }

    fn take_seat(&mut self, client_id: usize, nickname: &str) -> SeatOutcome {
        if let Some(seat) = self.seat_of(client_id) {
            return SeatOutcome::AlreadySeated(seat);
        }
        if self.session.is_some() {
            return SeatOutcome::TableFull;
        }
        match self.seats.iter().position(Option::is_none) {
            Some(seat) => {
                self.seats[seat] = Some(client_id);
                self.nicknames[seat] = nickname.to_string();
                SeatOutcome::Seated(seat)
            }
            None => SeatOutcome::TableFull,
        }
    }

    /// Free a seat while the lobby is still forming
    fn vacate(&mut self, client_id: usize) -> Option<Seat> {
        if self.session.is_some() {
            return None;
        }
        let seat = self.seat_of(client_id)?;
        self.seats[seat] = None;
        self.nicknames[seat].clear();
        Some(seat)
    }

    /// Clear the table after a hand, if it is still the current one
    fn release(&mut self, session_id: u64) -> bool {
        match &self.session {
            Some(handle) if handle.id() == session_id => {
                *self = Table {
                    hands_started: self.hands_started,
                    ..Table::default()
                };
                true
            }
            _ => false,
        }
    }
}

/// Shared server state
pub struct ServerState {
    config: ServerConfig,
    clients: Arc<RwLock<Vec<ClientHandle>>>,
    table: Arc<RwLock<Table>>,
    out_seq: AtomicU64,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            clients: Arc::new(RwLock::new(Vec::new())),
            table: Arc::new(RwLock::new(Table::default())),
            out_seq: AtomicU64::new(1),
        }
    }

    /// Check if the server is disabled via environment
    pub fn is_disabled() -> bool {
        std::env::var("MAHJONG_DISABLED")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false)
    }

    /// Sequence number for server-originated frames
    fn next_seq(&self) -> u64 {
        self.out_seq.fetch_add(1, Ordering::Relaxed)
    }
}

async fn is_handshaken(state: &Arc<ServerState>, client_id: usize) -> bool {
    let clients = state.clients.read().await;
    clients
        .iter()
        .find(|c| c.id == client_id)
        .map(|c| c.handshaken)
        .unwrap_or(false)
}

async fn check_and_update_seq(state: &Arc<ServerState>, client_id: usize, seq: u64) -> bool {
    let mut clients = state.clients.write().await;
    let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
        return true;
    };

    match client.last_seq {
        Some(prev) if seq <= prev => false,
        _ => {
            client.last_seq = Some(seq);
            true
        }
    }
}

/// Handle to a connected client
pub struct ClientHandle {
    pub id: usize,
    pub addr: SocketAddr,
    pub nickname: Option<String>,
    pub handshaken: bool,
    pub last_seq: Option<u64>,
    pub tx: mpsc::UnboundedSender<ServerFrame>, // Channel to send messages to client
}

#[derive(Debug, Clone)]
enum WireRecord {
    Bytes(Vec<u8>),
    Frame(ServerFrame),
}

fn spawn_wire_log(path: String) -> mpsc::UnboundedSender<WireRecord> {
    let (tx, mut rx) = mpsc::unbounded_channel::<WireRecord>();
    tokio::spawn(async move {
        use tokio::fs::OpenOptions;

        let mut file = match OpenOptions::new().create(true).append(true).open(&path).await {
            Ok(f) => f,
            Err(e) => {
                warn!("[Server] wire log {} unavailable: {}", path, e);
                return;
            }
        };

        let mut buf: Vec<u8> = Vec::with_capacity(4096);

        while let Some(rec) = rx.recv().await {
            match rec {
                WireRecord::Bytes(b) => {
                    if file.write_all(&b).await.is_err() {
                        break;
                    }
                }
                WireRecord::Frame(frame) => {
                    buf.clear();
                    if serde_json::to_writer(&mut buf, &frame).is_err() {
                        continue;
                    }
                    if file.write_all(&buf).await.is_err() {
                        break;
                    }
                }
            }
            if file.write_all(b"\n").await.is_err() {
                break;
            }
        }

        let _ = file.flush().await;
    });
    tx
}

/// Start the TCP server.
///
/// `ready_tx` receives the bound address once the listener is up (useful
/// with port 0).
pub async fn run_server(
    config: ServerConfig,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    if ServerState::is_disabled() {
        info!("[Server] disabled via MAHJONG_DISABLED");
        return Ok(());
    }

    let wire_log_tx = config.log_path.clone().map(spawn_wire_log);

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    let bound = listener.local_addr()?;
    info!("[Server] listening on {}", bound);
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState::new(config));
    let mut client_id_counter = 0usize;

    // Accept incoming connections
    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;

        info!("[Server] Client {} connected from {}", client_id, addr);

        let state_clone = Arc::clone(&state);
        let wire_log_tx = wire_log_tx.clone();

        // Spawn task to handle this client
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, addr, client_id, state_clone, wire_log_tx).await {
                warn!("[Server] Client {} error: {}", client_id, e);
            }
            info!("[Server] Client {} disconnected", client_id);
        });
    }
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    client_id: usize,
    state: Arc<ServerState>,
    wire_log_tx: Option<mpsc::UnboundedSender<WireRecord>>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);

    // Channel to send messages to this client
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerFrame>();

    {
        let mut clients = state.clients.write().await;
        clients.push(ClientHandle {
            id: client_id,
            addr,
            nickname: None,
            handshaken: false,
            last_seq: None,
            tx: tx.clone(),
        });
    }

    let wire_log_tx_out = wire_log_tx.clone();

    // Spawn task to write messages to client
    let write_task = tokio::spawn(async move {
        let mut buf: Vec<u8> = Vec::with_capacity(4096);
        while let Some(frame) = rx.recv().await {
            buf.clear();
            if serde_json::to_writer(&mut buf, &frame).is_err() {
                continue;
            }
            buf.push(b'\n');
            if writer.write_all(&buf).await.is_err() {
                break;
            }
            if writer.flush().await.is_err() {
                break;
            }
            if let Some(tx) = wire_log_tx_out.as_ref() {
                let _ = tx.send(WireRecord::Frame(frame));
            }
        }
    });

    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;

        if bytes_read == 0 {
            // Client disconnected
            break;
        }

        let raw_line = line.trim_end_matches(['\n', '\r']);
        let trimmed = raw_line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(tx) = wire_log_tx.as_ref() {
            let _ = tx.send(WireRecord::Bytes(raw_line.as_bytes().to_vec()));
        }

        match parse_message(trimmed) {
            Ok(ParsedMessage::Hello(hello)) => {
                if is_handshaken(&state, client_id).await
                    && !check_and_update_seq(&state, client_id, hello.seq).await
                {
                    let error = create_error(
                        hello.seq,
                        ErrorCode::InvalidCommand,
                        "seq must be strictly increasing",
                    );
                    let _ = tx.send(error);
                    continue;
                }

                if !state.config.accepts_version(&hello.protocol_version) {
                    let error = create_error(
                        hello.seq,
                        ErrorCode::ProtocolMismatch,
                        &format!("Protocol version {} not supported", hello.protocol_version),
                    );
                    let _ = tx.send(error);
                    break;
                }

                {
                    let mut clients = state.clients.write().await;
                    if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
                        client.handshaken = true;
                        client.last_seq = Some(hello.seq);
                        client.nickname = Some(hello.nickname.clone());
                    }
                }

                let welcome =
                    create_welcome(hello.seq, &state.config.protocol_version, client_id as u64);
                let _ = tx.send(welcome);

                let outcome = state.table.write().await.take_seat(client_id, &hello.nickname);
                match outcome {
                    SeatOutcome::Seated(seat) => {
                        info!(
                            "[Server] Client {} ({}) takes seat {}",
                            client_id, hello.nickname, seat
                        );
                        broadcast_lobby(&state).await;
                        start_hand_if_full(&state).await;
                    }
                    SeatOutcome::AlreadySeated(seat) => {
                        debug!("[Server] Client {} already at seat {}", client_id, seat);
                    }
                    SeatOutcome::TableFull => {
                        let error = create_error(hello.seq, ErrorCode::TableFull, "Table is full");
                        let _ = tx.send(error);
                    }
                }
            }

            Ok(ParsedMessage::Discard(msg)) => {
                let Some(seq) = admit(&state, client_id, msg.seq, &tx).await else {
                    continue;
                };
                let Some(tile) = Tile::from_name(&msg.tile) else {
                    let error = create_error(
                        seq,
                        ErrorCode::InvalidCommand,
                        &format!("Unknown tile: {}", msg.tile),
                    );
                    let _ = tx.send(error);
                    continue;
                };
                submit_for_client(&state, client_id, seq, &tx, |seat| {
                    SeatEvent::discard(seat, tile)
                })
                .await;
            }

            Ok(ParsedMessage::Action(msg)) => {
                let Some(seq) = admit(&state, client_id, msg.seq, &tx).await else {
                    continue;
                };
                let Some(choice) = ActionChoice::parse(&msg.choice) else {
                    let error = create_error(
                        seq,
                        ErrorCode::InvalidCommand,
                        &format!("Unknown action: {}", msg.choice),
                    );
                    let _ = tx.send(error);
                    continue;
                };
                submit_for_client(&state, client_id, seq, &tx, |seat| {
                    SeatEvent::respond(seat, choice)
                })
                .await;
            }

            Ok(ParsedMessage::Unknown(unknown)) => {
                if is_handshaken(&state, client_id).await
                    && !check_and_update_seq(&state, client_id, unknown.seq).await
                {
                    let error = create_error(
                        unknown.seq,
                        ErrorCode::InvalidCommand,
                        "seq must be strictly increasing",
                    );
                    let _ = tx.send(error);
                    continue;
                }
                let error =
                    create_error(unknown.seq, ErrorCode::InvalidCommand, "Unknown message type");
                let _ = tx.send(error);
            }

            Err(e) => {
                let seq = extract_seq_best_effort(trimmed).unwrap_or(0);
                let error = create_error(
                    seq,
                    ErrorCode::InvalidCommand,
                    &format!("JSON parse error: {}", e),
                );
                let _ = tx.send(error);
            }
        }
    }

    // Clean up: remove client and free its seat if no hand is running.
    state.clients.write().await.retain(|c| c.id != client_id);
    let vacated = {
        let mut table = state.table.write().await;
        match table.vacate(client_id) {
            Some(seat) => Some(seat),
            None => {
                if let Some(seat) = table.seat_of(client_id) {
                    warn!("[Server] seat {} left during a hand", seat);
                }
                None
            }
        }
    };
    if let Some(seat) = vacated {
        info!("[Server] seat {} freed", seat);
        broadcast_lobby(&state).await;
    }

    // Cancel write task
    drop(tx);
    let _ = write_task.await;

    Ok(())
}

/// Handshake and sequencing gate for game commands
async fn admit(
    state: &Arc<ServerState>,
    client_id: usize,
    seq: u64,
    tx: &mpsc::UnboundedSender<ServerFrame>,
) -> Option<u64> {
    if !is_handshaken(state, client_id).await {
        let error = create_error(seq, ErrorCode::HandshakeRequired, "Send hello first");
        let _ = tx.send(error);
        return None;
    }
    if !check_and_update_seq(state, client_id, seq).await {
        let error = create_error(
            seq,
            ErrorCode::InvalidCommand,
            "seq must be strictly increasing",
        );
        let _ = tx.send(error);
        return None;
    }
    Some(seq)
}

/// Queue an event for the client's seat.
///
/// Game-level rejections are logged by the session; only transport problems
/// are reported back.
async fn submit_for_client(
    state: &Arc<ServerState>,
    client_id: usize,
    seq: u64,
    tx: &mpsc::UnboundedSender<ServerFrame>,
    make_event: impl FnOnce(Seat) -> SeatEvent,
) {
    let (seat, session) = {
        let table = state.table.read().await;
        (table.seat_of(client_id), table.session.clone())
    };
    let Some(seat) = seat else {
        let _ = tx.send(create_error(seq, ErrorCode::NotSeated, "Not seated at the table"));
        return;
    };
    let Some(session) = session else {
        let _ = tx.send(create_error(seq, ErrorCode::InvalidCommand, "No hand in progress"));
        return;
    };

    match session.try_submit(make_event(seat)) {
        Ok(_verdict) => {}
        Err(SubmitError::Backpressure) => {
            let _ = tx.send(create_error(seq, ErrorCode::Backpressure, "Event queue is full"));
        }
        Err(e) => {
            debug!("[Server] seat {} submit failed: {}", seat, e);
            let _ = tx.send(create_error(seq, ErrorCode::InvalidCommand, "No hand in progress"));
        }
    }
}

async fn broadcast_lobby(state: &Arc<ServerState>) {
    let seats = state.table.read().await.seats;
    let seated = seats.iter().flatten().count();
    let clients = state.clients.read().await;
    for (seat, client_id) in seats
        .iter()
        .enumerate()
        .filter_map(|(seat, id)| id.map(|id| (seat, id)))
    {
        if let Some(c) = clients.iter().find(|c| c.id == client_id) {
            let _ = c.tx.send(create_lobby(state.next_seq(), seated, Some(seat)));
        }
    }
}

async fn start_hand_if_full(state: &Arc<ServerState>) {
    let started = {
        let mut table = state.table.write().await;
        if table.seated() < SEATS || table.session.is_some() {
            return;
        }
        table.hands_started += 1;
        let session_id = table.hands_started;
        let seed = state
            .config
            .seed
            .map(|s| s.wrapping_add(session_id - 1))
            .unwrap_or_else(current_timestamp_ms);

        match spawn_session(
            session_id,
            SessionConfig::new(seed),
            None,
            state.config.max_pending_events,
        ) {
            Ok((handle, out_rx)) => {
                table.session = Some(handle.clone());
                (handle, out_rx, table.seats, table.nicknames.to_vec())
            }
            Err(e) => {
                error!("[Server] could not start hand: {}", e);
                return;
            }
        }
    };

    let (handle, out_rx, seats, nicknames) = started;
    info!("[Server] table full, starting hand {}", handle.id());
    tokio::spawn(dispatch_session(Arc::clone(state), out_rx, seats, nicknames));
    if let Err(e) = handle.start().await {
        error!("[Server] hand {} failed to start: {}", handle.id(), e);
    }
}

/// Route session notifications to the seated clients
async fn dispatch_session(
    state: Arc<ServerState>,
    mut out_rx: mpsc::UnboundedReceiver<SessionOutput>,
    seats: [Option<usize>; SEATS],
    nicknames: Vec<String>,
) {
    while let Some(output) = out_rx.recv().await {
        let (recipient, message) =
            ServerMessage::from_notification(&output.notification, &nicknames);
        let targets: ArrayVec<usize, SEATS> = match recipient {
            Recipient::Seat(seat) => seats.get(seat).copied().flatten().into_iter().collect(),
            Recipient::All => seats.iter().flatten().copied().collect(),
        };

        let hand_over = matches!(message, ServerMessage::HandEnded { .. });
        let frame = ServerFrame::new(state.next_seq(), message);
        {
            let clients = state.clients.read().await;
            for c in clients.iter().filter(|c| targets.contains(&c.id)) {
                let _ = c.tx.send(frame.clone());
            }
        }

        if hand_over {
            if state.table.write().await.release(output.session_id) {
                info!("[Server] hand {} over, table released", output.session_id);
            }
        }
    }
    debug!("[Server] dispatcher stopped");
}
