//! Session actor.
//!
//! One task owns a [`GameSession`] and applies requests strictly in arrival
//! order, so concurrent seats never race on game state. Requests come in on a
//! bounded channel; notifications leave on an unbounded one.

use log::{debug, info, warn};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::core::{ActionError, GameSession, LayoutError, Notification, PhaseKind, SeatEvent};
use crate::core::{SessionConfig, TableLayout};
use crate::types::{HandOutcome, Meld, Seat, Tier, Tile, SEATS};

/// Request delivered to the session task.
#[derive(Debug)]
pub enum SessionRequest {
    Start,
    Event {
        event: SeatEvent,
        reply: oneshot::Sender<Result<(), ActionError>>,
    },
    Inspect {
        reply: oneshot::Sender<SessionProbe>,
    },
}

/// Notification tagged with the session that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutput {
    pub session_id: u64,
    pub notification: Notification,
}

/// Read-only copy of session state, taken between two requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProbe {
    pub phase: PhaseKind,
    pub turn: Seat,
    pub wall_remaining: usize,
    pub pending_seats: Vec<Seat>,
    pub queued_tiers: Vec<Tier>,
    pub pending_discard: Option<(Tile, Seat)>,
    pub outcome: Option<HandOutcome>,
    pub concealed: [Vec<Tile>; SEATS],
    pub melds: [Vec<Meld>; SEATS],
    pub sea: Vec<Tile>,
    pub tiles_in_play: usize,
}

impl SessionProbe {
    fn capture(session: &GameSession) -> Self {
        let concealed = std::array::from_fn(|s| {
            session
                .hand(s)
                .map(|h| h.concealed().to_vec())
                .unwrap_or_default()
        });
        let melds = std::array::from_fn(|s| {
            session
                .hand(s)
                .map(|h| h.melds().to_vec())
                .unwrap_or_default()
        });
        Self {
            phase: session.phase_kind(),
            turn: session.turn(),
            wall_remaining: session.wall_remaining(),
            pending_seats: session.pending_seats(),
            queued_tiers: session.queued_tiers(),
            pending_discard: session.pending_discard(),
            outcome: session.outcome(),
            concealed,
            melds,
            sea: session.sea().to_vec(),
            tiles_in_play: session.tiles_in_play(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Rejected(#[from] ActionError),
    #[error("session request queue is full")]
    Backpressure,
    #[error("session task has stopped")]
    Closed,
}

/// Cloneable handle to a running session task
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: u64,
    tx: mpsc::Sender<SessionRequest>,
}

impl SessionHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Deal (if needed) and run the first draw.
    pub async fn start(&self) -> Result<(), SubmitError> {
        self.tx
            .send(SessionRequest::Start)
            .await
            .map_err(|_| SubmitError::Closed)
    }

    /// Submit an event and wait for the session's verdict.
    ///
    /// Notifications caused by the event are on the output channel before
    /// this returns.
    pub async fn submit(&self, event: SeatEvent) -> Result<(), SubmitError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionRequest::Event { event, reply })
            .await
            .map_err(|_| SubmitError::Closed)?;
        rx.await.map_err(|_| SubmitError::Closed)??;
        Ok(())
    }

    /// Queue an event without waiting for room in the request queue.
    pub fn try_submit(
        &self,
        event: SeatEvent,
    ) -> Result<oneshot::Receiver<Result<(), ActionError>>, SubmitError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .try_send(SessionRequest::Event { event, reply })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => SubmitError::Backpressure,
                mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
            })?;
        Ok(rx)
    }

    pub async fn inspect(&self) -> Result<SessionProbe, SubmitError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionRequest::Inspect { reply })
            .await
            .map_err(|_| SubmitError::Closed)?;
        rx.await.map_err(|_| SubmitError::Closed)
    }
}

/// Spawn a session task on the current tokio runtime.
///
/// With a layout the hand is scripted; otherwise the wall is shuffled from
/// `config.seed`. The task stops once every handle is dropped.
pub fn spawn_session(
    session_id: u64,
    config: SessionConfig,
    layout: Option<TableLayout>,
    max_pending: usize,
) -> Result<(SessionHandle, mpsc::UnboundedReceiver<SessionOutput>), LayoutError> {
    let mut session = match layout {
        Some(layout) => GameSession::from_layout(config, layout)?,
        None => GameSession::new(config),
    };

    let (tx, mut rx) = mpsc::channel::<SessionRequest>(max_pending.max(1));
    let (out_tx, out_rx) = mpsc::unbounded_channel::<SessionOutput>();

    tokio::spawn(async move {
        info!(
            "[Session {}] started (seed {}, dealer {})",
            session_id, config.seed, config.dealer
        );
        while let Some(request) = rx.recv().await {
            match request {
                SessionRequest::Start => {
                    session.start();
                    flush(&mut session, &out_tx, session_id);
                }
                SessionRequest::Event { event, reply } => {
                    let result = session.handle(event);
                    if let Err(e) = &result {
                        warn!("[Session {}] seat {} rejected: {}", session_id, event.seat, e);
                    }
                    flush(&mut session, &out_tx, session_id);
                    let _ = reply.send(result);
                }
                SessionRequest::Inspect { reply } => {
                    let _ = reply.send(SessionProbe::capture(&session));
                }
            }
        }
        debug!("[Session {}] all handles dropped, stopping", session_id);
    });

    Ok((
        SessionHandle {
            id: session_id,
            tx,
        },
        out_rx,
    ))
}

fn flush(
    session: &mut GameSession,
    out_tx: &mpsc::UnboundedSender<SessionOutput>,
    session_id: u64,
) {
    for notification in session.drain_notifications() {
        if out_tx
            .send(SessionOutput {
                session_id,
                notification,
            })
            .is_err()
        {
            // Nobody is listening; keep the session alive for inspection.
            break;
        }
    }
}
