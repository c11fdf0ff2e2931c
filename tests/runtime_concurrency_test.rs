//! Concurrent submissions through the session actor are serialized.

use tw_mahjong::adapter::runtime::{spawn_session, SubmitError};
use tw_mahjong::core::{ActionError, PhaseKind, SeatEvent, SessionConfig, TableLayout};
use tw_mahjong::types::{ActionChoice, HandOutcome, Tile, WinSource};

fn tiles(names: &str) -> Vec<Tile> {
    names
        .split_whitespace()
        .map(|n| Tile::from_name(n).unwrap())
        .collect()
}

/// Seats 1 and 2 both win on S5, which seat 0 draws first
fn double_win_layout() -> TableLayout {
    let hands = [
        tiles("EAST SOUTH WEST NORTH RED GREEN WHITE P4 P7 S2 S7 M1 M9"),
        tiles("M1 M2 M3 M4 M5 M6 M7 M8 M9 P1 P1 S4 S6"),
        tiles("M1 M2 M3 M4 M5 M6 M7 M8 M9 P2 P2 S4 S6"),
        tiles("EAST SOUTH WEST NORTH RED GREEN WHITE P3 P6 P9 S1 S8 S9"),
    ];
    TableLayout::new(hands, tiles("S5 P5 P5 P5 P5"))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_wins_accept_exactly_one() {
    let (handle, _out) = spawn_session(1, SessionConfig::new(0), Some(double_win_layout()), 16)
        .expect("valid layout");
    handle.start().await.unwrap();
    handle
        .submit(SeatEvent::discard(0, Tile::from_name("S5").unwrap()))
        .await
        .unwrap();

    let probe = handle.inspect().await.unwrap();
    assert_eq!(probe.phase, PhaseKind::ReactionWindow);
    assert_eq!(probe.pending_seats, vec![1, 2]);

    let a = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.submit(SeatEvent::respond(1, ActionChoice::Win)).await })
    };
    let b = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.submit(SeatEvent::respond(2, ActionChoice::Win)).await })
    };
    let results = [a.await.unwrap(), b.await.unwrap()];

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(accepted, 1);
    let rejected = results
        .iter()
        .find_map(|r| r.as_ref().err())
        .expect("one submission rejected");
    assert!(matches!(
        rejected,
        SubmitError::Rejected(ActionError::HandOver)
    ));

    let probe = handle.inspect().await.unwrap();
    assert_eq!(probe.phase, PhaseKind::HandComplete);
    let winner = if results[0].is_ok() { 1 } else { 2 };
    match probe.outcome {
        Some(HandOutcome::Win {
            winner: w, source, ..
        }) => {
            assert_eq!(w, winner);
            assert_eq!(source, WinSource::Discard { from: 0 });
        }
        other => panic!("Expected a win, got {:?}", other),
    }
    assert_eq!(probe.concealed[winner].len(), 14);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_duplicate_discards_apply_once() {
    let (handle, _out) = spawn_session(2, SessionConfig::new(0), Some(double_win_layout()), 16)
        .expect("valid layout");
    handle.start().await.unwrap();
    let s5 = Tile::from_name("S5").unwrap();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            handle.submit(SeatEvent::discard(0, s5)).await
        }));
    }
    let mut ok = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(()) => ok += 1,
            Err(e) => assert!(matches!(
                e,
                SubmitError::Rejected(ActionError::ReactionPending)
            )),
        }
    }

    assert_eq!(ok, 1);
    let probe = handle.inspect().await.unwrap();
    assert_eq!(probe.sea, vec![s5]);
    assert_eq!(probe.pending_discard, Some((s5, 0)));
    assert_eq!(probe.tiles_in_play, 4 * 13 + 5);
}
