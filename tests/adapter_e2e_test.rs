//! Four TCP clients play a full hand against the real server.

use std::net::SocketAddr;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

use tw_mahjong::adapter::protocol::{create_action, create_discard, create_hello};
use tw_mahjong::adapter::{run_server, ServerConfig};
use tw_mahjong::types::Tile;

struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    seq: u64,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (r, w) = stream.into_split();
        Self {
            reader: BufReader::new(r),
            writer: w,
            seq: 0,
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    async fn write_line(&mut self, mut line: String) {
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await.unwrap();
    }

    /// Raw JSON for messages the protocol builders cannot express
    async fn send(&mut self, mut msg: Value) {
        msg["seq"] = json!(self.next_seq());
        msg["ts"] = json!(0);
        self.write_line(msg.to_string()).await;
    }

    async fn hello_with_version(&mut self, nickname: &str, version: &str) {
        let seq = self.next_seq();
        let line = serde_json::to_string(&create_hello(seq, nickname, version)).unwrap();
        self.write_line(line).await;
    }

    async fn hello(&mut self, nickname: &str) {
        self.hello_with_version(nickname, "1.0.0").await;
    }

    async fn discard(&mut self, tile: Tile) {
        let seq = self.next_seq();
        let line = serde_json::to_string(&create_discard(seq, tile)).unwrap();
        self.write_line(line).await;
    }

    async fn action(&mut self, choice: &str) {
        let seq = self.next_seq();
        let line = serde_json::to_string(&create_action(seq, choice)).unwrap();
        self.write_line(line).await;
    }

    /// Next line, or None on EOF
    async fn recv(&mut self) -> Option<Value> {
        let mut line = String::new();
        let n = tokio::time::timeout(Duration::from_secs(10), self.reader.read_line(&mut line))
            .await
            .expect("server went quiet")
            .unwrap();
        if n == 0 {
            return None;
        }
        Some(serde_json::from_str(&line).unwrap())
    }

    async fn recv_type(&mut self, ty: &str) -> Value {
        loop {
            let msg = self.recv().await.expect("connection closed");
            if msg["type"] == ty {
                return msg;
            }
        }
    }
}

async fn start_server() -> SocketAddr {
    let config = ServerConfig {
        port: 0,
        seed: Some(2024),
        ..ServerConfig::default()
    };
    let (ready_tx, ready_rx) = oneshot::channel();
    tokio::spawn(async move {
        let _ = run_server(config, Some(ready_tx)).await;
    });
    ready_rx.await.unwrap()
}

/// Pass every offer, discard the first tile of the hand when prompted
async fn play_passively(mut client: Client, seat: u64) -> (Value, usize) {
    let mut hand: Vec<String> = Vec::new();
    let mut discards = 0;
    loop {
        let msg = client.recv().await.expect("connection closed mid-hand");
        match msg["type"].as_str().unwrap() {
            "state" => {
                assert_eq!(msg["my_seat"], seat);
                hand = msg["hand"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|t| t.as_str().unwrap().to_string())
                    .collect();
            }
            "discard_prompt" => {
                assert_eq!(msg["seat"], seat);
                let tile = Tile::from_name(&hand[0]).unwrap();
                client.discard(tile).await;
                discards += 1;
            }
            "action_offer" => {
                let choices = msg["choices"].as_array().unwrap();
                assert_eq!(choices.last().unwrap(), "PASS");
                client.action("PASS").await;
            }
            "hand_ended" => return (msg, discards),
            "error" => panic!("unexpected error: {}", msg),
            _ => {}
        }
    }
}

#[tokio::test]
async fn test_four_clients_play_a_hand_to_wall_exhaustion() {
    let addr = start_server().await;

    let mut clients = Vec::new();
    for (i, name) in ["east", "south", "west", "north"].iter().enumerate() {
        let mut c = Client::connect(addr).await;
        c.hello(name).await;
        let welcome = c.recv_type("welcome").await;
        assert_eq!(welcome["seq"], 1);
        assert_eq!(welcome["protocol_version"], "1.0.0");
        let lobby = c.recv_type("lobby").await;
        assert_eq!(lobby["seat"], i as u64);
        assert_eq!(lobby["seated"], (i + 1) as u64);
        assert_eq!(lobby["needed"], 4);
        clients.push(c);
    }

    // a fifth client is turned away
    let mut late = Client::connect(addr).await;
    late.hello("late").await;
    late.recv_type("welcome").await;
    let err = late.recv_type("error").await;
    assert_eq!(err["code"], "table_full");

    let mut tasks = Vec::new();
    for (seat, c) in clients.into_iter().enumerate() {
        tasks.push(tokio::spawn(play_passively(c, seat as u64)));
    }

    let mut total_discards = 0;
    for task in tasks {
        let (ended, discards) = task.await.unwrap();
        assert_eq!(ended["reason"], "wall_exhausted");
        assert!(ended.get("winner").is_none());
        total_discards += discards;
    }
    // dealer's 17th tile plus every wall draw was discarded
    assert_eq!(total_discards, 136 - 64);
}

#[tokio::test]
async fn test_handshake_and_version_checks() {
    let addr = start_server().await;

    let mut c = Client::connect(addr).await;
    c.discard(Tile::from_name("M1").unwrap()).await;
    let err = c.recv_type("error").await;
    assert_eq!(err["code"], "handshake_required");
    assert_eq!(err["seq"], 1);

    c.hello_with_version("old", "0.9.0").await;
    let err = c.recv_type("error").await;
    assert_eq!(err["code"], "protocol_mismatch");
    // server hangs up after a version mismatch
    assert!(c.recv().await.is_none());
}

#[tokio::test]
async fn test_bad_lines_get_invalid_command() {
    let addr = start_server().await;

    let mut c = Client::connect(addr).await;
    c.hello("tester").await;
    c.recv_type("lobby").await;

    c.writer.write_all(b"{not json\n").await.unwrap();
    let err = c.recv_type("error").await;
    assert_eq!(err["code"], "invalid_command");

    c.send(json!({"type": "dance"})).await;
    let err = c.recv_type("error").await;
    assert_eq!(err["code"], "invalid_command");
    assert_eq!(err["seq"], 2);

    c.send(json!({"type": "discard", "tile": "Z9"})).await;
    let err = c.recv_type("error").await;
    assert_eq!(err["code"], "invalid_command");

    // seated but no hand yet
    c.action("PASS").await;
    let err = c.recv_type("error").await;
    assert_eq!(err["code"], "invalid_command");

    // replayed seq
    c.seq = 1;
    c.action("PASS").await;
    let err = c.recv_type("error").await;
    assert_eq!(err["message"], "seq must be strictly increasing");
}

#[tokio::test]
async fn test_leaving_lobby_frees_the_seat() {
    let addr = start_server().await;

    let mut first = Client::connect(addr).await;
    first.hello("first").await;
    assert_eq!(first.recv_type("lobby").await["seat"], 0);

    let mut second = Client::connect(addr).await;
    second.hello("second").await;
    assert_eq!(second.recv_type("lobby").await["seat"], 1);

    drop(first);
    let lobby = second.recv_type("lobby").await;
    assert_eq!(lobby["seated"], 1);

    let mut third = Client::connect(addr).await;
    third.hello("third").await;
    assert_eq!(third.recv_type("lobby").await["seat"], 0);
}
