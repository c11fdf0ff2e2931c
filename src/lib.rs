//! Taiwan Mahjong (workspace facade crate).
//!
//! Exposes `tw_mahjong::{types,core,adapter}` while the implementation lives in
//! dedicated crates under `crates/`.

pub use tw_mahjong_adapter as adapter;
pub use tw_mahjong_core as core;
pub use tw_mahjong_types as types;
