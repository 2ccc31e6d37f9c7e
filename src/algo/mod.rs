pub mod bellman;

pub use bellman::{History, HistoryGame, HistoryGameConfig, Move};
