//! Follows the forum contract's logs and writes each event into the shared
//! JSON cache, so cached documents converge on chain state.

pub mod api;
pub mod db;
pub mod rpc;
pub mod watcher;
