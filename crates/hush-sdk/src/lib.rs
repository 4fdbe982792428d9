// Copyright 2026 abhirupbanerjee
// Licensed under the Apache License, Version 2.0

//! # hush-sdk
//!
//! Client library for **hush**, an anonymous token-gated forum.
//!
//! Members post, comment, vote and run polls under a group-membership
//! zero-knowledge proof; authorship is tracked by a Pedersen **Note** that
//! only the author can later prove ownership of. Content lives on IPFS, the
//! contract stores its `bytes32` pointer, and a relayer submits the
//! transactions so members never sign with their wallet.
//!
//! ## Crate layout
//!
//! | Module | Purpose |
//! |---|---|
//! | *crate root* | Re-exports identity and note types and derivations |
//! | [`entities`] | Create / edit / vote / delete items, create / join groups |
//! | [`prove`] | Groth16 artifacts, proving, Solidity proof layout |
//! | [`content`] | CIDv0 ↔ `bytes32`, IPFS client |
//! | [`cache`] | Stale-while-revalidate JSON cache over RedisJSON |
//! | [`reconcile`] | Optimistic placeholders and vote tallies |
//! | [`relayer`] | Relayer HTTP client |
//! | [`events`] | Contract events and their cache effects |
//! | [`state`] | Community state reducer |
//! | [`config`] | `~/.hush/config.json` with `HUSH_*` overrides |
//!
//! ## Typical flow
//!
//! ```rust,no_run
//! use hush_sdk::{derive_identity, derive_note, IdentitySeed};
//!
//! # fn example() -> hush_sdk::error::ForumResult<()> {
//! // 1. Derive the member's identity for a group
//! let seed = IdentitySeed::new("0xAbC").in_group(1);
//! let identity = derive_identity(&seed);
//!
//! // 2. The Note that marks their authorship
//! let note = derive_note(&identity)?;
//! println!("note {}", note.to_decimal());
//!
//! // 3. Actions go through `entities::ItemService`, which uploads,
//! //    proves, calls the relayer and updates the cache.
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod content;
pub mod entities;
pub mod error;
pub mod events;
pub mod models;
pub mod prove;
pub mod reconcile;
pub mod relayer;
pub mod state;

pub use hush_hash::{
    derive_identity, derive_note, external_nullifier, identity_commitment, nullifier_hash, signal_hash,
};
pub use hush_types::{Identity, IdentitySeed, Note};
