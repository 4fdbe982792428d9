// Copyright 2026 abhirupbanerjee
// Licensed under the Apache License, Version 2.0

//! Typed errors for forum operations.

use std::path::PathBuf;

use hush_circuits::SynthesisError;

/// Proof generation and formatting failures. Both circuits share this type,
/// so every variant names the circuit it came from.
#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    #[error("{circuit}: cannot read artifact {path}: {source}")]
    Artifact {
        circuit: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{circuit}: malformed artifact {path}: {reason}")]
    MalformedArtifact {
        circuit: &'static str,
        path: PathBuf,
        reason: String,
    },

    #[error("{circuit}: synthesis failed: {source}")]
    Synthesis {
        circuit: &'static str,
        #[source]
        source: SynthesisError,
    },

    #[error("{circuit}: expected {expected} public signals, got {got}")]
    PublicSignals {
        circuit: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{circuit}: public signal {index} is not a field element: {value:?}")]
    InvalidSignal {
        circuit: &'static str,
        index: usize,
        value: String,
    },

    #[error("{circuit}: malformed proof: {reason}")]
    MalformedProof { circuit: &'static str, reason: String },

    #[error("identity is not a member of the group")]
    NotAMember,

    #[error("note derivation failed: {0}")]
    Note(#[from] hush_hash::HashError),

    #[error("prover task aborted: {0}")]
    Join(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ForumError {
    #[error("Upload to IPFS failed")]
    Upload,

    #[error("ipfs: {0}")]
    Ipfs(String),

    #[error(transparent)]
    Proof(#[from] ProofError),

    #[error(transparent)]
    Hash(#[from] hush_hash::HashError),

    #[error("relayer ({status}): {message}")]
    Relayer { status: u16, message: String },

    #[error("relayer response missing {0}")]
    MissingField(&'static str),

    #[error("caller does not own this item")]
    NotOwner,

    #[error("invalid content id: {0}")]
    InvalidCid(String),

    #[error("config: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ForumResult<T> = Result<T, ForumError>;
