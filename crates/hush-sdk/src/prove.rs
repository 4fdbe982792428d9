// Copyright 2026 abhirupbanerjee
// Licensed under the Apache License, Version 2.0

//! Groth16 proof generation for the forum circuits.
//!
//! Both circuits share one adapter: keys are loaded from the artifacts
//! directory, proving runs on a blocking thread, and the result is
//! reshaped into the `(a, b, c)` decimal-string layout that Solidity
//! Groth16 verifiers take.
//!
//! # Artifacts
//!
//! | Circuit | Files |
//! |---|---|
//! | [`Circuit::Membership`] | `membership.pk`, `membership.vk` |
//! | [`Circuit::VerifyOwner`] | `verify_owner.pk`, `verify_owner.vk` |
//!
//! Keys use arkworks compressed serialization. [`setup_artifacts`] writes
//! them from a fixed seed, so every machine derives the same verifying keys.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use ark_bls12_381::{Bls12_381, Fq, Fq2, Fr, G1Affine, G2Affine};
use ark_ff::PrimeField;
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{rngs::StdRng, SeedableRng};
use rand::rngs::OsRng;
use hush_circuits::{membership, ownership, GroupTree, SynthesisError};
use hush_types::Identity;
use serde::{Deserialize, Serialize};

use crate::error::ProofError;
use crate::models::{fr_from_decimal, fr_to_decimal};

/// Seed for the reproducible circuit-specific setup.
pub const SETUP_SEED: u64 = 42;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Circuit {
    Membership,
    VerifyOwner,
}

impl Circuit {
    pub const ALL: [Circuit; 2] = [Circuit::Membership, Circuit::VerifyOwner];

    pub fn name(self) -> &'static str {
        match self {
            Circuit::Membership => "membership",
            Circuit::VerifyOwner => "verify_owner",
        }
    }

    /// Number of public signals the circuit exposes.
    pub fn public_signal_count(self) -> usize {
        match self {
            Circuit::Membership => 4,
            Circuit::VerifyOwner => 1,
        }
    }

    pub fn artifacts(self, dir: &Path) -> ArtifactPaths {
        ArtifactPaths {
            proving_key: dir.join(format!("{}.pk", self.name())),
            verifying_key: dir.join(format!("{}.vk", self.name())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub proving_key: PathBuf,
    pub verifying_key: PathBuf,
}

/// Proof in Solidity verifier layout. `b` coordinates are `[c1, c0]`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SolidityProof {
    pub a: [String; 2],
    pub b: [[String; 2]; 2],
    pub c: [String; 2],
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FormattedProof {
    pub proof: SolidityProof,
    pub public_signals: Vec<String>,
}

fn fq_dec(f: &Fq) -> String {
    f.into_bigint().to_string()
}

fn synthesis(circuit: Circuit) -> impl Fn(SynthesisError) -> ProofError {
    move |source| ProofError::Synthesis {
        circuit: circuit.name(),
        source,
    }
}

fn check_signal_count(circuit: Circuit, got: usize) -> Result<(), ProofError> {
    let expected = circuit.public_signal_count();
    if got != expected {
        return Err(ProofError::PublicSignals {
            circuit: circuit.name(),
            expected,
            got,
        });
    }
    Ok(())
}

pub fn format_for_solidity(
    circuit: Circuit,
    proof: &Proof<Bls12_381>,
    public_signals: &[Fr],
) -> Result<FormattedProof, ProofError> {
    check_signal_count(circuit, public_signals.len())?;
    Ok(FormattedProof {
        proof: SolidityProof {
            a: [fq_dec(&proof.a.x), fq_dec(&proof.a.y)],
            b: [
                [fq_dec(&proof.b.x.c1), fq_dec(&proof.b.x.c0)],
                [fq_dec(&proof.b.y.c1), fq_dec(&proof.b.y.c0)],
            ],
            c: [fq_dec(&proof.c.x), fq_dec(&proof.c.y)],
        },
        public_signals: public_signals.iter().map(fr_to_decimal).collect(),
    })
}

/// Parse decimal public signals, rejecting a wrong count or any value that
/// is not a canonical field element.
pub fn parse_public_signals(circuit: Circuit, signals: &[String]) -> Result<Vec<Fr>, ProofError> {
    check_signal_count(circuit, signals.len())?;
    signals
        .iter()
        .enumerate()
        .map(|(index, s)| {
            fr_from_decimal(s).ok_or_else(|| ProofError::InvalidSignal {
                circuit: circuit.name(),
                index,
                value: s.clone(),
            })
        })
        .collect()
}

fn fq_from_dec(circuit: Circuit, s: &str) -> Result<Fq, ProofError> {
    Fq::from_str(s).map_err(|_| ProofError::MalformedProof {
        circuit: circuit.name(),
        reason: format!("coordinate {s:?} is not a base field element"),
    })
}

fn off_curve(circuit: Circuit, point: &str) -> ProofError {
    ProofError::MalformedProof {
        circuit: circuit.name(),
        reason: format!("{point} is not in the prime-order subgroup"),
    }
}

fn g1_from_dec(circuit: Circuit, xy: &[String; 2], point: &str) -> Result<G1Affine, ProofError> {
    let p = G1Affine::new_unchecked(fq_from_dec(circuit, &xy[0])?, fq_from_dec(circuit, &xy[1])?);
    if !(p.is_on_curve() && p.is_in_correct_subgroup_assuming_on_curve()) {
        return Err(off_curve(circuit, point));
    }
    Ok(p)
}

/// Inverse of the layout [`format_for_solidity`] produces.
pub fn parse_solidity_proof(circuit: Circuit, proof: &SolidityProof) -> Result<Proof<Bls12_381>, ProofError> {
    let [x, y] = &proof.b;
    let b = G2Affine::new_unchecked(
        Fq2::new(fq_from_dec(circuit, &x[1])?, fq_from_dec(circuit, &x[0])?),
        Fq2::new(fq_from_dec(circuit, &y[1])?, fq_from_dec(circuit, &y[0])?),
    );
    if !(b.is_on_curve() && b.is_in_correct_subgroup_assuming_on_curve()) {
        return Err(off_curve(circuit, "b"));
    }
    Ok(Proof {
        a: g1_from_dec(circuit, &proof.a, "a")?,
        b,
        c: g1_from_dec(circuit, &proof.c, "c")?,
    })
}

/// Check a formatted proof the way an on-chain verifier would, against
/// the circuit's verifying key.
pub fn verify_formatted(
    vk: &VerifyingKey<Bls12_381>,
    circuit: Circuit,
    formatted: &FormattedProof,
) -> Result<bool, ProofError> {
    let proof = parse_solidity_proof(circuit, &formatted.proof)?;
    let public = parse_public_signals(circuit, &formatted.public_signals)?;
    let pvk = PreparedVerifyingKey::from(vk.clone());
    Groth16::<Bls12_381>::verify_with_processed_vk(&pvk, &public, &proof).map_err(synthesis(circuit))
}

fn write_key<T: CanonicalSerialize>(circuit: Circuit, path: &Path, key: &T) -> Result<(), ProofError> {
    let mut bytes = Vec::new();
    key.serialize_compressed(&mut bytes)
        .map_err(|e| ProofError::MalformedArtifact {
            circuit: circuit.name(),
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    fs::write(path, bytes).map_err(|source| ProofError::Artifact {
        circuit: circuit.name(),
        path: path.to_path_buf(),
        source,
    })
}

fn read_bytes(circuit: Circuit, path: &Path) -> Result<Vec<u8>, ProofError> {
    fs::read(path).map_err(|source| ProofError::Artifact {
        circuit: circuit.name(),
        path: path.to_path_buf(),
        source,
    })
}

fn malformed(circuit: Circuit, path: &Path) -> impl Fn(ark_serialize::SerializationError) -> ProofError + '_ {
    move |e| ProofError::MalformedArtifact {
        circuit: circuit.name(),
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

pub fn load_verifying_key(dir: &Path, circuit: Circuit) -> Result<VerifyingKey<Bls12_381>, ProofError> {
    let path = circuit.artifacts(dir).verifying_key;
    let bytes = read_bytes(circuit, &path)?;
    VerifyingKey::deserialize_compressed(&bytes[..]).map_err(malformed(circuit, &path))
}

fn load_proving_key(dir: &Path, circuit: Circuit) -> Result<ProvingKey<Bls12_381>, ProofError> {
    let path = circuit.artifacts(dir).proving_key;
    let bytes = read_bytes(circuit, &path)?;
    // our own artifact; subgroup checks on every point are too slow here
    ProvingKey::deserialize_compressed_unchecked(&bytes[..]).map_err(malformed(circuit, &path))
}

/// Run the seeded setup for both circuits and write their keys to `dir`.
pub fn setup_artifacts(dir: &Path) -> Result<Vec<ArtifactPaths>, ProofError> {
    fs::create_dir_all(dir).map_err(|source| ProofError::Artifact {
        circuit: Circuit::Membership.name(),
        path: dir.to_path_buf(),
        source,
    })?;
    let mut rng = StdRng::seed_from_u64(SETUP_SEED);

    let (pk, vk) = membership::setup(&mut rng).map_err(synthesis(Circuit::Membership))?;
    let membership_paths = Circuit::Membership.artifacts(dir);
    write_key(Circuit::Membership, &membership_paths.proving_key, &pk)?;
    write_key(Circuit::Membership, &membership_paths.verifying_key, &vk)?;

    let params = hush_hash::pedersen_params()?;
    let (pk, vk) = ownership::setup(params, &mut rng).map_err(synthesis(Circuit::VerifyOwner))?;
    let owner_paths = Circuit::VerifyOwner.artifacts(dir);
    write_key(Circuit::VerifyOwner, &owner_paths.proving_key, &pk)?;
    write_key(Circuit::VerifyOwner, &owner_paths.verifying_key, &vk)?;

    tracing::info!(dir = %dir.display(), "circuit artifacts written");
    Ok(vec![membership_paths, owner_paths])
}

/// Holds both proving keys; cheap to clone.
#[derive(Clone)]
pub struct Prover {
    membership: Arc<ProvingKey<Bls12_381>>,
    verify_owner: Arc<ProvingKey<Bls12_381>>,
}

impl Prover {
    pub fn new(membership: ProvingKey<Bls12_381>, verify_owner: ProvingKey<Bls12_381>) -> Self {
        Self {
            membership: Arc::new(membership),
            verify_owner: Arc::new(verify_owner),
        }
    }

    pub fn load(dir: &Path) -> Result<Self, ProofError> {
        Ok(Self::new(
            load_proving_key(dir, Circuit::Membership)?,
            load_proving_key(dir, Circuit::VerifyOwner)?,
        ))
    }

    /// Prove that `identity` is one of `members` and bind `signal` to
    /// `external_nullifier`.
    pub async fn prove_membership(
        &self,
        identity: Identity,
        members: &[Fr],
        external_nullifier: Fr,
        signal: &str,
    ) -> Result<FormattedProof, ProofError> {
        let commitment = hush_hash::identity_commitment(&identity);
        let tree = GroupTree::from_members(members);
        let path = tree
            .index_of(&commitment)
            .and_then(|i| tree.path(i))
            .ok_or(ProofError::NotAMember)?;
        let signal_hash = hush_hash::signal_hash(signal);
        let pk = Arc::clone(&self.membership);

        let started = Instant::now();
        let (proof, public) = tokio::task::spawn_blocking(move || {
            membership::prove(&pk, identity, path, external_nullifier, signal_hash, &mut OsRng)
        })
        .await
        .map_err(|e| ProofError::Join(e.to_string()))?
        .map_err(synthesis(Circuit::Membership))?;
        tracing::debug!(
            circuit = Circuit::Membership.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "proof generated"
        );

        format_for_solidity(Circuit::Membership, &proof, &public.to_vec())
    }

    /// Prove knowledge of the secrets behind `identity`'s Note.
    pub async fn prove_ownership(&self, identity: Identity) -> Result<FormattedProof, ProofError> {
        let params = hush_hash::pedersen_params()?;
        let pk = Arc::clone(&self.verify_owner);

        let started = Instant::now();
        let (proof, public) = tokio::task::spawn_blocking(move || {
            ownership::prove(&pk, params, identity, &mut OsRng)
        })
        .await
        .map_err(|e| ProofError::Join(e.to_string()))?
        .map_err(synthesis(Circuit::VerifyOwner))?;
        tracing::debug!(
            circuit = Circuit::VerifyOwner.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "proof generated"
        );

        format_for_solidity(Circuit::VerifyOwner, &proof, &public.to_vec())
    }
}
