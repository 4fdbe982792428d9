//! Pedersen note commitment over Jubjub (`ark-ed-on-bls12-381`).
//!
//! The curve's base field is the BLS12-381 scalar field, so the
//! x-coordinate of the hash point is directly a circuit-native `Fr`.

use std::sync::OnceLock;

use ark_bls12_381::Fr;
use ark_crypto_primitives::crh::{pedersen, CRHScheme};
use ark_ed_on_bls12_381::EdwardsProjective as JubJub;
use ark_ff::{BigInteger, PrimeField};
use ark_std::rand::{rngs::StdRng, SeedableRng};
use hush_types::{Identity, Note};

/// Fixed seed for the generator set. Changing it changes every Note.
const PARAMS_SEED: u64 = 0x6875_7368;

/// Two 32-byte little-endian scalars, 4 bits per window.
#[derive(Clone)]
pub struct NoteWindow;

impl pedersen::Window for NoteWindow {
    const WINDOW_SIZE: usize = 4;
    const NUM_WINDOWS: usize = 128;
}

pub type NoteCrh = pedersen::CRH<JubJub, NoteWindow>;
pub type PedersenParams = pedersen::Parameters<JubJub>;

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("pedersen parameter setup failed: {0}")]
    Setup(String),

    #[error("pedersen evaluation failed: {0}")]
    Evaluate(String),
}

/// Generator set shared by the native hash and the `VerifyOwner` circuit.
pub fn pedersen_params() -> Result<&'static PedersenParams, HashError> {
    static PARAMS: OnceLock<PedersenParams> = OnceLock::new();
    if let Some(params) = PARAMS.get() {
        return Ok(params);
    }
    let mut rng = StdRng::seed_from_u64(PARAMS_SEED);
    let params = NoteCrh::setup(&mut rng).map_err(|e| HashError::Setup(e.to_string()))?;
    Ok(PARAMS.get_or_init(|| params))
}

/// `le32(trapdoor) || le32(nullifier)`
pub fn note_preimage(identity: &Identity) -> [u8; 64] {
    let mut out = [0u8; 64];
    out[..32].copy_from_slice(&identity.trapdoor.into_bigint().to_bytes_le());
    out[32..].copy_from_slice(&identity.nullifier.into_bigint().to_bytes_le());
    out
}

pub fn derive_note(identity: &Identity) -> Result<Note, HashError> {
    let params = pedersen_params()?;
    let point = NoteCrh::evaluate(params, &note_preimage(identity)[..])
        .map_err(|e| HashError::Evaluate(e.to_string()))?;
    let x: Fr = point.x;
    Ok(Note(x))
}
