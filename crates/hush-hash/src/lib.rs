//! Hashing for the hush forum.
//!
//! - [`derive_identity`] turns a wallet-bound [`IdentitySeed`] into trapdoor
//!   and nullifier scalars.
//! - [`derive_note`] commits to an identity with a Pedersen hash over the
//!   Jubjub curve; the x-coordinate is the public ownership [`Note`].
//! - Poseidon ([`poseidon_hash`], [`hash2`]) builds identity commitments,
//!   membership trees and nullifier hashes.
//! - [`hash_to_field`] maps arbitrary bytes into the scalar field the way
//!   Semaphore does (Keccak-256, shifted right by 8 bits).

pub mod pedersen;

use std::sync::OnceLock;

use ark_bls12_381::Fr;
use ark_crypto_primitives::sponge::{
    poseidon::{PoseidonConfig, PoseidonSponge},
    CryptographicSponge, FieldBasedCryptographicSponge,
};
use ark_ff::PrimeField;
use hush_types::{Identity, IdentitySeed};
use sha2::{Digest, Sha256};
use sha3::Keccak256;

pub use hush_types::Note;
pub use pedersen::{
    derive_note, note_preimage, pedersen_params, HashError, NoteCrh, NoteWindow, PedersenParams,
};

const RATE: usize = 2;
const FULL_ROUNDS: usize = 8;
const PARTIAL_ROUNDS: usize = 31;
const ALPHA: u64 = 17;

const TRAPDOOR_TAG: &str = "identity_trapdoor";
const NULLIFIER_TAG: &str = "identity_nullifier";

pub fn poseidon_config() -> &'static PoseidonConfig<Fr> {
    static CONFIG: OnceLock<PoseidonConfig<Fr>> = OnceLock::new();
    CONFIG.get_or_init(|| {
        let (ark, mds) = ark_crypto_primitives::sponge::poseidon::find_poseidon_ark_and_mds::<Fr>(
            Fr::MODULUS_BIT_SIZE as u64,
            RATE,
            FULL_ROUNDS as u64,
            PARTIAL_ROUNDS as u64,
            0,
        );
        PoseidonConfig::new(FULL_ROUNDS, PARTIAL_ROUNDS, ALPHA, mds, ark, RATE, 1)
    })
}

pub fn poseidon_hash(inputs: &[Fr]) -> Fr {
    let mut sponge = PoseidonSponge::new(poseidon_config());
    sponge.absorb(&inputs);
    sponge.squeeze_native_field_elements(1)[0]
}

pub fn hash2(a: Fr, b: Fr) -> Fr {
    poseidon_hash(&[a, b])
}

fn sha256_to_field(message: &str, tag: &str) -> Fr {
    let mut hasher = Sha256::new();
    hasher.update(message.as_bytes());
    hasher.update(tag.as_bytes());
    Fr::from_be_bytes_mod_order(&hasher.finalize())
}

/// Deterministic identity for a wallet (and optional group/username context).
pub fn derive_identity(seed: &IdentitySeed) -> Identity {
    let message = seed.message();
    Identity {
        trapdoor: sha256_to_field(&message, TRAPDOOR_TAG),
        nullifier: sha256_to_field(&message, NULLIFIER_TAG),
    }
}

/// Leaf of the group membership tree.
pub fn identity_commitment(identity: &Identity) -> Fr {
    hash2(identity.nullifier, identity.trapdoor)
}

/// Keccak-256 of `bytes` shifted right by 8 bits, so it always fits the field.
pub fn hash_to_field(bytes: &[u8]) -> Fr {
    let digest = Keccak256::digest(bytes);
    Fr::from_be_bytes_mod_order(&digest[..31])
}

/// Scope of a membership proof, e.g. `external_nullifier("12", "vote")`.
/// One identity yields one nullifier hash per scope.
pub fn external_nullifier(scope: &str, topic: &str) -> Fr {
    hash_to_field(format!("{scope}_{topic}").as_bytes())
}

pub fn nullifier_hash(external_nullifier: Fr, identity: &Identity) -> Fr {
    hash2(external_nullifier, identity.nullifier)
}

pub fn signal_hash(signal: &str) -> Fr {
    hash_to_field(signal.as_bytes())
}
