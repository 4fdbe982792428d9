use ark_bls12_381::Fr;
use ark_crypto_primitives::crh::{
    pedersen::constraints::{CRHGadget, CRHParametersVar},
    CRHSchemeGadget,
};
use ark_crypto_primitives::sponge::{
    constraints::CryptographicSpongeVar, poseidon::constraints::PoseidonSpongeVar,
};
use ark_ed_on_bls12_381::{constraints::EdwardsVar, EdwardsProjective as JubJub};
use ark_r1cs_std::{
    boolean::Boolean,
    fields::fp::FpVar,
    prelude::{AllocVar, EqGadget, ToBytesGadget},
};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use hush_hash::{NoteWindow, PedersenParams};

pub type NoteCrhGadget = CRHGadget<JubJub, EdwardsVar, NoteWindow>;

pub fn poseidon_hash_var(
    cs: ConstraintSystemRef<Fr>,
    inputs: &[FpVar<Fr>],
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut sponge = PoseidonSpongeVar::new(cs, hush_hash::poseidon_config());
    sponge.absorb(&inputs)?;
    let out = sponge.squeeze_field_elements(1)?;
    out.into_iter().next().ok_or(SynthesisError::Unsatisfiable)
}

pub fn hash2_var(
    cs: ConstraintSystemRef<Fr>,
    a: &FpVar<Fr>,
    b: &FpVar<Fr>,
) -> Result<FpVar<Fr>, SynthesisError> {
    poseidon_hash_var(cs, &[a.clone(), b.clone()])
}

/// Walk `path` from `leaf` and constrain the result to `root`.
/// Each step is (sibling, is_right), `is_right` meaning the current node is the right child.
pub fn enforce_group_path(
    cs: ConstraintSystemRef<Fr>,
    leaf: &FpVar<Fr>,
    path: &[(FpVar<Fr>, Boolean<Fr>)],
    root: &FpVar<Fr>,
) -> Result<(), SynthesisError> {
    let mut current = leaf.clone();
    for (sibling, is_right) in path {
        let left = is_right.select(sibling, &current)?;
        let right = is_right.select(&current, sibling)?;
        current = hash2_var(cs.clone(), &left, &right)?;
    }
    current.enforce_equal(root)
}

/// In-circuit counterpart of [`hush_hash::derive_note`].
pub fn note_var(
    cs: ConstraintSystemRef<Fr>,
    params: &PedersenParams,
    trapdoor: &FpVar<Fr>,
    nullifier: &FpVar<Fr>,
) -> Result<FpVar<Fr>, SynthesisError> {
    let params_var = CRHParametersVar::<JubJub, EdwardsVar>::new_constant(cs, params)?;
    let mut bytes = trapdoor.to_bytes_le()?;
    bytes.extend(nullifier.to_bytes_le()?);
    let point = NoteCrhGadget::evaluate(&params_var, bytes.as_slice())?;
    Ok(point.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_r1cs_std::R1CSVar;
    use ark_relations::r1cs::ConstraintSystem;
    use hush_hash::{derive_identity, derive_note, pedersen_params};
    use hush_types::IdentitySeed;

    #[test]
    fn note_gadget_matches_native() {
        let id = derive_identity(&IdentitySeed::new("0xabc").in_group(3));
        let native = derive_note(&id).unwrap();

        let cs = ConstraintSystem::<Fr>::new_ref();
        let t = FpVar::new_witness(cs.clone(), || Ok(id.trapdoor)).unwrap();
        let n = FpVar::new_witness(cs.clone(), || Ok(id.nullifier)).unwrap();
        let out = note_var(cs.clone(), pedersen_params().unwrap(), &t, &n).unwrap();

        assert_eq!(out.value().unwrap(), native.0);
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn poseidon_gadget_matches_native() {
        let a = Fr::from(11u64);
        let b = Fr::from(22u64);
        let cs = ConstraintSystem::<Fr>::new_ref();
        let av = FpVar::new_witness(cs.clone(), || Ok(a)).unwrap();
        let bv = FpVar::new_witness(cs.clone(), || Ok(b)).unwrap();
        let out = hash2_var(cs, &av, &bv).unwrap();
        assert_eq!(out.value().unwrap(), hush_hash::hash2(a, b));
    }
}
