use ark_bls12_381::{Bls12_381, Fr};
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey};
use ark_r1cs_std::{alloc::AllocVar, boolean::Boolean, eq::EqGadget, fields::fp::FpVar};
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, ConstraintSystemRef, OptimizationGoal, SynthesisError,
    SynthesisMode,
};
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, RngCore};
use hush_types::{GroupPath, Identity, GROUP_DEPTH};

use crate::gadgets::{enforce_group_path, hash2_var};
use crate::tree::root_from_path;

/// Semaphore-style statement: "my identity commitment is a leaf of the
/// group tree with root `root`, and `nullifier_hash` is my nullifier for
/// `external_nullifier`". The signal hash is bound to the proof.
#[derive(Clone)]
pub struct MembershipCircuit {
    pub identity: Option<Identity>,
    pub path: Option<GroupPath>,
    pub external_nullifier: Option<Fr>,
    pub signal_hash: Option<Fr>,
}

impl MembershipCircuit {
    pub fn empty() -> Self {
        Self {
            identity: None,
            path: None,
            external_nullifier: None,
            signal_hash: None,
        }
    }

    fn public_inputs(&self) -> Result<PublicInputs, SynthesisError> {
        let id = self.identity.as_ref().ok_or(SynthesisError::AssignmentMissing)?;
        let path = self.path.as_ref().ok_or(SynthesisError::AssignmentMissing)?;
        let external_nullifier = self.external_nullifier.ok_or(SynthesisError::AssignmentMissing)?;
        let signal_hash = self.signal_hash.ok_or(SynthesisError::AssignmentMissing)?;
        Ok(PublicInputs {
            root: root_from_path(hush_hash::identity_commitment(id), path),
            nullifier_hash: hush_hash::nullifier_hash(external_nullifier, id),
            signal_hash,
            external_nullifier,
        })
    }
}

impl ConstraintSynthesizer<Fr> for MembershipCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let public = self.public_inputs();
        let public = public.as_ref();

        // Public inputs, in verifier order
        let root_pub = FpVar::new_input(cs.clone(), || {
            public.map(|p| p.root).map_err(|_| SynthesisError::AssignmentMissing)
        })?;
        let nullifier_hash_pub = FpVar::new_input(cs.clone(), || {
            public.map(|p| p.nullifier_hash).map_err(|_| SynthesisError::AssignmentMissing)
        })?;
        let signal_pub = FpVar::new_input(cs.clone(), || {
            self.signal_hash.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let ext_pub = FpVar::new_input(cs.clone(), || {
            self.external_nullifier.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // Witnesses
        let trapdoor = FpVar::new_witness(cs.clone(), || {
            self.identity
                .as_ref()
                .map(|id| id.trapdoor)
                .ok_or(SynthesisError::AssignmentMissing)
        })?;
        let nullifier = FpVar::new_witness(cs.clone(), || {
            self.identity
                .as_ref()
                .map(|id| id.nullifier)
                .ok_or(SynthesisError::AssignmentMissing)
        })?;

        let mut path_vars: Vec<(FpVar<Fr>, Boolean<Fr>)> = Vec::with_capacity(GROUP_DEPTH);
        for i in 0..GROUP_DEPTH {
            let sibling = FpVar::new_witness(cs.clone(), || {
                let path = self.path.as_ref().ok_or(SynthesisError::AssignmentMissing)?;
                path.siblings.get(i).copied().ok_or(SynthesisError::AssignmentMissing)
            })?;
            let is_right = Boolean::new_witness(cs.clone(), || {
                let path = self.path.as_ref().ok_or(SynthesisError::AssignmentMissing)?;
                path.indices.get(i).copied().ok_or(SynthesisError::AssignmentMissing)
            })?;
            path_vars.push((sibling, is_right));
        }

        // commitment = Poseidon(nullifier, trapdoor) sits under root
        let commitment = hash2_var(cs.clone(), &nullifier, &trapdoor)?;
        enforce_group_path(cs.clone(), &commitment, &path_vars, &root_pub)?;

        // nullifier_hash = Poseidon(external_nullifier, nullifier)
        let computed_nh = hash2_var(cs, &ext_pub, &nullifier)?;
        computed_nh.enforce_equal(&nullifier_hash_pub)?;

        // ties the signal to this proof
        let _signal_sq = &signal_pub * &signal_pub;

        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicInputs {
    pub root: Fr,
    pub nullifier_hash: Fr,
    pub signal_hash: Fr,
    pub external_nullifier: Fr,
}

impl PublicInputs {
    pub fn to_vec(&self) -> Vec<Fr> {
        vec![self.root, self.nullifier_hash, self.signal_hash, self.external_nullifier]
    }
}

pub fn setup<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<(ProvingKey<Bls12_381>, VerifyingKey<Bls12_381>), SynthesisError> {
    Groth16::<Bls12_381>::circuit_specific_setup(MembershipCircuit::empty(), rng)
}

pub fn prove<R: RngCore + CryptoRng>(
    pk: &ProvingKey<Bls12_381>,
    identity: Identity,
    path: GroupPath,
    external_nullifier: Fr,
    signal_hash: Fr,
    rng: &mut R,
) -> Result<(Proof<Bls12_381>, PublicInputs), SynthesisError> {
    if path.siblings.len() != GROUP_DEPTH || path.indices.len() != GROUP_DEPTH {
        return Err(SynthesisError::AssignmentMissing);
    }
    let circuit = MembershipCircuit {
        identity: Some(identity),
        path: Some(path),
        external_nullifier: Some(external_nullifier),
        signal_hash: Some(signal_hash),
    };
    let public = circuit.public_inputs()?;
    let proof = Groth16::<Bls12_381>::prove(pk, circuit, rng)?;
    Ok((proof, public))
}

pub fn verify_offchain(
    vk: &VerifyingKey<Bls12_381>,
    proof: &Proof<Bls12_381>,
    pi: &PublicInputs,
) -> bool {
    let pvk = PreparedVerifyingKey::from(vk.clone());
    Groth16::<Bls12_381>::verify_with_processed_vk(&pvk, &pi.to_vec(), proof).unwrap_or(false)
}

pub fn constraint_count() -> Result<usize, SynthesisError> {
    let cs = ConstraintSystem::<Fr>::new_ref();
    cs.set_optimization_goal(OptimizationGoal::Constraints);
    cs.set_mode(SynthesisMode::Setup);
    MembershipCircuit::empty().generate_constraints(cs.clone())?;
    Ok(cs.num_constraints())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::GroupTree;
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use hush_hash::{derive_identity, external_nullifier, identity_commitment, signal_hash};
    use hush_types::IdentitySeed;

    fn test_rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn group_with(members: &[Identity]) -> GroupTree {
        let mut tree = GroupTree::new();
        for m in members {
            tree.insert(identity_commitment(m));
        }
        tree
    }

    fn members() -> Vec<Identity> {
        ["0x01", "0x02", "0x03"]
            .iter()
            .map(|w| derive_identity(&IdentitySeed::new(w).in_group(1)))
            .collect()
    }

    #[test]
    fn test_valid_membership() {
        let mut rng = test_rng();
        let members = members();
        let tree = group_with(&members);
        let path = tree.path(1).unwrap();

        let (pk, vk) = setup(&mut rng).unwrap();
        let ext = external_nullifier("12", "vote");
        let (proof, pi) =
            prove(&pk, members[1].clone(), path, ext, signal_hash("up"), &mut rng).unwrap();
        assert_eq!(pi.root, tree.root().0);
        assert!(verify_offchain(&vk, &proof, &pi));
    }

    #[test]
    fn test_wrong_root() {
        let mut rng = test_rng();
        let members = members();
        let tree = group_with(&members);
        let path = tree.path(0).unwrap();

        let (pk, vk) = setup(&mut rng).unwrap();
        let ext = external_nullifier("12", "vote");
        let (proof, mut pi) =
            prove(&pk, members[0].clone(), path, ext, signal_hash("up"), &mut rng).unwrap();
        pi.root = Fr::from(12345u64);
        assert!(!verify_offchain(&vk, &proof, &pi), "should fail: wrong root");
    }

    #[test]
    fn test_outsider_unsatisfied() {
        let members = members();
        let tree = group_with(&members);
        let outsider = derive_identity(&IdentitySeed::new("0x99").in_group(1));

        // outsider borrows member 0's path; root must not match
        let circuit = MembershipCircuit {
            identity: Some(outsider),
            path: tree.path(0),
            external_nullifier: Some(external_nullifier("12", "vote")),
            signal_hash: Some(signal_hash("up")),
        };
        let pi = circuit.public_inputs().unwrap();
        assert_ne!(pi.root, tree.root().0);
    }

    #[test]
    fn test_short_path_rejected() {
        let mut rng = test_rng();
        let (pk, _) = setup(&mut rng).unwrap();
        let path = GroupPath {
            siblings: vec![Fr::from(0u64); 3],
            indices: vec![false; 3],
        };
        let result = prove(
            &pk,
            members()[0].clone(),
            path,
            Fr::from(1u64),
            Fr::from(2u64),
            &mut rng,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_membership_constraint_count() {
        let count = constraint_count().unwrap();
        println!("Membership circuit constraints: {count}");
        assert!(count > 2000, "too few: {count}");
        assert!(count < 15_000, "too many: {count}");
    }
}
