use ark_bls12_381::{Bls12_381, Fr};
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey};
use ark_r1cs_std::{alloc::AllocVar, eq::EqGadget, fields::fp::FpVar};
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, ConstraintSystemRef, OptimizationGoal, SynthesisError,
    SynthesisMode,
};
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, RngCore};
use hush_hash::PedersenParams;
use hush_types::{Identity, Note};

use crate::gadgets::note_var;

/// "I know the trapdoor and nullifier whose Pedersen hash is `note`"
///
/// Authorizes edits and deletions by the original author.
#[derive(Clone)]
pub struct VerifyOwnerCircuit {
    pub params: PedersenParams,
    pub identity: Option<Identity>,
}

impl VerifyOwnerCircuit {
    pub fn empty(params: PedersenParams) -> Self {
        Self { params, identity: None }
    }
}

impl ConstraintSynthesizer<Fr> for VerifyOwnerCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let note_pub = FpVar::new_input(cs.clone(), || {
            let id = self.identity.as_ref().ok_or(SynthesisError::AssignmentMissing)?;
            hush_hash::derive_note(id)
                .map(|n| n.0)
                .map_err(|_| SynthesisError::AssignmentMissing)
        })?;

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

        let computed = note_var(cs, &self.params, &trapdoor, &nullifier)?;
        computed.enforce_equal(&note_pub)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicInputs {
    pub note: Note,
}

impl PublicInputs {
    pub fn to_vec(&self) -> Vec<Fr> {
        vec![self.note.0]
    }
}

pub fn setup<R: RngCore + CryptoRng>(
    params: &PedersenParams,
    rng: &mut R,
) -> Result<(ProvingKey<Bls12_381>, VerifyingKey<Bls12_381>), SynthesisError> {
    let circuit = VerifyOwnerCircuit::empty(params.clone());
    Groth16::<Bls12_381>::circuit_specific_setup(circuit, rng)
}

pub fn prove<R: RngCore + CryptoRng>(
    pk: &ProvingKey<Bls12_381>,
    params: &PedersenParams,
    identity: Identity,
    rng: &mut R,
) -> Result<(Proof<Bls12_381>, PublicInputs), SynthesisError> {
    let note = hush_hash::derive_note(&identity).map_err(|_| SynthesisError::AssignmentMissing)?;
    let circuit = VerifyOwnerCircuit {
        params: params.clone(),
        identity: Some(identity),
    };
    let proof = Groth16::<Bls12_381>::prove(pk, circuit, rng)?;
    Ok((proof, PublicInputs { note }))
}

pub fn verify_offchain(
    vk: &VerifyingKey<Bls12_381>,
    proof: &Proof<Bls12_381>,
    pi: &PublicInputs,
) -> bool {
    let pvk = PreparedVerifyingKey::from(vk.clone());
    Groth16::<Bls12_381>::verify_with_processed_vk(&pvk, &pi.to_vec(), proof).unwrap_or(false)
}

pub fn constraint_count(params: &PedersenParams) -> Result<usize, SynthesisError> {
    let cs = ConstraintSystem::<Fr>::new_ref();
    cs.set_optimization_goal(OptimizationGoal::Constraints);
    cs.set_mode(SynthesisMode::Setup);
    VerifyOwnerCircuit::empty(params.clone()).generate_constraints(cs.clone())?;
    Ok(cs.num_constraints())
}
