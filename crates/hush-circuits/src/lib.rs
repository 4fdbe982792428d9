//! Groth16 (BLS12-381) circuits used by the forum.
//!
//! | Module | Statement |
//! |---|---|
//! | [`ownership`] | "I know the trapdoor/nullifier behind this public Note" |
//! | [`membership`] | "I am one of the members of the group with this root" |
//!
//! [`tree`] builds the off-circuit membership tree the `membership`
//! witness is taken from.

pub mod gadgets;
pub mod membership;
pub mod ownership;
pub mod tree;

pub use membership::MembershipCircuit;
pub use ownership::VerifyOwnerCircuit;
pub use tree::GroupTree;

pub use ark_relations::r1cs::SynthesisError;
