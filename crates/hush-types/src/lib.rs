#![cfg_attr(not(feature = "std"), no_std)]

pub mod group;
pub mod identity;
pub mod note;

pub use group::{GroupPath, GroupRoot, GROUP_DEPTH};
pub use identity::{Identity, IdentitySeed};
pub use note::Note;
