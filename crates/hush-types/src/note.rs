extern crate alloc;

use alloc::string::{String, ToString};
use ark_bls12_381::Fr;
use ark_ff::PrimeField;

/// Public ownership tag attached to on-chain items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Note(pub Fr);

impl Note {
    /// Decimal rendering used by the contract ABI and the relayer.
    pub fn to_decimal(&self) -> String {
        self.0.into_bigint().to_string()
    }

    /// Parse a decimal string; `None` if it is not a canonical field element.
    pub fn from_decimal(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let fr: Fr = s.parse().ok()?;
        // the parser reduces mod r; only canonical encodings are accepted
        let trimmed = match s.trim_start_matches('0') {
            "" => "0",
            t => t,
        };
        if fr.into_bigint().to_string() != trimmed {
            return None;
        }
        Some(Self(fr))
    }
}
