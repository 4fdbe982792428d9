extern crate alloc;

use alloc::format;
use alloc::string::String;
use ark_bls12_381::Fr;

/// Wallet-bound input from which an [`Identity`] is re-derived on demand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentitySeed {
    pub wallet: String,
    pub group_id: Option<u64>,
    pub username: Option<String>,
}

impl IdentitySeed {
    pub fn new(wallet: &str) -> Self {
        Self {
            wallet: wallet.into(),
            group_id: None,
            username: None,
        }
    }

    pub fn in_group(mut self, group_id: u64) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn as_user(mut self, username: &str) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Message the identity secrets are hashed from.
    ///
    /// Wallet addresses are case-insensitive, so the address is lower-cased
    /// before the optional `_{group}` and `_{username}` suffixes.
    pub fn message(&self) -> String {
        let mut msg = self.wallet.to_lowercase();
        if let Some(group) = self.group_id {
            msg.push_str(&format!("_{group}"));
        }
        if let Some(user) = &self.username {
            msg.push('_');
            msg.push_str(user);
        }
        msg
    }
}

/// The two secret scalars behind a Note and a group membership.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub trapdoor: Fr,
    pub nullifier: Fr,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_without_context() {
        assert_eq!(IdentitySeed::new("0xABC").message(), "0xabc");
    }

    #[test]
    fn message_with_group_and_user() {
        let seed = IdentitySeed::new("0xABC").in_group(7).as_user("alice");
        assert_eq!(seed.message(), "0xabc_7_alice");
    }

    #[test]
    fn wallet_case_does_not_matter() {
        let a = IdentitySeed::new("0xAbC").in_group(1);
        let b = IdentitySeed::new("0xabc").in_group(1);
        assert_eq!(a.message(), b.message());
    }
}
