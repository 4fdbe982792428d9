// Copyright 2026 abhirupbanerjee
// Licensed under the Apache License, Version 2.0

//! Forum records as they appear in the cache and on the relayer wire.

use ark_bls12_381::Fr;
use ark_ff::PrimeField;
use hush_types::Note;
use serde::{Deserialize, Serialize};

/// Field elements travel as decimal strings on every wire this crate speaks.
pub fn fr_to_decimal(f: &Fr) -> String {
    f.into_bigint().to_string()
}

/// Canonical decimal only; `None` for hex, signs, or values past the modulus.
pub fn fr_from_decimal(s: &str) -> Option<Fr> {
    Note::from_decimal(s).map(|n| n.0)
}

/// On-chain item kind. Discriminants match the contract's enum.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Post,
    Comment,
    Poll,
}

impl Kind {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Kind::Post),
            1 => Some(Kind::Comment),
            2 => Some(Kind::Poll),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Kind::Post => 0,
            Kind::Comment => 1,
            Kind::Poll => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Post => "post",
            Kind::Comment => "comment",
            Kind::Poll => "poll",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteType {
    Upvote,
    Downvote,
}

impl VoteType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(VoteType::Upvote),
            1 => Some(VoteType::Downvote),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            VoteType::Upvote => 0,
            VoteType::Downvote => 1,
        }
    }
}

/// What the caller may do without an ownership proof.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Member,
    Moderator,
    Admin,
}

impl Role {
    pub fn bypasses_ownership(self) -> bool {
        matches!(self, Role::Moderator | Role::Admin)
    }
}

/// Off-chain body pinned to IPFS.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ItemContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Editor document (block list) or plain text.
    #[serde(default)]
    pub description: serde_json::Value,
    /// Poll options, only for `Kind::Poll`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl ItemContent {
    pub fn text(title: Option<&str>, body: &str) -> Self {
        Self {
            title: title.map(str::to_string),
            description: serde_json::json!({
                "blocks": [{ "type": "paragraph", "data": { "text": body } }]
            }),
            options: Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub kind: Kind,
    pub id: u64,
    pub parent_id: u64,
    pub group_id: u64,
    #[serde(default)]
    pub created_at_block: u64,
    #[serde(default)]
    pub child_ids: Vec<u64>,
    #[serde(default)]
    pub upvote: u64,
    #[serde(default)]
    pub downvote: u64,
    /// Decimal Note of the author.
    pub note: String,
    /// `0x`-prefixed bytes32; zero means no content.
    #[serde(rename = "contentCID")]
    pub content_cid: String,
    #[serde(default)]
    pub removed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetails {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "bannerCID", default)]
    pub banner_cid: String,
    #[serde(rename = "logoCID", default)]
    pub logo_cid: String,
}

/// ERC-20 gate: hold at least `min_amount` of `token_address`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    pub token_address: String,
    pub min_amount: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub group_details: GroupDetails,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub user_count: u64,
    #[serde(default)]
    pub chain_id: u64,
    #[serde(default)]
    pub posts: Vec<u64>,
    #[serde(default)]
    pub removed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_field_roundtrip() {
        let f = Fr::from(123_456_789u64);
        assert_eq!(fr_to_decimal(&f), "123456789");
        assert_eq!(fr_from_decimal("123456789"), Some(f));
        assert_eq!(fr_from_decimal("-1"), None);
    }

    #[test]
    fn kind_discriminants() {
        for kind in [Kind::Post, Kind::Comment, Kind::Poll] {
            assert_eq!(Kind::from_u8(kind.as_u8()), Some(kind));
        }
        assert_eq!(Kind::from_u8(9), None);
    }

    #[test]
    fn item_wire_names() {
        let item = Item {
            kind: Kind::Comment,
            id: 5,
            parent_id: 2,
            group_id: 1,
            created_at_block: 0,
            child_ids: vec![],
            upvote: 0,
            downvote: 0,
            note: "1".into(),
            content_cid: "0x00".into(),
            removed: false,
            title: None,
            description: None,
            created_at: None,
        };
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v["kind"], "comment");
        assert_eq!(v["parentId"], 2);
        assert_eq!(v["contentCID"], "0x00");
        assert!(v.get("title").is_none());
    }

    #[test]
    fn only_privileged_roles_bypass() {
        assert!(!Role::Member.bypasses_ownership());
        assert!(Role::Moderator.bypasses_ownership());
        assert!(Role::Admin.bypasses_ownership());
    }
}
