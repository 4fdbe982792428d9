// Copyright 2026 abhirupbanerjee
// Licensed under the Apache License, Version 2.0

//! Cache key scheme.

use crate::models::Kind;

pub fn group(group_id: u64) -> String {
    format!("group_{group_id}")
}

pub fn groups() -> String {
    "groups".to_string()
}

pub fn posts(group_id: u64) -> String {
    format!("{group_id}_posts")
}

pub fn post(group_id: u64, post_id: u64) -> String {
    format!("{group_id}_post_{post_id}")
}

pub fn comments(post_id: u64) -> String {
    format!("{post_id}_comments")
}

pub fn comment(post_id: u64, comment_id: u64) -> String {
    format!("{post_id}_comment_{comment_id}")
}

pub fn members(group_id: u64) -> String {
    format!("{group_id}_members")
}

/// Document key for an item. Comments live under their parent post.
pub fn item(kind: Kind, group_id: u64, parent_id: u64, id: u64) -> String {
    match kind {
        Kind::Post | Kind::Poll => post(group_id, id),
        Kind::Comment => comment(parent_id, id),
    }
}

/// The id list an item is appended to.
pub fn parent_list(kind: Kind, group_id: u64, parent_id: u64) -> String {
    match kind {
        Kind::Post | Kind::Poll => posts(group_id),
        Kind::Comment => comments(parent_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme() {
        assert_eq!(group(3), "group_3");
        assert_eq!(posts(3), "3_posts");
        assert_eq!(post(3, 9), "3_post_9");
        assert_eq!(comments(9), "9_comments");
        assert_eq!(comment(9, 12), "9_comment_12");
        assert_eq!(members(3), "3_members");
    }

    #[test]
    fn comments_key_by_parent() {
        assert_eq!(item(Kind::Comment, 3, 9, 12), "9_comment_12");
        assert_eq!(item(Kind::Poll, 3, 0, 4), "3_post_4");
        assert_eq!(parent_list(Kind::Comment, 3, 9), "9_comments");
        assert_eq!(parent_list(Kind::Post, 3, 0), "3_posts");
    }
}
