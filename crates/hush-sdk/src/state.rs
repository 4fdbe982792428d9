// Copyright 2026 abhirupbanerjee
// Licensed under the Apache License, Version 2.0

//! Client-side community state. [`reduce`] is the only way to change it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::Group;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub group_id: u64,
    /// Decimal identity commitment.
    pub identity_commitment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommunityState {
    pub communities: Vec<Group>,
    pub users: Vec<User>,
    pub users_grouped: BTreeMap<u64, Vec<User>>,
    pub active_community: Option<u64>,
    pub active_post: Option<u64>,
    pub is_admin: bool,
    pub is_moderator: bool,
    pub communities_joined: BTreeMap<u64, bool>,
}

impl CommunityState {
    pub fn community(&self, id: u64) -> Option<&Group> {
        self.communities.iter().find(|g| g.id == id)
    }

    pub fn has_joined(&self, id: u64) -> bool {
        self.communities_joined.get(&id).copied().unwrap_or(false)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    SetCommunities(Vec<Group>),
    AddCommunity(Group),
    UpdateCommunity(Group),
    RemoveCommunity(u64),
    SetUsers(Vec<User>),
    AddUser(User),
    SetActiveCommunity(Option<u64>),
    SetActivePost(Option<u64>),
    SetAdmin(bool),
    SetModerator(bool),
    SetJoined { group_id: u64, joined: bool },
}

fn group_users(users: &[User]) -> BTreeMap<u64, Vec<User>> {
    let mut grouped: BTreeMap<u64, Vec<User>> = BTreeMap::new();
    for user in users {
        grouped.entry(user.group_id).or_default().push(user.clone());
    }
    grouped
}

pub fn reduce(mut state: CommunityState, action: Action) -> CommunityState {
    match action {
        Action::SetCommunities(groups) => state.communities = groups,
        Action::AddCommunity(group) => {
            if state.community(group.id).is_none() {
                state.communities.push(group);
            }
        }
        Action::UpdateCommunity(group) => {
            if let Some(existing) = state.communities.iter_mut().find(|g| g.id == group.id) {
                *existing = group;
            }
        }
        Action::RemoveCommunity(id) => {
            state.communities.retain(|g| g.id != id);
            state.users_grouped.remove(&id);
            state.communities_joined.remove(&id);
            if state.active_community == Some(id) {
                state.active_community = None;
                state.active_post = None;
            }
        }
        Action::SetUsers(users) => {
            state.users_grouped = group_users(&users);
            state.users = users;
        }
        Action::AddUser(user) => {
            let known = state.users.iter().any(|u| {
                u.group_id == user.group_id && u.identity_commitment == user.identity_commitment
            });
            if !known {
                state
                    .users_grouped
                    .entry(user.group_id)
                    .or_default()
                    .push(user.clone());
                if let Some(group) = state.communities.iter_mut().find(|g| g.id == user.group_id) {
                    group.user_count += 1;
                }
                state.users.push(user);
            }
        }
        Action::SetActiveCommunity(id) => {
            if state.active_community != id {
                state.active_post = None;
            }
            state.active_community = id;
        }
        Action::SetActivePost(id) => state.active_post = id,
        Action::SetAdmin(v) => state.is_admin = v,
        Action::SetModerator(v) => state.is_moderator = v,
        Action::SetJoined { group_id, joined } => {
            state.communities_joined.insert(group_id, joined);
        }
    }
    state
}
