// Copyright 2026 abhirupbanerjee
// Licensed under the Apache License, Version 2.0

//! Optimistic UI state and its reconciliation against relayer outcomes.
//!
//! An action inserts a placeholder keyed by its content id before the
//! relayer answers. [`OptimisticList::reconcile`] is the single place that
//! turns the placeholder into a confirmed entry or removes it.

use crate::models::VoteType;

/// Lifecycle of one optimistic write. Only `Pending` may transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingState {
    Pending,
    Confirmed(u64),
    RolledBack,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Confirmed(u64),
    Failed,
}

impl PendingState {
    /// Apply a relayer outcome. Returns `None` if already resolved.
    pub fn resolve(self, outcome: Outcome) -> Option<PendingState> {
        match (self, outcome) {
            (PendingState::Pending, Outcome::Confirmed(id)) => Some(PendingState::Confirmed(id)),
            (PendingState::Pending, Outcome::Failed) => Some(PendingState::RolledBack),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntryId {
    /// Placeholder keyed by the IPFS hash of the new content.
    Pending(String),
    Confirmed(u64),
}

#[derive(Clone, Debug, PartialEq)]
pub struct OptimisticEntry<T> {
    pub id: EntryId,
    pub state: PendingState,
    pub value: T,
}

/// Ordered list of items as shown to the user, including placeholders.
#[derive(Clone, Debug, PartialEq)]
pub struct OptimisticList<T> {
    entries: Vec<OptimisticEntry<T>>,
}

impl<T> Default for OptimisticList<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> OptimisticList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_confirmed(items: impl IntoIterator<Item = (u64, T)>) -> Self {
        Self {
            entries: items
                .into_iter()
                .map(|(id, value)| OptimisticEntry {
                    id: EntryId::Confirmed(id),
                    state: PendingState::Confirmed(id),
                    value,
                })
                .collect(),
        }
    }

    pub fn push_pending(&mut self, cid: &str, value: T) {
        self.entries.push(OptimisticEntry {
            id: EntryId::Pending(cid.to_string()),
            state: PendingState::Pending,
            value,
        });
    }

    /// Resolve the placeholder for `cid`. Returns the new state, or `None`
    /// when no pending entry carries that cid.
    pub fn reconcile(&mut self, cid: &str, outcome: Outcome) -> Option<PendingState> {
        let pos = self.entries.iter().position(|e| {
            e.state == PendingState::Pending && e.id == EntryId::Pending(cid.to_string())
        })?;
        let next = self.entries[pos].state.resolve(outcome)?;
        match next {
            PendingState::Confirmed(id) => {
                let entry = &mut self.entries[pos];
                entry.id = EntryId::Confirmed(id);
                entry.state = next;
            }
            _ => {
                self.entries.remove(pos);
            }
        }
        Some(next)
    }

    pub fn get(&self, id: &EntryId) -> Option<&OptimisticEntry<T>> {
        self.entries.iter().find(|e| &e.id == id)
    }

    pub fn ids(&self) -> Vec<EntryId> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.state == PendingState::Pending)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OptimisticEntry<T>> {
        self.entries.iter()
    }
}

/// Vote counters with at most one unconfirmed optimistic delta.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub upvote: u64,
    pub downvote: u64,
    pub unconfirmed: Option<VoteType>,
}

impl VoteTally {
    pub fn new(upvote: u64, downvote: u64) -> Self {
        Self {
            upvote,
            downvote,
            unconfirmed: None,
        }
    }

    fn counter(&mut self, vote: VoteType) -> &mut u64 {
        match vote {
            VoteType::Upvote => &mut self.upvote,
            VoteType::Downvote => &mut self.downvote,
        }
    }

    pub fn apply_optimistic(&mut self, vote: VoteType) {
        *self.counter(vote) += 1;
        self.unconfirmed = Some(vote);
    }

    /// Clear the tag; the delta already applied stands.
    pub fn confirm(&mut self) {
        self.unconfirmed = None;
    }

    /// Undo the unconfirmed delta, if any.
    pub fn revert(&mut self) {
        if let Some(vote) = self.unconfirmed.take() {
            let c = self.counter(vote);
            *c = c.saturating_sub(1);
        }
    }
}
