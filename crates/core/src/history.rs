//! Bounded message history: the short-term memory of one loop run.
//!
//! A [`History`] is created fresh for every run and never persisted. Bounded
//! variants evict FIFO before inserting once they reach capacity, either from
//! the front or from index 1 so that a pinned first entry (usually the
//! system persona) survives every append.

use std::collections::VecDeque;

use crate::message::{Message, Role};

/// Where a full history evicts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eviction {
    /// Unbounded; never evicts.
    Never,
    /// Evict the oldest entry.
    EvictFront,
    /// Evict the oldest entry after the first, which stays pinned.
    EvictSecond,
}

/// An ordered message log with a capacity and an eviction policy.
#[derive(Debug, Clone)]
pub struct History {
    messages: VecDeque<Message>,
    capacity: usize,
    eviction: Eviction,
}

impl History {
    /// A history that grows without bound.
    pub fn unbounded() -> Self {
        Self::with_policy(usize::MAX, Eviction::Never)
    }

    /// A history holding at most `capacity` messages, evicting the oldest.
    pub fn bounded(capacity: usize) -> Self {
        Self::with_policy(capacity, Eviction::EvictFront)
    }

    /// A history holding at most `capacity` messages whose first entry is
    /// never evicted.
    pub fn pinned(capacity: usize) -> Self {
        Self::with_policy(capacity, Eviction::EvictSecond)
    }

    pub fn with_policy(capacity: usize, eviction: Eviction) -> Self {
        let capacity = if eviction == Eviction::Never { usize::MAX } else { capacity };
        Self {
            messages: VecDeque::new(),
            capacity,
            eviction,
        }
    }

    /// Seed a history with messages, applying the eviction policy to each.
    pub fn from_messages(
        messages: impl IntoIterator<Item = Message>,
        capacity: usize,
        eviction: Eviction,
    ) -> Self {
        let mut history = Self::with_policy(capacity, eviction);
        for message in messages {
            history.append(message);
        }
        history
    }

    /// Append at the tail, evicting first when the history is full.
    ///
    /// When nothing can be evicted (capacity 0, or a pinned history whose only
    /// slot holds the pinned entry) the incoming message is dropped.
    pub fn append(&mut self, message: Message) {
        while self.messages.len() >= self.capacity {
            let evicted = match self.eviction {
                Eviction::Never => None,
                Eviction::EvictFront => self.messages.pop_front(),
                Eviction::EvictSecond => self.messages.remove(1),
            };
            if evicted.is_none() {
                return;
            }
        }
        self.messages.push_back(message);
    }

    /// Append a message with the given role.
    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.append(Message::new(role, content));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// `None` for unbounded histories.
    pub fn capacity(&self) -> Option<usize> {
        (self.eviction != Eviction::Never).then_some(self.capacity)
    }

    pub fn eviction(&self) -> Eviction {
        self.eviction
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.back()
    }

    /// Snapshot of the messages, for building a provider request.
    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::unbounded()
    }
}
