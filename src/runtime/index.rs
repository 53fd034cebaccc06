//! Message and term lookup over one or more parsed resources.

use std::collections::HashMap;

use tracing::warn;

use crate::ast::{Entry, Message, Resource, Term};

/// Borrowing index of the messages and terms in a set of resources.
///
/// The first definition of an id wins; later duplicates are skipped with a
/// warning. Messages and terms live in separate namespaces, so `foo` and
/// `-foo` never collide.
#[derive(Debug, Default, Clone)]
pub struct EntryIndex<'r> {
    messages: HashMap<&'r str, &'r Message>,
    terms: HashMap<&'r str, &'r Term>,
}

impl<'r> EntryIndex<'r> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_resource(resource: &'r Resource) -> Self {
        let mut index = Self::new();
        index.add_resource(resource);
        index
    }

    /// Adds every message and term in `resource`. Returns the number of
    /// duplicate definitions that were skipped.
    pub fn add_resource(&mut self, resource: &'r Resource) -> usize {
        let mut skipped = 0;
        for entry in &resource.entries {
            let inserted = match entry {
                Entry::Message(message) => insert_first(&mut self.messages, message.id.as_str(), message),
                Entry::Term(term) => insert_first(&mut self.terms, term.id.as_str(), term),
                Entry::Comment(_) | Entry::Junk(_) => true,
            };
            if !inserted {
                skipped += 1;
                warn!(
                    id = entry_label(entry),
                    "duplicate FTL definition ignored; the first one wins"
                );
            }
        }
        skipped
    }

    pub fn message(&self, id: &str) -> Option<&'r Message> {
        self.messages.get(id).copied()
    }

    pub fn term(&self, id: &str) -> Option<&'r Term> {
        self.terms.get(id).copied()
    }

    pub fn has_message(&self, id: &str) -> bool {
        self.messages.contains_key(id)
    }

    /// Message ids, sorted.
    pub fn message_ids(&self) -> Vec<&'r str> {
        let mut ids: Vec<_> = self.messages.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.messages.len() + self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.terms.is_empty()
    }
}

fn insert_first<'r, T>(map: &mut HashMap<&'r str, &'r T>, id: &'r str, item: &'r T) -> bool {
    if map.contains_key(id) {
        return false;
    }
    map.insert(id, item);
    true
}

fn entry_label(entry: &Entry) -> String {
    match entry {
        Entry::Message(message) => message.id.name.clone(),
        Entry::Term(term) => format!("-{}", term.id.name),
        Entry::Comment(_) | Entry::Junk(_) => String::new(),
    }
}
