use std::collections::HashMap;

use super::PsoError;

/// What [`StateRegistry::insert`] does when the name is taken.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum DuplicatePolicy {
    /// The new entry replaces the old one.
    #[default]
    Replace,
    /// The insert fails and the old entry stays.
    Reject,
}

/// Name-keyed store with an explicit duplicate policy.
#[derive(Debug)]
pub struct StateRegistry<T> {
    entries: HashMap<String, T>,
    policy: DuplicatePolicy,
}

impl<T> Default for StateRegistry<T> {
    fn default() -> Self {
        Self::new(DuplicatePolicy::default())
    }
}

impl<T> StateRegistry<T> {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            entries: HashMap::new(),
            policy,
        }
    }

    /// Stores `value` under `name`, returning the replaced entry if any.
    pub fn insert(&mut self, name: impl Into<String>, value: T) -> Result<Option<T>, PsoError> {
        let name = name.into();
        if self.policy == DuplicatePolicy::Reject && self.entries.contains_key(&name) {
            return Err(PsoError::Duplicate(name));
        }
        Ok(self.entries.insert(name, value))
    }

    /// Checks `name` is free (or may be replaced) without inserting.
    pub fn check_insert(&self, name: &str) -> Result<(), PsoError> {
        match self.policy {
            DuplicatePolicy::Reject if self.entries.contains_key(name) => {
                Err(PsoError::Duplicate(name.to_owned()))
            }
            _ => Ok(()),
        }
    }

    pub fn get(&self, name: &str) -> Result<&T, PsoError> {
        self.entries
            .get(name)
            .ok_or_else(|| PsoError::Missing(name.to_owned()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
