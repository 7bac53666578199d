use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, ValueEnum)]
pub enum EntryKind {
    Phone,
    Email,
    Address,
}

impl EntryKind {
    pub const ALL: [Self; 3] = [Self::Phone, Self::Email, Self::Address];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Address => "address",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Phone => "Phone",
            Self::Email => "Email",
            Self::Address => "Address",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

/// Ordered list of phone numbers, email addresses or postal addresses.
///
/// Values are compared exactly and kept in the order they were added.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Entries(SmallVec<[String; 2]>);

impl Entries {
    /// Keeps the first occurrence of every non-blank value.
    pub fn collect_valid<I>(values: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut entries = Self::default();

        for value in values {
            if !value.trim().is_empty() {
                entries.insert(value);
            }
        }

        entries
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|entry| entry == value)
    }

    pub fn sorted(&self) -> Vec<&str> {
        let mut values = self.iter().collect::<Vec<_>>();
        values.sort_unstable();
        values
    }

    /// Returns `false` without modification if the value is already present.
    pub fn insert(&mut self, value: String) -> bool {
        if self.contains(&value) {
            return false;
        }

        self.0.push(value);
        true
    }

    /// Replaces `old` by `new` at the same position.
    pub fn replace(&mut self, old: &str, new: String) -> bool {
        if self.contains(&new) {
            return false;
        }

        match self.0.iter_mut().find(|entry| *entry == old) {
            Some(entry) => {
                *entry = new;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, value: &str) -> bool {
        match self.0.iter().position(|entry| entry == value) {
            Some(pos) => {
                self.0.remove(pos);
                true
            }
            None => false,
        }
    }

    pub(super) fn first_duplicate(&self) -> Option<&str> {
        self.0
            .iter()
            .enumerate()
            .find(|(pos, entry)| self.0[..*pos].contains(entry))
            .map(|(_, entry)| entry.as_str())
    }
}
