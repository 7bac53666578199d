use time::Date;

use crate::{
    contact::{Contact, EntryKind},
    error::ContactError,
};

/// A single-field change made from the detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    FirstName(String),
    LastName(Option<String>),
    DateOfBirth(Option<Date>),
    ProfilePicture(Option<Vec<u8>>),
    /// Adds `new` or, if `old` is given, replaces that entry by it.
    Entry {
        kind: EntryKind,
        old: Option<String>,
        new: String,
    },
}

impl Update {
    /// Applies the change, leaving `contact` untouched if it fails.
    pub fn apply(&self, contact: &mut Contact) -> Result<(), ContactError> {
        match self {
            Self::FirstName(first_name) => {
                let first_name = first_name.trim();

                if first_name.is_empty() {
                    return Err(ContactError::Validation("first name"));
                }

                contact.first_name = first_name.to_owned();
            }
            Self::LastName(last_name) => {
                contact.last_name = last_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|last_name| !last_name.is_empty())
                    .map(ToOwned::to_owned);
            }
            Self::DateOfBirth(date_of_birth) => contact.date_of_birth = *date_of_birth,
            Self::ProfilePicture(profile_picture) => {
                contact.profile_picture = profile_picture.clone()
            }
            Self::Entry { kind, old, new } => {
                if new.trim().is_empty() {
                    return Err(ContactError::Validation(kind.as_str()));
                }

                let entries = contact.entries_mut(*kind);

                if old.as_deref() == Some(new.as_str()) && entries.contains(new) {
                    return Ok(());
                }

                if entries.contains(new) {
                    return Err(ContactError::DuplicateEntry {
                        kind: *kind,
                        value: new.clone(),
                    });
                }

                match old {
                    Some(old) => {
                        if !entries.replace(old, new.clone()) {
                            return Err(ContactError::MissingEntry {
                                kind: *kind,
                                value: old.clone(),
                            });
                        }
                    }
                    None => {
                        entries.insert(new.clone());
                    }
                }
            }
        }

        Ok(())
    }
}
