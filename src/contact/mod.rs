mod entries;
pub mod import;
mod profile;
mod update;

use std::cmp::Ordering;
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use anyhow::{Context, Result};
use bincode::{deserialize, serialize};
use cap_std::fs::File;
use serde::{Deserialize, Serialize};
use time::{macros::format_description, Date};
use uuid::Uuid;

use crate::error::ContactError;

pub use entries::{Entries, EntryKind};
pub use profile::Profile;
pub use update::Update;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct ContactId(Uuid);

impl ContactId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.0.hyphenated())
    }
}

impl FromStr for ContactId {
    type Err = uuid::Error;

    fn from_str(val: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(val).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Contact {
    pub id: ContactId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub date_of_birth: Option<Date>,
    pub phone_numbers: Entries,
    pub email_addresses: Entries,
    pub addresses: Entries,
    pub profile_picture: Option<Vec<u8>>,
}

impl Contact {
    pub fn read(mut file: File) -> Result<Self> {
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;

        let val = deserialize(&buf).context("Failed to deserialize contact")?;

        Ok(val)
    }

    pub fn write(&self, mut file: File) -> Result<()> {
        let buf = serialize(self)?;

        file.write_all(&buf)?;
        file.sync_all()?;

        Ok(())
    }

    /// First name followed by the last name, if there is one.
    pub fn display_name(&self) -> String {
        match self.non_empty_last_name() {
            Some(last_name) => format!("{} {}", self.first_name, last_name),
            None => self.first_name.clone(),
        }
    }

    /// Compares display names byte-wise without allocating them.
    pub fn cmp_display_name(&self, other: &Self) -> Ordering {
        self.display_name_bytes().cmp(other.display_name_bytes())
    }

    fn display_name_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        let last_name = self.non_empty_last_name().unwrap_or_default();
        let separator: &[u8] = if last_name.is_empty() { b"" } else { b" " };

        self.first_name
            .bytes()
            .chain(separator.iter().copied())
            .chain(last_name.bytes())
    }

    fn non_empty_last_name(&self) -> Option<&str> {
        self.last_name
            .as_deref()
            .filter(|last_name| !last_name.is_empty())
    }

    pub fn grouping_key(&self) -> Option<char> {
        self.first_name.chars().next()
    }

    pub fn entries(&self, kind: EntryKind) -> &Entries {
        match kind {
            EntryKind::Phone => &self.phone_numbers,
            EntryKind::Email => &self.email_addresses,
            EntryKind::Address => &self.addresses,
        }
    }

    pub fn entries_mut(&mut self, kind: EntryKind) -> &mut Entries {
        match kind {
            EntryKind::Phone => &mut self.phone_numbers,
            EntryKind::Email => &mut self.email_addresses,
            EntryKind::Address => &mut self.addresses,
        }
    }

    pub fn validate(&self) -> Result<(), ContactError> {
        if is_blank(&self.first_name) {
            return Err(ContactError::Validation("first name"));
        }

        for kind in EntryKind::ALL {
            let entries = self.entries(kind);

            if entries.iter().any(|entry| is_blank(entry)) {
                return Err(ContactError::Validation(kind.as_str()));
            }

            if let Some(value) = entries.first_duplicate() {
                return Err(ContactError::DuplicateEntry {
                    kind,
                    value: value.to_owned(),
                });
            }
        }

        Ok(())
    }
}

/// What the entry form collects before a contact exists.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub first_name: String,
    pub last_name: Option<String>,
    pub date_of_birth: Option<Date>,
    pub phone_numbers: Vec<String>,
    pub email_addresses: Vec<String>,
    pub addresses: Vec<String>,
    pub profile_picture: Option<Vec<u8>>,
}

impl NewContact {
    pub fn new(first_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            ..Default::default()
        }
    }

    /// Validates the draft and assigns a fresh id.
    ///
    /// Names are trimmed, blank entries are dropped and repeated entries are kept once.
    pub fn into_contact(self) -> Result<Contact, ContactError> {
        let first_name = self.first_name.trim();

        if first_name.is_empty() {
            return Err(ContactError::Validation("first name"));
        }

        let last_name = self
            .last_name
            .map(|last_name| last_name.trim().to_owned())
            .filter(|last_name| !last_name.is_empty());

        Ok(Contact {
            id: ContactId::generate(),
            first_name: first_name.to_owned(),
            last_name,
            date_of_birth: self.date_of_birth,
            phone_numbers: Entries::collect_valid(self.phone_numbers),
            email_addresses: Entries::collect_valid(self.email_addresses),
            addresses: Entries::collect_valid(self.addresses),
            profile_picture: self.profile_picture,
        })
    }
}

pub fn parse_date(val: &str) -> Result<Date> {
    let val = Date::parse(val.trim(), format_description!("[year]-[month]-[day]"))
        .with_context(|| format!("{} is not a valid date (expected YYYY-MM-DD)", val))?;

    Ok(val)
}

fn is_blank(val: &str) -> bool {
    val.trim().is_empty()
}
