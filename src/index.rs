use std::cmp::Ordering;

use hashbrown::HashMap;

use crate::{
    contact::{Contact, ContactId},
    error::ContactError,
};

/// Contacts partitioned by the first character of their display name.
///
/// Every section is ordered by display name and ties keep insertion order.
/// Sections never become empty; the last removal drops the key.
#[derive(Debug, Default)]
pub struct GroupingIndex {
    sections: HashMap<char, Vec<Contact>>,
}

impl GroupingIndex {
    pub fn build<I>(contacts: I) -> Self
    where
        I: IntoIterator<Item = Contact>,
    {
        let mut sections = HashMap::<char, Vec<Contact>>::new();

        for contact in contacts {
            let key = match contact.validate().and_then(|()| {
                contact
                    .grouping_key()
                    .ok_or(ContactError::Validation("first name"))
            }) {
                Ok(key) => key,
                Err(err) => {
                    tracing::warn!("Skipping invalid contact {}: {}", contact.id, err);
                    continue;
                }
            };

            sections.entry(key).or_default().push(contact);
        }

        for section in sections.values_mut() {
            section.sort_by(Contact::cmp_display_name);
        }

        Self { sections }
    }

    /// Keys are few, so they are sorted on every call instead of being cached.
    pub fn section_keys(&self) -> Vec<char> {
        let mut keys = self.sections.keys().copied().collect::<Vec<_>>();
        keys.sort_unstable();
        keys
    }

    pub fn section(&self, key: char) -> &[Contact] {
        self.sections
            .get(&key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn sections(&self) -> impl Iterator<Item = (char, &[Contact])> + '_ {
        self.section_keys()
            .into_iter()
            .map(move |key| (key, self.section(key)))
    }

    pub fn count_in_section(&self, key: char) -> usize {
        self.section(key).len()
    }

    pub fn contact_at(&self, key: char, position: usize) -> Result<&Contact, ContactError> {
        let section = self.section(key);

        section
            .get(position)
            .ok_or(ContactError::IndexOutOfRange {
                key,
                position,
                len: section.len(),
            })
    }

    /// Display name and contact for each row of a section.
    pub fn rows(&self, key: char) -> impl Iterator<Item = (String, &Contact)> + '_ {
        self.section(key)
            .iter()
            .map(|contact| (contact.display_name(), contact))
    }

    pub fn len(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn get(&self, id: ContactId) -> Option<&Contact> {
        self.locate(id)
            .map(|(key, position)| &self.sections[&key][position])
    }

    pub fn ids(&self) -> impl Iterator<Item = ContactId> + '_ {
        self.sections
            .values()
            .flat_map(|section| section.iter().map(|contact| contact.id))
    }

    pub fn insert(&mut self, contact: Contact) -> Result<(), ContactError> {
        let key = contact
            .grouping_key()
            .ok_or(ContactError::Validation("first name"))?;

        let section = self.sections.entry(key).or_default();

        let position = section
            .partition_point(|other| other.cmp_display_name(&contact) != Ordering::Greater);

        section.insert(position, contact);

        Ok(())
    }

    pub fn remove(&mut self, id: ContactId) -> Option<Contact> {
        let (key, position) = self.locate(id)?;

        let section = self.sections.get_mut(&key)?;
        let contact = section.remove(position);

        if section.is_empty() {
            self.sections.remove(&key);
        }

        Some(contact)
    }

    /// Applies `mutator` to a copy of the contact and only commits the copy if it is still valid.
    ///
    /// A contact whose display name is unchanged keeps its position.
    /// Otherwise it is taken out and inserted again like a new contact,
    /// i.e. after all contacts with an equal display name, whether or not its key changed.
    pub fn update<F>(&mut self, id: ContactId, mutator: F) -> Result<&Contact, ContactError>
    where
        F: FnOnce(&mut Contact) -> Result<(), ContactError>,
    {
        let (key, position) = self
            .locate(id)
            .ok_or_else(|| ContactError::NotFound(id.to_string()))?;

        let current = &self.sections[&key][position];

        let mut contact = current.clone();
        mutator(&mut contact)?;
        contact.validate()?;

        if contact.id != id {
            return Err(ContactError::Validation("id"));
        }

        if current.cmp_display_name(&contact) == Ordering::Equal {
            let section = self
                .sections
                .get_mut(&key)
                .ok_or_else(|| ContactError::NotFound(id.to_string()))?;

            section[position] = contact;
        } else {
            self.remove(id);
            self.insert(contact)?;
        }

        self.get(id)
            .ok_or_else(|| ContactError::NotFound(id.to_string()))
    }

    fn locate(&self, id: ContactId) -> Option<(char, usize)> {
        self.sections.iter().find_map(|(key, section)| {
            section
                .iter()
                .position(|contact| contact.id == id)
                .map(|position| (*key, position))
        })
    }
}
