use anyhow::{anyhow, bail, Result};
use hashbrown::HashMap;

use crate::{
    contact::{Contact, ContactId, EntryKind, Update},
    store::ContactStore,
};

/// Keeps contacts in memory only.
///
/// Updates can be declined and writes can be made to fail to exercise callers' error paths.
#[derive(Default)]
pub struct MemoryStore {
    contacts: HashMap<ContactId, Contact>,
    reject_updates: bool,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new<I>(contacts: I) -> Self
    where
        I: IntoIterator<Item = Contact>,
    {
        Self {
            contacts: contacts
                .into_iter()
                .map(|contact| (contact.id, contact))
                .collect(),
            ..Default::default()
        }
    }

    pub fn reject_updates(&mut self, reject_updates: bool) {
        self.reject_updates = reject_updates;
    }

    pub fn fail_writes(&mut self, fail_writes: bool) {
        self.fail_writes = fail_writes;
    }

    pub fn get(&self, id: ContactId) -> Option<&Contact> {
        self.contacts.get(&id)
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes {
            bail!("Writes are disabled");
        }

        Ok(())
    }
}

impl ContactStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<Contact>> {
        Ok(self.contacts.values().cloned().collect())
    }

    fn persist_create(&mut self, contact: &Contact) -> Result<()> {
        self.check_writable()?;

        if self.contacts.contains_key(&contact.id) {
            bail!("Contact {} already exists", contact.id);
        }

        self.contacts.insert(contact.id, contact.clone());

        Ok(())
    }

    fn persist_field_update(&mut self, id: ContactId, update: &Update) -> Result<bool> {
        self.check_writable()?;

        if self.reject_updates {
            return Ok(false);
        }

        let contact = match self.contacts.get_mut(&id) {
            Some(contact) => contact,
            None => return Ok(false),
        };

        Ok(update.apply(contact).is_ok())
    }

    fn persist_delete(&mut self, id: ContactId, kind: EntryKind, value: &str) -> Result<()> {
        self.check_writable()?;

        let contact = self
            .contacts
            .get_mut(&id)
            .ok_or_else(|| anyhow!("Contact {} does not exist", id))?;

        contact.entries_mut(kind).remove(value);

        Ok(())
    }

    fn persist_remove(&mut self, id: ContactId) -> Result<()> {
        self.check_writable()?;

        self.contacts
            .remove(&id)
            .ok_or_else(|| anyhow!("Contact {} does not exist", id))?;

        Ok(())
    }
}
