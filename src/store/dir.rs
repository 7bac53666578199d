use std::io::ErrorKind;

use anyhow::{bail, ensure, Context, Error, Result};
use cap_std::fs::Dir;

use crate::{
    contact::{Contact, ContactId, EntryKind, Update},
    store::ContactStore,
};

/// Stores every contact as a separate file below `contacts/`.
///
/// Files are written under a `.new` suffix and then renamed into place,
/// so a crashed write leaves the previous version intact.
pub struct DirStore {
    dir: Dir,
}

impl DirStore {
    pub fn open(dir: &Dir) -> Result<Self> {
        if !dir.exists("contacts") {
            dir.create_dir("contacts")?;
        }

        let dir = dir.open_dir("contacts")?;

        Ok(Self { dir })
    }

    fn read(&self, id: ContactId) -> Result<Option<Contact>> {
        let file = match self.dir.open(id.to_string()) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let contact = Contact::read(file).with_context(|| format!("Failed to read contact {}", id))?;

        Ok(Some(contact))
    }

    fn write(&self, contact: &Contact) -> Result<()> {
        let name = contact.id.to_string();
        let new_name = format!("{}.new", name);

        contact.write(self.dir.create(&new_name)?)?;
        self.dir.rename(&new_name, &self.dir, &name)?;

        Ok(())
    }
}

impl ContactStore for DirStore {
    fn load_all(&self) -> Result<Vec<Contact>> {
        let mut contacts = Vec::new();
        let mut errors = 0;

        for entry in self.dir.entries()? {
            let entry = entry?;
            let name = entry.file_name();

            if name.to_string_lossy().ends_with(".new") {
                tracing::debug!("Skipping incomplete write {:?}", name);
                continue;
            }

            let contact = entry
                .open()
                .map_err(Error::from)
                .and_then(Contact::read)
                .and_then(|contact| {
                    ensure!(
                        name.to_str() == Some(contact.id.to_string().as_str()),
                        "File holds contact {}",
                        contact.id
                    );

                    Ok(contact)
                });

            match contact {
                Ok(contact) => contacts.push(contact),
                Err(err) => {
                    tracing::error!("Failed to load contact {:?}: {:#}", name, err);

                    errors += 1;
                }
            }
        }

        if errors != 0 {
            tracing::error!(
                "Failed to load {} out of {} contacts",
                errors,
                contacts.len() + errors
            );
        }

        tracing::info!("Loaded {} contacts", contacts.len());

        Ok(contacts)
    }

    #[tracing::instrument(skip_all, fields(id = %contact.id))]
    fn persist_create(&mut self, contact: &Contact) -> Result<()> {
        if self.dir.exists(contact.id.to_string()) {
            bail!("Contact {} already exists", contact.id);
        }

        self.write(contact)
    }

    #[tracing::instrument(skip(self, update))]
    fn persist_field_update(&mut self, id: ContactId, update: &Update) -> Result<bool> {
        let mut contact = match self.read(id)? {
            Some(contact) => contact,
            None => {
                tracing::warn!("Contact does not exist");
                return Ok(false);
            }
        };

        if let Err(err) = update.apply(&mut contact) {
            tracing::warn!("Declining update: {}", err);
            return Ok(false);
        }

        self.write(&contact)?;

        Ok(true)
    }

    #[tracing::instrument(skip(self))]
    fn persist_delete(&mut self, id: ContactId, kind: EntryKind, value: &str) -> Result<()> {
        let mut contact = match self.read(id)? {
            Some(contact) => contact,
            None => bail!("Contact {} does not exist", id),
        };

        if !contact.entries_mut(kind).remove(value) {
            tracing::debug!("Entry was already removed");
            return Ok(());
        }

        self.write(&contact)
    }

    #[tracing::instrument(skip(self))]
    fn persist_remove(&mut self, id: ContactId) -> Result<()> {
        self.dir
            .remove_file(id.to_string())
            .with_context(|| format!("Failed to remove contact {}", id))?;

        Ok(())
    }
}
