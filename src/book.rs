use anyhow::Result;

use crate::{
    contact::{Contact, ContactId, EntryKind, NewContact, Update},
    error::ContactError,
    index::GroupingIndex,
    store::ContactStore,
};

/// Ties the grouping index to the store it mirrors.
///
/// Every change is validated against the indexed copy, then persisted, and only
/// applied to the index once the store has accepted it.
pub struct AddressBook<S> {
    store: S,
    index: GroupingIndex,
}

impl<S> AddressBook<S>
where
    S: ContactStore,
{
    pub fn open(store: S) -> Result<Self> {
        let contacts = store.load_all()?;

        let index = GroupingIndex::build(contacts);

        Ok(Self { store, index })
    }

    pub fn index(&self) -> &GroupingIndex {
        &self.index
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get(&self, id: ContactId) -> Result<&Contact, ContactError> {
        self.index
            .get(id)
            .ok_or_else(|| ContactError::NotFound(id.to_string()))
    }

    /// Resolves a full id or a prefix of exactly one id.
    pub fn find(&self, query: &str) -> Result<ContactId, ContactError> {
        if let Ok(id) = query.parse::<ContactId>() {
            return self.get(id).map(|contact| contact.id);
        }

        if query.is_empty() {
            return Err(ContactError::NotFound(query.to_owned()));
        }

        let mut matches = self
            .index
            .ids()
            .filter(|id| id.to_string().starts_with(query));

        match (matches.next(), matches.next()) {
            (Some(id), None) => Ok(id),
            (Some(_), Some(_)) => Err(ContactError::Ambiguous(query.to_owned())),
            (None, _) => Err(ContactError::NotFound(query.to_owned())),
        }
    }

    pub fn create(&mut self, draft: NewContact) -> Result<ContactId, ContactError> {
        let contact = draft.into_contact()?;
        let id = contact.id;

        if let Err(err) = self.store.persist_create(&contact) {
            tracing::error!("Failed to store new contact: {:#}", err);

            return Err(ContactError::PersistenceRejected);
        }

        self.index.insert(contact)?;

        tracing::debug!("Created contact {}", id);

        Ok(id)
    }

    pub fn update(&mut self, id: ContactId, update: Update) -> Result<&Contact, ContactError> {
        let mut contact = self.get(id)?.clone();
        update.apply(&mut contact)?;
        contact.validate()?;

        match self.store.persist_field_update(id, &update) {
            Ok(true) => (),
            Ok(false) => {
                tracing::warn!("Store declined update of contact {}", id);

                return Err(ContactError::PersistenceRejected);
            }
            Err(err) => {
                tracing::error!("Failed to store update of contact {}: {:#}", id, err);

                return Err(ContactError::PersistenceRejected);
            }
        }

        self.index.update(id, move |current| {
            *current = contact;
            Ok(())
        })
    }

    pub fn add_entry(
        &mut self,
        id: ContactId,
        kind: EntryKind,
        value: String,
    ) -> Result<&Contact, ContactError> {
        self.update(
            id,
            Update::Entry {
                kind,
                old: None,
                new: value,
            },
        )
    }

    pub fn replace_entry(
        &mut self,
        id: ContactId,
        kind: EntryKind,
        old: String,
        new: String,
    ) -> Result<&Contact, ContactError> {
        self.update(
            id,
            Update::Entry {
                kind,
                old: Some(old),
                new,
            },
        )
    }

    pub fn delete_entry(
        &mut self,
        id: ContactId,
        kind: EntryKind,
        value: &str,
    ) -> Result<&Contact, ContactError> {
        if !self.get(id)?.entries(kind).contains(value) {
            return Err(ContactError::MissingEntry {
                kind,
                value: value.to_owned(),
            });
        }

        if let Err(err) = self.store.persist_delete(id, kind, value) {
            tracing::error!("Failed to delete {} of contact {}: {:#}", kind, id, err);

            return Err(ContactError::PersistenceRejected);
        }

        self.index.update(id, |contact| {
            contact.entries_mut(kind).remove(value);
            Ok(())
        })
    }

    /// Called when the picture picker finishes; `None` means it was dismissed.
    pub fn set_profile_picture(
        &mut self,
        id: ContactId,
        picture: Option<Vec<u8>>,
    ) -> Result<Option<&Contact>, ContactError> {
        match picture {
            Some(picture) => self
                .update(id, Update::ProfilePicture(Some(picture)))
                .map(Some),
            None => {
                tracing::debug!("Picture picker dismissed");

                Ok(None)
            }
        }
    }

    pub fn delete(&mut self, id: ContactId) -> Result<Contact, ContactError> {
        self.get(id)?;

        if let Err(err) = self.store.persist_remove(id) {
            tracing::error!("Failed to delete contact {}: {:#}", id, err);

            return Err(ContactError::PersistenceRejected);
        }

        self.index
            .remove(id)
            .ok_or_else(|| ContactError::NotFound(id.to_string()))
    }

    /// Creates every valid draft and returns how many drafts there were and how many failed.
    pub fn import<I>(&mut self, drafts: I) -> (usize, usize)
    where
        I: IntoIterator<Item = Result<NewContact>>,
    {
        let mut count = 0;
        let mut failed = 0;

        for draft in drafts {
            count += 1;

            let res = draft.and_then(|draft| self.create(draft).map_err(Into::into));

            if let Err(err) = res {
                tracing::error!("Failed to import contact {}: {:#}", count, err);

                failed += 1;
            }
        }

        tracing::info!("Imported {} out of {} contacts", count - failed, count);

        (count, failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::anyhow;

    use crate::store::MemoryStore;

    fn book(names: &[&str]) -> AddressBook<MemoryStore> {
        let contacts = names
            .iter()
            .map(|name| NewContact::new(*name).into_contact().unwrap());

        AddressBook::open(MemoryStore::new(contacts)).unwrap()
    }

    fn names(book: &AddressBook<MemoryStore>, key: char) -> Vec<String> {
        book.index().rows(key).map(|(name, _)| name).collect()
    }

    fn id_of(book: &AddressBook<MemoryStore>, name: &str) -> ContactId {
        book.index()
            .ids()
            .find(|id| book.get(*id).unwrap().first_name == name)
            .unwrap()
    }

    #[test]
    fn open_groups_stored_contacts() {
        let book = book(&["Zoe", "Amy", "Adam"]);

        assert_eq!(book.index().section_keys(), ['A', 'Z']);
        assert_eq!(names(&book, 'A'), ["Adam", "Amy"]);
        assert_eq!(names(&book, 'Z'), ["Zoe"]);
    }

    #[test]
    fn created_contacts_are_stored_and_indexed() {
        let mut book = book(&["Adam", "Amy"]);

        let id = book.create(NewContact::new("Alex")).unwrap();

        assert_eq!(names(&book, 'A'), ["Adam", "Alex", "Amy"]);
        assert_eq!(book.store().get(id).unwrap().first_name, "Alex");
    }

    #[test]
    fn creation_without_first_name_commits_nothing() {
        let mut book = book(&["Amy"]);

        let err = book.create(NewContact::new("")).unwrap_err();

        assert!(matches!(err, ContactError::Validation("first name")));
        assert_eq!(book.index().len(), 1);
        assert_eq!(book.store().load_all().unwrap().len(), 1);
    }

    #[test]
    fn failed_creation_is_not_indexed() {
        let mut book = book(&[]);
        book.store.fail_writes(true);

        let err = book.create(NewContact::new("Amy")).unwrap_err();

        assert!(matches!(err, ContactError::PersistenceRejected));
        assert!(book.index().is_empty());
    }

    #[test]
    fn renaming_moves_contact_between_sections() {
        let mut book = book(&["Zoe", "Amy", "Adam"]);
        let adam = id_of(&book, "Adam");

        book.update(adam, Update::FirstName("Bob".to_owned()))
            .unwrap();

        assert_eq!(book.index().section_keys(), ['A', 'B', 'Z']);
        assert_eq!(names(&book, 'A'), ["Amy"]);
        assert_eq!(names(&book, 'B'), ["Bob"]);
        assert_eq!(book.store().get(adam).unwrap().first_name, "Bob");
    }

    #[test]
    fn renaming_only_member_drops_its_section() {
        let mut book = book(&["Zoe", "Amy"]);
        let amy = id_of(&book, "Amy");

        book.update(amy, Update::FirstName("Bob".to_owned()))
            .unwrap();

        assert_eq!(book.index().section_keys(), ['B', 'Z']);
        assert_eq!(book.index().count_in_section('A'), 0);
        assert_eq!(names(&book, 'B'), ["Bob"]);
    }

    #[test]
    fn invalid_stored_contact_is_neither_indexed_nor_updated() {
        let mut blank = NewContact::new("Amy").into_contact().unwrap();
        blank.first_name = "   ".to_owned();
        let blank_id = blank.id;

        let zoe = NewContact::new("Zoe").into_contact().unwrap();

        let mut book = AddressBook::open(MemoryStore::new([blank, zoe])).unwrap();

        assert_eq!(book.index().section_keys(), ['Z']);

        let err = book
            .update(blank_id, Update::LastName(Some("Pond".to_owned())))
            .unwrap_err();
        assert!(matches!(err, ContactError::NotFound(_)));

        let stored = book.store().get(blank_id).unwrap();
        assert_eq!(stored.first_name, "   ");
        assert_eq!(stored.last_name, None);
    }

    #[test]
    fn rejected_update_keeps_last_known_good_value() {
        let mut book = book(&["Amy"]);
        let amy = id_of(&book, "Amy");

        book.store.reject_updates(true);

        let err = book
            .update(amy, Update::FirstName("Zoe".to_owned()))
            .unwrap_err();
        assert!(matches!(err, ContactError::PersistenceRejected));

        let err = book
            .add_entry(amy, EntryKind::Phone, "555-0100".to_owned())
            .unwrap_err();
        assert!(matches!(err, ContactError::PersistenceRejected));

        assert_eq!(book.index().section_keys(), ['A']);
        assert_eq!(book.get(amy).unwrap().first_name, "Amy");
        assert!(book.get(amy).unwrap().phone_numbers.is_empty());
    }

    #[test]
    fn failing_store_keeps_last_known_good_value() {
        let mut book = book(&["Amy"]);
        let amy = id_of(&book, "Amy");

        book.add_entry(amy, EntryKind::Address, "Leadworth".to_owned())
            .unwrap();

        book.store.fail_writes(true);

        let err = book
            .replace_entry(
                amy,
                EntryKind::Address,
                "Leadworth".to_owned(),
                "London".to_owned(),
            )
            .unwrap_err();
        assert!(matches!(err, ContactError::PersistenceRejected));

        let err = book
            .delete_entry(amy, EntryKind::Address, "Leadworth")
            .unwrap_err();
        assert!(matches!(err, ContactError::PersistenceRejected));

        let err = book.delete(amy).unwrap_err();
        assert!(matches!(err, ContactError::PersistenceRejected));

        let contact = book.get(amy).unwrap();
        assert_eq!(contact.addresses.iter().collect::<Vec<_>>(), ["Leadworth"]);
    }

    #[test]
    fn duplicate_entries_are_discarded() {
        let mut book = book(&["Amy"]);
        let amy = id_of(&book, "Amy");

        book.add_entry(amy, EntryKind::Email, "amy@example.org".to_owned())
            .unwrap();

        let err = book
            .add_entry(amy, EntryKind::Email, "amy@example.org".to_owned())
            .unwrap_err();
        assert!(matches!(err, ContactError::DuplicateEntry { .. }));

        assert_eq!(book.get(amy).unwrap().email_addresses.len(), 1);
        assert_eq!(book.store().get(amy).unwrap().email_addresses.len(), 1);
    }

    #[test]
    fn blank_entries_are_refused() {
        let mut book = book(&["Amy"]);
        let amy = id_of(&book, "Amy");

        let err = book
            .add_entry(amy, EntryKind::Phone, "   ".to_owned())
            .unwrap_err();

        assert!(matches!(err, ContactError::Validation("phone")));
        assert!(book.store().get(amy).unwrap().phone_numbers.is_empty());
    }

    #[test]
    fn entries_are_deleted_from_store_and_index() {
        let mut book = book(&["Amy"]);
        let amy = id_of(&book, "Amy");

        book.add_entry(amy, EntryKind::Phone, "555-0100".to_owned())
            .unwrap();
        book.add_entry(amy, EntryKind::Phone, "555-0101".to_owned())
            .unwrap();

        let contact = book
            .delete_entry(amy, EntryKind::Phone, "555-0100")
            .unwrap();
        assert_eq!(contact.phone_numbers.iter().collect::<Vec<_>>(), ["555-0101"]);

        assert_eq!(book.store().get(amy).unwrap().phone_numbers.len(), 1);

        let err = book
            .delete_entry(amy, EntryKind::Phone, "555-0100")
            .unwrap_err();
        assert!(matches!(err, ContactError::MissingEntry { .. }));
    }

    #[test]
    fn dismissed_picker_changes_nothing() {
        let mut book = book(&["Amy"]);
        let amy = id_of(&book, "Amy");

        assert!(book.set_profile_picture(amy, None).unwrap().is_none());
        assert!(book.get(amy).unwrap().profile_picture.is_none());

        let contact = book
            .set_profile_picture(amy, Some(vec![1, 2, 3]))
            .unwrap()
            .unwrap();
        assert_eq!(contact.profile_picture.as_deref(), Some(&[1, 2, 3][..]));
        assert!(book.store().get(amy).unwrap().profile_picture.is_some());
    }

    #[test]
    fn deleting_last_contact_of_section_drops_key() {
        let mut book = book(&["Zoe", "Amy"]);
        let zoe = id_of(&book, "Zoe");

        let removed = book.delete(zoe).unwrap();

        assert_eq!(removed.first_name, "Zoe");
        assert_eq!(book.index().section_keys(), ['A']);
        assert!(book.store().get(zoe).is_none());
        assert!(matches!(book.delete(zoe), Err(ContactError::NotFound(_))));
    }

    #[test]
    fn ids_are_found_by_prefix() {
        let book = book(&["Amy", "Zoe"]);
        let amy = id_of(&book, "Amy");
        let amy_str = amy.to_string();

        assert_eq!(book.find(&amy_str).unwrap(), amy);

        let prefix = (1..=amy_str.len())
            .map(|len| &amy_str[..len])
            .find(|prefix| book.find(prefix).is_ok())
            .unwrap();
        assert_eq!(book.find(prefix).unwrap(), amy);

        assert!(matches!(book.find(""), Err(ContactError::NotFound(_))));
        assert!(matches!(book.find("xyz"), Err(ContactError::NotFound(_))));
        assert!(matches!(
            book.find(&ContactId::generate().to_string()),
            Err(ContactError::NotFound(_))
        ));
    }

    #[test]
    fn import_keeps_valid_drafts() {
        let mut book = book(&[]);

        let (count, failed) = book.import(vec![
            Ok(NewContact::new("Amy")),
            Ok(NewContact::new(" ")),
            Err(anyhow!("invalid date")),
            Ok(NewContact::new("Rory")),
        ]);

        assert_eq!((count, failed), (4, 2));
        assert_eq!(book.index().section_keys(), ['A', 'R']);
    }
}
