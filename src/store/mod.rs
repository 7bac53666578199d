mod dir;
mod memory;

use anyhow::Result;

use crate::contact::{Contact, ContactId, EntryKind, Update};

pub use dir::DirStore;
pub use memory::MemoryStore;

/// Durable home of all contacts.
///
/// The grouping index only mirrors what a store has accepted.
pub trait ContactStore {
    fn load_all(&self) -> Result<Vec<Contact>>;

    fn persist_create(&mut self, contact: &Contact) -> Result<()>;

    /// Returns `false` if the store declined the update, in which case nothing was changed.
    fn persist_field_update(&mut self, id: ContactId, update: &Update) -> Result<bool>;

    fn persist_delete(&mut self, id: ContactId, kind: EntryKind, value: &str) -> Result<()>;

    fn persist_remove(&mut self, id: ContactId) -> Result<()>;
}
