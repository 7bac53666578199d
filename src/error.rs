use thiserror::Error;

use crate::contact::EntryKind;

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("{0} must not be empty")]
    Validation(&'static str),
    #[error("{kind} {value:?} already exists for this contact")]
    DuplicateEntry { kind: EntryKind, value: String },
    #[error("{kind} {value:?} does not exist for this contact")]
    MissingEntry { kind: EntryKind, value: String },
    #[error("the store rejected the change")]
    PersistenceRejected,
    #[error("position {position} is out of range for section {key:?} with {len} contacts")]
    IndexOutOfRange {
        key: char,
        position: usize,
        len: usize,
    },
    #[error("no contact with id {0}")]
    NotFound(String),
    #[error("id prefix {0} matches more than one contact")]
    Ambiguous(String),
}
