//! Document: how an entity is named and identified inside a schema-less store.
//!
//! A store keeps every document of one type under the type's collection name
//! and addresses it by the textual form of its identity. Identity is either
//! handed out by the store on first save (integers) or derived from the
//! document's own fields (strings).

use std::fmt::Display;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// JSON field holding the identity inside every stored document.
pub const ID_FIELD: &str = "id";

/// Identity type of a [`Document`].
pub trait DocumentKey: Clone + Display + Send + Sync + 'static {
    /// Whether the store hands out this identity on first save.
    const STORE_ASSIGNED: bool;
}

impl DocumentKey for String {
    const STORE_ASSIGNED: bool = false;
}

/// An entity persisted as a JSON document.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Identity type.
    type Id: DocumentKey;

    /// Name of the collection holding every document of this type.
    const COLLECTION: &'static str;

    /// Current identity, `None` until first save for store-assigned ids.
    fn id(&self) -> Option<Self::Id>;

    /// Record the identity chosen by the store.
    fn set_id(&mut self, id: Self::Id);
}

/// Check that `field` can be used as a document field selector.
#[must_use]
pub fn is_valid_field_name(field: &str) -> bool {
    !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}
