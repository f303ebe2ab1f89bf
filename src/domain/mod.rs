mod config;
mod document;
mod entries;
mod ids;
mod kinds;
mod layout;

pub use config::{AppConfig, ImageProfiles};
pub use document::EditableDocument;
pub use entries::{CollectionEntry, EntryList};
pub use ids::{DocumentId, EntryKey, NEW_DOCUMENT};
pub use kinds::EntryKind;
pub use layout::Layout;
