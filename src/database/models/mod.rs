pub mod baby;
pub mod document;
pub mod event;
pub mod user;

pub use baby::{Baby, BabyPatch, DEFAULT_BABY_NAME};
pub use document::{Document, NewDocument, NO_BLOB_SENTINEL};
pub use event::{Event, EventKind, EventPatch, NewEvent, UnknownEventKind};
pub use user::{NewUser, User, UserProfile};
