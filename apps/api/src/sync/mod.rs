// Draft synchronization: debounced, change-gated upserts of the whole resume
// document to the remote store.

pub mod identity;
#[cfg(test)]
pub mod memory;
pub mod notify;
pub mod store;
pub mod synchronizer;

pub use identity::{ActorId, IdentityProvider, RequestIdentity};
pub use notify::{NoticeBoard, SaveNotifier};
pub use store::{DocumentStore, PgDocumentStore, SectionKey, StoreError};
pub use synchronizer::{DraftSynchronizer, SaveStatus};
