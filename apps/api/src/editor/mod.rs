// Editor sessions: one open resume per entry, each owning its draft and
// the synchronizer that keeps the stored copy current.

pub mod handlers;
pub mod registry;
pub mod session;

pub use registry::SessionRegistry;
