// Resume records and export bookkeeping around the editor sessions.

pub mod export;
pub mod handlers;
pub mod repository;
