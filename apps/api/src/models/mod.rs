// Shared data model: users and sessions, curriculum tables, and the
// transfer log.

pub mod course;
pub mod transfer;
pub mod user;
