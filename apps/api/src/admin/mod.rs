// Staff console: table CRUD, the combined overview payload, and dashboard
// statistics.

pub mod dashboard;
pub mod handlers;
