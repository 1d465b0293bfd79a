pub mod project;
pub mod session;
pub mod store;
pub mod time_entry;
pub mod user;
