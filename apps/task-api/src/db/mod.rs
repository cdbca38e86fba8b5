pub mod contacts;
pub mod store;
