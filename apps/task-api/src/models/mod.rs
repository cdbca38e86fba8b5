pub mod comment;
pub mod filter;
pub mod task;
