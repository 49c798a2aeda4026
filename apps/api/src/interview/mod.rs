pub mod expiration;
pub mod handlers;
pub mod scoring;
pub mod session;
pub mod tree;
