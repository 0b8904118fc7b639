pub mod application;
pub mod chat;
pub mod document;
pub mod user;
