pub mod assist;
pub mod auth;
pub mod backup;
pub mod media;
pub mod notes;
pub mod pages;
pub mod prompts;
pub mod tools;
