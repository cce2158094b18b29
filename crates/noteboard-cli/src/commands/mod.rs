//! Command handlers

pub mod config;
pub mod invite;
pub mod liked;
pub mod merge;
pub mod note;
pub mod presence;
pub mod roster;
pub mod status;
