//! Sender inbox: browse a Gmail inbox grouped by sender.

pub mod aggregate;
pub mod api;
pub mod auth;
pub mod body;
pub mod config;
pub mod error;
pub mod gmail;
pub mod index;
pub mod links;
pub mod render;
pub mod service;
