//! End-to-end tests for useradm.
//!
//! Each test opens a real admin session over a temporary files directory
//! and, where needed, an in-memory directory server.

mod common;
mod conflicts;
mod credentials;
mod enumeration;
mod lifecycle;
mod membership;
