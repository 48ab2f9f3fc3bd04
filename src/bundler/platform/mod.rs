//! Platform-specific installer backends.
//!
//! Fragment generation only reads the application image and writes text, so
//! the Windows backend builds on every host.

pub mod windows;
