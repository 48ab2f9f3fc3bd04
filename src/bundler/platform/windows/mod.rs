//! Windows installer support.
//!
//! # Supported Formats
//!
//! - **WiX source fragment (.wxs)**: via the [`wix`] module, for WiX 3.x and
//!   the v4 schema (WiX 4, 5 and 6)
//!
//! # Output Location
//!
//! The fragment is written where the caller asks, `app-content.wxs` by
//! default, and is compiled together with the main installer source.

pub mod wix;
