//! Archive download for the toolchain installer
//!
//! - `core` - streaming HTTP download with bounded redirects

mod core;

pub use self::core::{Downloader, MAX_REDIRECTS, byte_status};
