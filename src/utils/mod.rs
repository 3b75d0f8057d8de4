//! Utility functions and data structures.
//!
//! ## Modules
//!
//! - [`app_data`] - Configuration file and saved index state (XDG-compliant)
//! - [`chars`] - Named special characters for escape resolution
//! - [`encoding`] - Big-endian integers and legacy UTF-8
//! - [`normalize`] - Escape-sequence resolution for stored text
//! - [`progress`] - Progress bars, no-op without the `progress` feature
//!
//! ## Key Functions
//!
//! ```
//! use mandex::utils::normalize_lossy;
//!
//! assert_eq!(normalize_lossy(b"\\fBls\\fR \\(em list"), "ls \u{2014} list");
//! ```

pub mod app_data;
pub mod chars;
pub mod encoding;
pub mod normalize;
pub mod progress;

pub use app_data::*;
pub use chars::{CharTable, StandardChars, standard_chars};
pub use normalize::{normalize, normalize_lossy, normalize_with};
