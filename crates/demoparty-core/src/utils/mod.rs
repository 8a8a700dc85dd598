//! Utility functions for text cleanup and date formatting.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{
    clean_text, format_date_range, inner_text, strip_html, truncate_with_ellipsis,
};
