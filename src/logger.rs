//! Logging utilities with colored module prefixes.
//!
//! This module provides:
//! - `log!` macro for formatted output with colored prefixes
//! - `warn!` macro for degradation warnings (injector soft failures)
//! - `debug!` macro gated behind the global verbose flag
//!
//! # Example
//!
//! ```ignore
//! log!("render"; "processed {} components", count);
//! warn!("carousel"; "root {} is missing a .swiper container", index);
//! ```

use owo_colors::OwoColorize;
use std::io::{Write, stderr, stdout};
use std::sync::atomic::{AtomicBool, Ordering};

/// Global verbose flag (set by the embedding application)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macros
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a warning with a colored module prefix.
///
/// Used for the soft-failure paths: malformed authored markup, invalid
/// supplied data, related-content fetch failures. The page keeps
/// rendering; the warning is operator-visible only.
#[macro_export]
macro_rules! warn {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::warn($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when verbose mode is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module, false);
    let mut stdout = stdout().lock();
    writeln!(stdout, "{prefix} {message}").ok();
}

/// Log a warning to stderr with a colored module prefix
#[inline]
pub fn warn(module: &str, message: &str) {
    let prefix = colorize_prefix(module, true);
    let mut stderr = stderr().lock();
    writeln!(stderr, "{prefix} {message}").ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, is_warning: bool) -> String {
    let prefix = format!("[{module}]");
    if is_warning {
        return prefix.bright_red().bold().to_string();
    }
    match module {
        "render" => prefix.bright_blue().bold().to_string(),
        "carousel" => prefix.bright_green().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_flag_round_trip() {
        set_verbose(true);
        assert!(is_verbose());
        set_verbose(false);
        assert!(!is_verbose());
    }
}
