// Library exports for the desktop app and integration tests

pub mod catalog;
pub mod config;
pub mod playback;
pub mod ui;

// Re-export AppContext at crate root for easier access
pub use ui::AppContext;

// Test support (only available with test-utils feature)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;
