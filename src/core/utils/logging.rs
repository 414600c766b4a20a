//! Console logging macros
//!
//! On wasm32 these forward to `web_sys::console`. Native builds only run the
//! test suite, where the browser console does not exist, so the macros expand
//! to a format check and nothing else.
//!
//! Usage:
//! ```rust
//! use blenda_engine::console_log;
//!
//! let tiles = 108;
//! console_log!("world built: {} tiles", tiles);
//! ```

/// Log an informational message to the browser console.
#[macro_export]
macro_rules! console_log {
    ($($arg:tt)*) => {{
        #[cfg(target_arch = "wasm32")]
        {
            web_sys::console::log_1(&format!($($arg)*).into());
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = format_args!($($arg)*);
        }
    }};
}

/// Log a warning to the browser console.
#[macro_export]
macro_rules! console_warn {
    ($($arg:tt)*) => {{
        #[cfg(target_arch = "wasm32")]
        {
            web_sys::console::warn_1(&format!($($arg)*).into());
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = format_args!($($arg)*);
        }
    }};
}
