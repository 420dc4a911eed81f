//! Error recorder
//!
//! Wraps the page's `console.error`/`console.warn` and listens for uncaught
//! errors and unhandled promise rejections, delivering what it sees to the
//! collection endpoint.

pub mod recorder;
pub mod types;

pub use recorder::{serialize_console_arg, ErrorRecorder, CONSOLE_ERRORS_TARGET};
pub use types::{ConsoleError, ErrorType};
