//! Interaction recorder
//!
//! Captures user interactions with the page (clicks, key presses, selection
//! changes and navigations), masks user-entered text and delivers the events
//! to the collection endpoint.

pub mod extract;
pub mod recorder;
pub mod types;

pub use recorder::{EventRecorder, UI_EVENTS_TARGET};
pub use types::{DomNode, InteractionEvent, InteractionType};
