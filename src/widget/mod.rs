//! The chat widget: floating button, panel and transcript state
//!
//! Rendering belongs to the browser. Everything that decides what the panel
//! shows lives here.

mod input;
mod service;
mod session;
mod store;

pub use input::KeyPress;
pub use service::{WidgetError, WidgetService};
pub use session::SessionView;
