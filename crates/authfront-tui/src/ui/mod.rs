//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout and the two pages
//! - `input`: keyboard event handling per route
//! - `styles`: color palette and text styling

pub mod input;
pub mod render;
pub mod styles;
