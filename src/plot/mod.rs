//! Plot rendering: the SVG dashboard and a quick terminal view.

pub mod ascii;
pub mod dashboard;

pub use ascii::*;
pub use dashboard::*;
