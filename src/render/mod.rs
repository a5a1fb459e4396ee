//! Output surfaces for a dashboard state: a self-contained HTML page and a
//! colored terminal report.

pub mod assets;
pub mod html;
pub mod terminal;

pub use html::{PageContext, escape_html, render_page};
pub use terminal::render_report;
