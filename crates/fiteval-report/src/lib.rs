//! fiteval-report — HTML rendering of evaluations and progress histories.

pub mod html;

pub use html::{
    generate_progress_html, generate_summary_html, write_progress_html, write_summary_html,
};
