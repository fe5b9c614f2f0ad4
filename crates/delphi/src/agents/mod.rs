//! Research agents
//!
//! - [`Researcher`]: asks the model which tools to call, runs them
//!   concurrently, and gathers a [`ResearchBundle`]
//! - [`Analyst`]: turns a bundle into a Markdown report
//! - [`chartist`]: renders price history into a base64-encoded chart

pub mod analyst;
pub mod chartist;
pub mod researcher;

pub use analyst::Analyst;
pub use chartist::{PlotSurface, SvgPlotter, render_chart, render_chart_with};
pub use researcher::{ResearchBundle, Researcher};
