//! Vowel Plots
//!
//! F1/F2 vowel charts over `plotly`. Elements are composed inside a plot
//! closure and share its context of properties:
//!
//! ```no_run
//! # fn demo(table: &formant_table::FormantTable) -> vowel_plot::Result<()> {
//! use vowel_plot::{vowel_plot, EllipseSize, PlotSettings, Props, Where};
//!
//! let figure = vowel_plot(table, PlotSettings::default(), |plot| {
//!     plot.with_context(Props::new().color_by("vowel"), |plot| {
//!         plot.markers(Props::new())?;
//!         plot.ellipses(EllipseSize::NStd(2.0), Props::new())?;
//!         plot.labels(Props::new().label_by("vowel").at(Where::Mean))?;
//!         Ok(())
//!     })
//! })?;
//! figure.write_html("vowels.html")?;
//! # Ok(())
//! # }
//! ```

mod element;
mod error;
mod geometry;
mod mapper;
mod plot;
mod props;

pub use element::PlotElement;
pub use error::{PlotError, Result};
pub use geometry::{confidence_ellipse, median, Bounds, Ellipse, EllipseSize};
pub use mapper::{Mapper, PALETTE};
pub use plot::{plot_elements, vowel_plot, Figure, PlotSettings, VowelPlot};
pub use props::{LineStyle, MarkerShape, Props, Where};
