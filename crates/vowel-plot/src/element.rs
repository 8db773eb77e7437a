//! Declarative plot elements

use crate::geometry::EllipseSize;
use crate::props::Props;
use serde::{Deserialize, Serialize};

/// One element of a vowel plot, as read from configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PlotElement {
    Markers {
        #[serde(default)]
        props: Props,
    },
    Labels {
        #[serde(default)]
        props: Props,
    },
    Ellipses {
        #[serde(default)]
        size: EllipseSize,
        #[serde(default)]
        props: Props,
    },
    /// Group means of `column` joined in `vertices` order
    Polygon {
        column: String,
        vertices: Vec<String>,
        #[serde(default)]
        props: Props,
    },
    /// Arrows from the (x, y) columns to the (`x_end`, `y_end`) columns
    Arrows {
        x_end: String,
        y_end: String,
        #[serde(default)]
        props: Props,
    },
    Legend {
        show: bool,
    },
}
