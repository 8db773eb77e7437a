//! Element properties and their layering

use plotly::common::{DashType, MarkerSymbol};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Marker shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerShape {
    Circle,
    Square,
    Diamond,
    Cross,
    X,
    TriangleUp,
    TriangleDown,
    Star,
}

impl MarkerShape {
    /// Default marker cycle
    pub const CYCLE: [MarkerShape; 8] = [
        MarkerShape::Circle,
        MarkerShape::Square,
        MarkerShape::Diamond,
        MarkerShape::TriangleUp,
        MarkerShape::Cross,
        MarkerShape::TriangleDown,
        MarkerShape::X,
        MarkerShape::Star,
    ];

    pub(crate) fn symbol(self) -> MarkerSymbol {
        match self {
            MarkerShape::Circle => MarkerSymbol::Circle,
            MarkerShape::Square => MarkerSymbol::Square,
            MarkerShape::Diamond => MarkerSymbol::Diamond,
            MarkerShape::Cross => MarkerSymbol::Cross,
            MarkerShape::X => MarkerSymbol::X,
            MarkerShape::TriangleUp => MarkerSymbol::TriangleUp,
            MarkerShape::TriangleDown => MarkerSymbol::TriangleDown,
            MarkerShape::Star => MarkerSymbol::Star,
        }
    }
}

/// Line style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineStyle {
    Solid,
    Dash,
    Dot,
    DashDot,
}

impl LineStyle {
    /// Default line style cycle
    pub const CYCLE: [LineStyle; 4] = [
        LineStyle::Solid,
        LineStyle::Dash,
        LineStyle::Dot,
        LineStyle::DashDot,
    ];

    pub(crate) fn dash(self) -> DashType {
        match self {
            LineStyle::Solid => DashType::Solid,
            LineStyle::Dash => DashType::Dash,
            LineStyle::Dot => DashType::Dot,
            LineStyle::DashDot => DashType::DashDot,
        }
    }
}

/// Which positions of a group are drawn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Where {
    /// Every row
    #[default]
    All,
    /// One point at the group mean
    Mean,
    /// One point at the group median
    Median,
}

/// Properties of plot elements.
///
/// Unset fields inherit from the enclosing context layers; `*_by` fields
/// name a column whose values select the property through a [`Mapper`].
///
/// [`Mapper`]: crate::Mapper
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Props {
    pub x: Option<String>,
    pub y: Option<String>,
    pub color: Option<String>,
    pub color_by: Option<String>,
    pub marker: Option<MarkerShape>,
    pub marker_by: Option<String>,
    pub line: Option<LineStyle>,
    pub line_by: Option<String>,
    pub label_by: Option<String>,
    pub relabel: BTreeMap<String, String>,
    pub size: Option<f64>,
    pub width: Option<f64>,
    pub group_by: Vec<String>,
    #[serde(rename = "where")]
    pub at: Option<Where>,
    pub legend: Option<bool>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn x(mut self, column: impl Into<String>) -> Self {
        self.x = Some(column.into());
        self
    }

    pub fn y(mut self, column: impl Into<String>) -> Self {
        self.y = Some(column.into());
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn color_by(mut self, column: impl Into<String>) -> Self {
        self.color_by = Some(column.into());
        self
    }

    pub fn marker(mut self, marker: MarkerShape) -> Self {
        self.marker = Some(marker);
        self
    }

    pub fn marker_by(mut self, column: impl Into<String>) -> Self {
        self.marker_by = Some(column.into());
        self
    }

    pub fn line(mut self, line: LineStyle) -> Self {
        self.line = Some(line);
        self
    }

    pub fn line_by(mut self, column: impl Into<String>) -> Self {
        self.line_by = Some(column.into());
        self
    }

    pub fn label_by(mut self, column: impl Into<String>) -> Self {
        self.label_by = Some(column.into());
        self
    }

    pub fn relabel(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.relabel.insert(from.into(), to.into());
        self
    }

    pub fn size(mut self, size: f64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        self.group_by.push(column.into());
        self
    }

    pub fn at(mut self, at: Where) -> Self {
        self.at = Some(at);
        self
    }

    pub fn legend(mut self, legend: bool) -> Self {
        self.legend = Some(legend);
        self
    }

    /// `self` overridden by every field set in `over`
    pub fn merge(&self, over: &Props) -> Props {
        fn pick<T: Clone>(base: &Option<T>, over: &Option<T>) -> Option<T> {
            over.clone().or_else(|| base.clone())
        }
        let mut relabel = self.relabel.clone();
        relabel.extend(over.relabel.iter().map(|(k, v)| (k.clone(), v.clone())));
        let mut group_by = self.group_by.clone();
        for column in &over.group_by {
            if !group_by.contains(column) {
                group_by.push(column.clone());
            }
        }
        Props {
            x: pick(&self.x, &over.x),
            y: pick(&self.y, &over.y),
            color: pick(&self.color, &over.color),
            color_by: pick(&self.color_by, &over.color_by),
            marker: pick(&self.marker, &over.marker),
            marker_by: pick(&self.marker_by, &over.marker_by),
            line: pick(&self.line, &over.line),
            line_by: pick(&self.line_by, &over.line_by),
            label_by: pick(&self.label_by, &over.label_by),
            relabel,
            size: pick(&self.size, &over.size),
            width: pick(&self.width, &over.width),
            group_by,
            at: pick(&self.at, &over.at),
            legend: pick(&self.legend, &over.legend),
        }
    }

    /// Columns that split the data: `group_by` then every `*_by` column
    pub(crate) fn grouping_columns(&self) -> Vec<String> {
        let mut columns = self.group_by.clone();
        for column in [&self.color_by, &self.marker_by, &self.line_by, &self.label_by]
            .into_iter()
            .flatten()
        {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_override() {
        let context = Props::new().color("black").color_by("vowel").size(4.0);
        let element = Props::new().color("red").group_by("speaker");
        let merged = context.merge(&element);
        assert_eq!(merged.color.as_deref(), Some("red"));
        assert_eq!(merged.color_by.as_deref(), Some("vowel"));
        assert_eq!(merged.size, Some(4.0));
        assert_eq!(merged.group_by, vec!["speaker"]);
    }

    #[test]
    fn test_grouping_columns_deduplicated() {
        let props = Props::new()
            .group_by("vowel")
            .color_by("vowel")
            .marker_by("speaker");
        assert_eq!(props.grouping_columns(), vec!["vowel", "speaker"]);
    }

    #[test]
    fn test_deserialize_where() {
        let props: Props =
            serde_json::from_str(r#"{"where": "mean", "marker": "triangle-up"}"#).unwrap();
        assert_eq!(props.at, Some(Where::Mean));
        assert_eq!(props.marker, Some(MarkerShape::TriangleUp));
    }
}
