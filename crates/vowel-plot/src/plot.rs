//! Vowel plot composition
//!
//! A plot exists only inside the closure passed to [`vowel_plot`]. Elements
//! drawn in the closure share the plot's context: property layers pushed by
//! [`VowelPlot::with_context`] apply to every element drawn inside it, and
//! element properties win over context properties.

use crate::element::PlotElement;
use crate::error::{PlotError, Result};
use crate::geometry::{confidence_ellipse, median, Bounds, EllipseSize};
use crate::mapper::{color_mapper, line_mapper, marker_mapper, Mapper};
use crate::props::{LineStyle, MarkerShape, Props, Where};
use formant_stats::mean;
use formant_table::FormantTable;
use plotly::common::{Font, Line, Marker, Mode};
use plotly::layout::{Annotation, Axis, Layout};
use plotly::{Plot, Scatter};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Figure-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotSettings {
    /// Column on the x axis
    pub x: String,
    /// Column on the y axis
    pub y: String,
    pub x_title: Option<String>,
    pub y_title: Option<String>,
    pub title: Option<String>,
    /// Highest values at the left and bottom, as in a vowel chart
    pub invert_axes: bool,
    /// Share of the data range added on each side of an axis
    pub padding: f64,
    pub width: Option<usize>,
    pub height: Option<usize>,
    pub legend: bool,
    /// Colour cycle; empty means the default palette
    pub palette: Vec<String>,
    /// Marker cycle; empty means the default cycle
    pub markers: Vec<MarkerShape>,
    pub marker_size: f64,
    pub font_size: f64,
    pub line_width: f64,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            x: "f2".to_string(),
            y: "f1".to_string(),
            x_title: None,
            y_title: None,
            title: None,
            invert_axes: true,
            padding: 0.05,
            width: None,
            height: None,
            legend: true,
            palette: Vec::new(),
            markers: Vec::new(),
            marker_size: 8.0,
            font_size: 14.0,
            line_width: 1.5,
        }
    }
}

/// A finished plot
pub struct Figure {
    plot: Plot,
    elements: usize,
    traces: usize,
    annotations: usize,
}

impl fmt::Debug for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Figure")
            .field("elements", &self.elements)
            .field("traces", &self.traces)
            .field("annotations", &self.annotations)
            .finish_non_exhaustive()
    }
}

impl Figure {
    /// Standalone HTML page
    pub fn to_html(&self) -> String {
        self.plot.to_html()
    }

    /// Plotly JSON document
    pub fn to_json(&self) -> String {
        self.plot.to_json()
    }

    /// Write the HTML page to `path`
    pub fn write_html(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_html())?;
        info!("Wrote vowel plot to {}", path.display());
        Ok(())
    }

    /// Number of elements drawn
    pub fn element_count(&self) -> usize {
        self.elements
    }

    /// Number of plotly traces
    pub fn trace_count(&self) -> usize {
        self.traces
    }

    /// Number of arrow annotations
    pub fn annotation_count(&self) -> usize {
        self.annotations
    }

    pub fn plot(&self) -> &Plot {
        &self.plot
    }
}

/// Compose a vowel plot of `table`.
///
/// The closure draws elements; the figure is returned only if it succeeds.
pub fn vowel_plot<F>(table: &FormantTable, settings: PlotSettings, draw: F) -> Result<Figure>
where
    F: FnOnce(&mut VowelPlot<'_>) -> Result<()>,
{
    let mut plot = VowelPlot::new(table, settings);
    draw(&mut plot)?;
    Ok(plot.finish())
}

/// Compose a vowel plot from declarative elements
pub fn plot_elements(
    table: &FormantTable,
    settings: PlotSettings,
    elements: &[PlotElement],
) -> Result<Figure> {
    vowel_plot(table, settings, |plot| {
        for element in elements {
            plot.draw(element)?;
        }
        Ok(())
    })
}

/// Rows sharing the values of the grouping columns
struct Series {
    values: BTreeMap<String, String>,
    name: String,
    rows: Vec<usize>,
}

struct Style {
    color: String,
    marker: MarkerShape,
    line: LineStyle,
    size: f64,
    width: f64,
}

fn finite_points(x: &[f64], y: &[f64], rows: &[usize]) -> (Vec<f64>, Vec<f64>) {
    rows.iter()
        .map(|&r| (x[r], y[r]))
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .unzip()
}

fn aggregate(values: &[f64], at: Where) -> f64 {
    match at {
        Where::Median => median(values),
        Where::All | Where::Mean => mean(values),
    }
}

/// Positions of a group: every row, or one aggregate point
fn positions(x: &[f64], y: &[f64], rows: &[usize], at: Where) -> (Vec<f64>, Vec<f64>) {
    let (px, py) = finite_points(x, y, rows);
    if at == Where::All || px.is_empty() {
        return (px, py);
    }
    (vec![aggregate(&px, at)], vec![aggregate(&py, at)])
}

/// Plot under construction
pub struct VowelPlot<'a> {
    table: &'a FormantTable,
    settings: PlotSettings,
    context: Vec<Props>,
    plot: Plot,
    annotations: Vec<Annotation>,
    colors: BTreeMap<String, Mapper<String>>,
    markers: BTreeMap<String, Mapper<MarkerShape>>,
    lines: BTreeMap<String, Mapper<LineStyle>>,
    legend_entries: BTreeSet<String>,
    bounds: Bounds,
    legend: bool,
    elements: usize,
    traces: usize,
}

impl<'a> VowelPlot<'a> {
    fn new(table: &'a FormantTable, settings: PlotSettings) -> Self {
        let legend = settings.legend;
        Self {
            table,
            settings,
            context: Vec::new(),
            plot: Plot::new(),
            annotations: Vec::new(),
            colors: BTreeMap::new(),
            markers: BTreeMap::new(),
            lines: BTreeMap::new(),
            legend_entries: BTreeSet::new(),
            bounds: Bounds::default(),
            legend,
            elements: 0,
            traces: 0,
        }
    }

    /// Draw inside a context layer; the layer is removed afterwards
    pub fn with_context<F>(&mut self, props: Props, draw: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.context.push(props);
        let result = draw(self);
        self.context.pop();
        result
    }

    /// Context layers merged, then `props` on top
    fn resolve(&self, props: &Props) -> Props {
        self.context
            .iter()
            .fold(Props::default(), |acc, layer| acc.merge(layer))
            .merge(props)
    }

    fn coordinates(&self, props: &Props) -> Result<(&'a [f64], &'a [f64])> {
        let table = self.table;
        let x = props.x.as_deref().unwrap_or(&self.settings.x);
        let y = props.y.as_deref().unwrap_or(&self.settings.y);
        Ok((table.numeric(x)?, table.numeric(y)?))
    }

    fn series(&self, columns: &[String]) -> Result<Vec<Series>> {
        let groups = self.table.group_by(columns)?;
        Ok(groups
            .into_iter()
            .map(|group| Series {
                values: columns.iter().cloned().zip(group.key.iter().cloned()).collect(),
                name: group.key.join(" "),
                rows: group.rows,
            })
            .collect())
    }

    fn style(&mut self, props: &Props, series: &Series) -> Style {
        let value = |column: &Option<String>| {
            column
                .as_ref()
                .and_then(|c| series.values.get(c).map(|v| (c.clone(), v.clone())))
        };

        let color = value(&props.color_by)
            .and_then(|(column, v)| {
                self.colors
                    .entry(column)
                    .or_insert_with(|| color_mapper(&self.settings.palette))
                    .get(&v)
            })
            .or_else(|| props.color.clone())
            .unwrap_or_else(|| "black".to_string());
        let marker = value(&props.marker_by)
            .and_then(|(column, v)| {
                self.markers
                    .entry(column)
                    .or_insert_with(|| marker_mapper(&self.settings.markers))
                    .get(&v)
            })
            .or(props.marker)
            .unwrap_or(MarkerShape::Circle);
        let line = value(&props.line_by)
            .and_then(|(column, v)| self.lines.entry(column).or_insert_with(line_mapper).get(&v))
            .or(props.line)
            .unwrap_or(LineStyle::Solid);

        Style {
            color,
            marker,
            line,
            size: props.size.unwrap_or(self.settings.marker_size),
            width: props.width.unwrap_or(self.settings.line_width),
        }
    }

    /// Whether a trace gets a legend entry; each name appears once
    fn show_in_legend(&mut self, props: &Props, name: &str) -> bool {
        if !props.legend.unwrap_or(true) || name.is_empty() {
            return false;
        }
        self.legend_entries.insert(name.to_string())
    }

    fn add_trace(&mut self, trace: Box<Scatter<f64, f64>>, x: &[f64], y: &[f64]) {
        self.bounds.update(x, y);
        self.plot.add_trace(trace);
        self.traces += 1;
    }

    fn line_trace(&mut self, props: &Props, series: &Series, x: Vec<f64>, y: Vec<f64>) {
        let style = self.style(props, series);
        let show = self.show_in_legend(props, &series.name);
        let trace = Scatter::new(x.clone(), y.clone())
            .mode(Mode::Lines)
            .name(series.name.as_str())
            .legend_group(series.name.as_str())
            .show_legend(show)
            .line(
                Line::new()
                    .color(style.color)
                    .width(style.width)
                    .dash(style.line.dash()),
            );
        self.add_trace(trace, &x, &y);
    }

    /// Scatter markers, one trace per group
    pub fn markers(&mut self, props: Props) -> Result<&mut Self> {
        let props = self.resolve(&props);
        let (x, y) = self.coordinates(&props)?;
        let at = props.at.unwrap_or_default();
        for series in self.series(&props.grouping_columns())? {
            let (px, py) = positions(x, y, &series.rows, at);
            if px.is_empty() {
                continue;
            }
            let style = self.style(&props, &series);
            let show = self.show_in_legend(&props, &series.name);
            let trace = Scatter::new(px.clone(), py.clone())
                .mode(Mode::Markers)
                .name(series.name.as_str())
                .legend_group(series.name.as_str())
                .show_legend(show)
                .marker(
                    Marker::new()
                        .color(style.color)
                        .size(style.size.round().max(1.0) as usize)
                        .symbol(style.marker.symbol()),
                );
            self.add_trace(trace, &px, &py);
        }
        self.elements += 1;
        Ok(self)
    }

    /// Text labels from the `label_by` column at token or group positions
    pub fn labels(&mut self, props: Props) -> Result<&mut Self> {
        let props = self.resolve(&props);
        let label_column = props.label_by.clone().ok_or_else(|| {
            PlotError::InvalidParameter("labels need a label_by column".to_string())
        })?;
        let (x, y) = self.coordinates(&props)?;
        let at = props.at.unwrap_or_default();
        for series in self.series(&props.grouping_columns())? {
            let (px, py) = positions(x, y, &series.rows, at);
            if px.is_empty() {
                continue;
            }
            let raw = series.values.get(&label_column).cloned().unwrap_or_default();
            let text = props.relabel.get(&raw).cloned().unwrap_or(raw);
            let style = self.style(&props, &series);
            let font_size = props.size.unwrap_or(self.settings.font_size);
            let trace = Scatter::new(px.clone(), py.clone())
                .mode(Mode::Text)
                .name(text.as_str())
                .legend_group(series.name.as_str())
                .show_legend(false)
                .text_array(vec![text.clone(); px.len()])
                .text_font(
                    Font::new()
                        .color(style.color)
                        .size(font_size.round().max(1.0) as usize),
                );
            self.add_trace(trace, &px, &py);
        }
        self.elements += 1;
        Ok(self)
    }

    /// Confidence ellipse per group; groups of fewer than three points are
    /// skipped
    pub fn ellipses(&mut self, size: EllipseSize, props: Props) -> Result<&mut Self> {
        let scale = size.scale()?;
        let props = self.resolve(&props);
        let (x, y) = self.coordinates(&props)?;
        for series in self.series(&props.grouping_columns())? {
            let (px, py) = finite_points(x, y, &series.rows);
            let Some(ellipse) = confidence_ellipse(&px, &py, scale)? else {
                warn!(
                    "Skipping ellipse for '{}': {} points",
                    series.name,
                    px.len()
                );
                continue;
            };
            debug!("Ellipse for '{}': {:?}", series.name, ellipse);
            let (ex, ey) = ellipse.outline();
            self.line_trace(&props, &series, ex, ey);
        }
        self.elements += 1;
        Ok(self)
    }

    /// Closed polygon through the group means of `column`, visiting
    /// `vertices` in order. Other grouping columns give one polygon each.
    pub fn polygon<S: AsRef<str>>(
        &mut self,
        column: &str,
        vertices: &[S],
        props: Props,
    ) -> Result<&mut Self> {
        if vertices.len() < 2 {
            return Err(PlotError::InvalidParameter(
                "a polygon needs at least two vertices".to_string(),
            ));
        }
        let props = self.resolve(&props);
        let (x, y) = self.coordinates(&props)?;
        let labels = self.table.labels(column)?;
        let at = match props.at.unwrap_or(Where::Mean) {
            Where::All => Where::Mean,
            other => other,
        };
        let mut columns = props.grouping_columns();
        columns.retain(|c| c != column);

        for series in self.series(&columns)? {
            let mut px = Vec::with_capacity(vertices.len() + 1);
            let mut py = Vec::with_capacity(vertices.len() + 1);
            for vertex in vertices {
                let vertex = vertex.as_ref();
                let rows: Vec<usize> = series
                    .rows
                    .iter()
                    .copied()
                    .filter(|&r| labels[r] == vertex)
                    .collect();
                let (vx, vy) = positions(x, y, &rows, at);
                if vx.is_empty() {
                    return Err(PlotError::MissingGroup {
                        column: column.to_string(),
                        value: vertex.to_string(),
                    });
                }
                px.push(vx[0]);
                py.push(vy[0]);
            }
            px.push(px[0]);
            py.push(py[0]);
            self.line_trace(&props, &series, px, py);
        }
        self.elements += 1;
        Ok(self)
    }

    /// Arrows from the plot columns to (`x_end`, `y_end`): one per row, or
    /// one per group between the aggregated start and end points
    pub fn arrows(&mut self, x_end: &str, y_end: &str, props: Props) -> Result<&mut Self> {
        let props = self.resolve(&props);
        let (x, y) = self.coordinates(&props)?;
        let (ex, ey) = (self.table.numeric(x_end)?, self.table.numeric(y_end)?);
        let at = props.at.unwrap_or_default();
        for series in self.series(&props.grouping_columns())? {
            let rows: Vec<usize> = series
                .rows
                .iter()
                .copied()
                .filter(|&r| [x[r], y[r], ex[r], ey[r]].iter().all(|v| v.is_finite()))
                .collect();
            if rows.is_empty() {
                continue;
            }
            let pick = |values: &[f64]| -> Vec<f64> { rows.iter().map(|&r| values[r]).collect() };
            let (x0, y0, x1, y1) = (pick(x), pick(y), pick(ex), pick(ey));
            let arrows: Vec<(f64, f64, f64, f64)> = if at == Where::All {
                (0..rows.len()).map(|i| (x0[i], y0[i], x1[i], y1[i])).collect()
            } else {
                vec![(
                    aggregate(&x0, at),
                    aggregate(&y0, at),
                    aggregate(&x1, at),
                    aggregate(&y1, at),
                )]
            };
            let style = self.style(&props, &series);
            for (ax, ay, hx, hy) in arrows {
                self.bounds.update(&[ax, hx], &[ay, hy]);
                self.annotations.push(
                    Annotation::new()
                        .x(hx)
                        .y(hy)
                        .ax(ax)
                        .ay(ay)
                        .x_ref("x")
                        .y_ref("y")
                        .ax_ref("x")
                        .ay_ref("y")
                        .text("")
                        .show_arrow(true)
                        .arrow_head(2)
                        .arrow_width(style.width)
                        .arrow_color(style.color.clone()),
                );
            }
        }
        self.elements += 1;
        Ok(self)
    }

    /// Show or hide the legend
    pub fn legend(&mut self, show: bool) -> &mut Self {
        self.legend = show;
        self
    }

    /// Draw a declarative element
    pub fn draw(&mut self, element: &PlotElement) -> Result<&mut Self> {
        match element {
            PlotElement::Markers { props } => self.markers(props.clone()),
            PlotElement::Labels { props } => self.labels(props.clone()),
            PlotElement::Ellipses { size, props } => self.ellipses(*size, props.clone()),
            PlotElement::Polygon {
                column,
                vertices,
                props,
            } => self.polygon(column, vertices, props.clone()),
            PlotElement::Arrows {
                x_end,
                y_end,
                props,
            } => self.arrows(x_end, y_end, props.clone()),
            PlotElement::Legend { show } => Ok(self.legend(*show)),
        }
    }

    fn axis(&self, title: String, range: Option<(f64, f64)>) -> Axis {
        let axis = Axis::new().title(title);
        match range {
            Some((lo, hi)) if self.settings.invert_axes => axis.range(vec![hi, lo]),
            Some((lo, hi)) => axis.range(vec![lo, hi]),
            None => axis,
        }
    }

    fn finish(mut self) -> Figure {
        let settings = &self.settings;
        let x_title = settings.x_title.clone().unwrap_or_else(|| settings.x.clone());
        let y_title = settings.y_title.clone().unwrap_or_else(|| settings.y.clone());
        let x_axis = self.axis(x_title, self.bounds.x_range(settings.padding));
        let y_axis = self.axis(y_title, self.bounds.y_range(settings.padding));

        let mut layout = Layout::new()
            .show_legend(self.legend)
            .x_axis(x_axis)
            .y_axis(y_axis);
        if let Some(title) = &settings.title {
            layout = layout.title(title.as_str());
        }
        if let Some(width) = settings.width {
            layout = layout.width(width);
        }
        if let Some(height) = settings.height {
            layout = layout.height(height);
        }
        let annotations = self.annotations.len();
        for annotation in self.annotations.drain(..) {
            layout.add_annotation(annotation);
        }
        self.plot.set_layout(layout);

        debug!(
            "Vowel plot finished: {} elements, {} traces, {} arrows",
            self.elements, self.traces, annotations
        );
        Figure {
            plot: self.plot,
            elements: self.elements,
            traces: self.traces,
            annotations,
        }
    }
}
