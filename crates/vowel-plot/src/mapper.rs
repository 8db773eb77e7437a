//! Category to property mapping

use crate::props::{LineStyle, MarkerShape};
use std::collections::HashMap;

/// Default colour cycle
pub const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Maps category values to property values by the order in which the
/// categories are first seen
#[derive(Debug, Clone)]
pub struct Mapper<T> {
    values: Vec<T>,
    cycle: bool,
    default: Option<T>,
    index: HashMap<String, usize>,
}

impl<T: Clone> Mapper<T> {
    /// Cycling mapper over `values`
    pub fn new(values: Vec<T>) -> Self {
        Self {
            values,
            cycle: true,
            default: None,
            index: HashMap::new(),
        }
    }

    /// Whether categories past the end of the value list wrap around
    pub fn cycle(mut self, cycle: bool) -> Self {
        self.cycle = cycle;
        self
    }

    /// Value for categories without one of their own
    pub fn with_default(mut self, default: T) -> Self {
        self.default = Some(default);
        self
    }

    /// Property value for a category
    pub fn get(&mut self, category: &str) -> Option<T> {
        let next = self.index.len();
        let index = *self.index.entry(category.to_string()).or_insert(next);
        self.value_at(index)
    }

    /// Property value for the `index`-th category
    pub fn value_at(&self, index: usize) -> Option<T> {
        if self.values.is_empty() {
            return self.default.clone();
        }
        let index = if self.cycle {
            index % self.values.len()
        } else {
            index
        };
        self.values
            .get(index)
            .cloned()
            .or_else(|| self.default.clone())
    }

    /// Number of categories seen so far
    pub fn seen(&self) -> usize {
        self.index.len()
    }
}

pub(crate) fn color_mapper(palette: &[String]) -> Mapper<String> {
    let values = if palette.is_empty() {
        PALETTE.iter().map(|c| c.to_string()).collect()
    } else {
        palette.to_vec()
    };
    Mapper::new(values)
}

pub(crate) fn marker_mapper(markers: &[MarkerShape]) -> Mapper<MarkerShape> {
    let values = if markers.is_empty() {
        MarkerShape::CYCLE.to_vec()
    } else {
        markers.to_vec()
    };
    Mapper::new(values)
}

pub(crate) fn line_mapper() -> Mapper<LineStyle> {
    Mapper::new(LineStyle::CYCLE.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seen_order() {
        let mut mapper = Mapper::new(vec!["red", "green"]);
        assert_eq!(mapper.get("u"), Some("red"));
        assert_eq!(mapper.get("i"), Some("green"));
        assert_eq!(mapper.get("u"), Some("red"));
        assert_eq!(mapper.get("a"), Some("red"));
        assert_eq!(mapper.seen(), 3);
    }

    #[test]
    fn test_no_cycle_falls_back_to_default() {
        let mut mapper = Mapper::new(vec![1, 2]).cycle(false).with_default(0);
        mapper.get("a");
        mapper.get("b");
        assert_eq!(mapper.get("c"), Some(0));
        let mut bare: Mapper<i32> = Mapper::new(Vec::new());
        assert_eq!(bare.get("a"), None);
    }

    #[test]
    fn test_default_palette() {
        let mut colors = color_mapper(&[]);
        assert_eq!(colors.get("x").as_deref(), Some(PALETTE[0]));
        let mut markers = marker_mapper(&[]);
        assert_eq!(markers.get("x"), Some(MarkerShape::Circle));
    }
}
