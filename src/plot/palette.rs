//! Cyclic categorical palette (matplotlib `tab10`).

use plotters::style::RGBColor;

pub const TAB10: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// Color for series `index`; wraps after ten series.
pub fn series_color(index: usize) -> RGBColor {
    TAB10[index % TAB10.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_cycles() {
        assert_eq!(series_color(0), TAB10[0]);
        assert_eq!(series_color(9), TAB10[9]);
        assert_eq!(series_color(10), series_color(0));
        assert_eq!(series_color(23), series_color(3));
    }
}
