//! Plot configuration shared by the plotting functions

use plotters::prelude::*;

/// Size, labels and colours of a plot
///
/// ```rust,ignore
/// use biosim_rs::output::visualization::PlotConfig;
/// use plotters::prelude::*;
///
/// let mut config = PlotConfig::time_series("Toggle switch");
/// config.species_colors = Some(vec![RED, BLUE]);
/// config.width = 1920;
/// ```
#[derive(Clone)]
pub struct PlotConfig {
    /// Image width in pixels (default: 1024)
    pub width: u32,

    /// Image height in pixels (default: 768)
    pub height: u32,

    pub title: String,

    pub xlabel: String,

    pub ylabel: String,

    /// Colour of single-line plots (default: RED)
    pub line_color: RGBColor,

    /// One colour per series; the default palette is used when `None`
    pub species_colors: Option<Vec<RGBColor>>,

    pub background: RGBColor,

    /// Line width in pixels (default: 2)
    pub line_width: u32,

    pub show_grid: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            title: "Plot".to_string(),
            xlabel: String::new(),
            ylabel: "Value".to_string(),
            line_color: RED,
            species_colors: None,
            background: WHITE,
            line_width: 2,
            show_grid: true,
        }
    }
}

/// Accepts `&str`, `String` or `None` as an optional title
pub trait IntoOptionalTitle {
    fn into_optional_title(self) -> Option<String>;
}

impl IntoOptionalTitle for &str {
    fn into_optional_title(self) -> Option<String> {
        Some(self.to_string())
    }
}

impl IntoOptionalTitle for String {
    fn into_optional_title(self) -> Option<String> {
        Some(self)
    }
}

impl<T: IntoOptionalTitle> IntoOptionalTitle for Option<T> {
    fn into_optional_title(self) -> Option<String> {
        self.and_then(|t| t.into_optional_title())
    }
}

/// Use the default title of a plot kind
pub const NO_TITLE: Option<&str> = None;

impl PlotConfig {
    /// Values against time, "Time" on the x axis
    pub fn time_series(title: impl IntoOptionalTitle) -> Self {
        Self {
            xlabel: "Time".to_string(),
            title: title.into_optional_title().unwrap_or_else(|| "Time Series".to_string()),
            ..Self::default()
        }
    }

    /// Depth-time heatmaps of eDNA concentration
    pub fn depth_time(title: impl IntoOptionalTitle) -> Self {
        Self {
            width: 1200,
            height: 600,
            xlabel: "Time (day)".to_string(),
            ylabel: "Depth (m)".to_string(),
            title: title.into_optional_title().unwrap_or_else(|| "eDNA Concentration".to_string()),
            ..Self::default()
        }
    }

    /// S/I/R/D counts against days, in the usual compartment colours
    pub fn epidemic(title: impl IntoOptionalTitle) -> Self {
        Self {
            xlabel: "Time (days)".to_string(),
            ylabel: "Population".to_string(),
            title: title.into_optional_title().unwrap_or_else(|| "Epidemic Curve".to_string()),
            species_colors: Some(vec![BLUE, RED, GREEN, BLACK]),
            ..Self::default()
        }
    }

    pub fn multi_species_colors(colors: Vec<RGBColor>) -> Self {
        Self {
            species_colors: Some(colors),
            ..Self::default()
        }
    }

    /// Colour of series `index`, custom colours first, then the default palette
    pub(crate) fn get_species_color(&self, index: usize) -> RGBColor {
        if let Some(color) = self.species_colors.as_ref().and_then(|colors| colors.get(index)) {
            return *color;
        }

        let palette = [
            RED,
            BLUE,
            GREEN,
            MAGENTA,
            CYAN,
            BLACK,
            RGBColor(255, 165, 0),
            RGBColor(128, 0, 128),
            RGBColor(255, 192, 203),
            RGBColor(165, 42, 42),
        ];
        palette[index % palette.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plot_config_default() {
        let config = PlotConfig::default();
        assert_eq!(config.width, 1024);
        assert_eq!(config.height, 768);
        assert!(config.show_grid);
    }

    #[test]
    fn test_titles() {
        assert_eq!(PlotConfig::time_series(NO_TITLE).title, "Time Series");
        assert_eq!(PlotConfig::time_series("Euler vs RK4").title, "Euler vs RK4");
        assert_eq!(PlotConfig::depth_time(format!("Season: {}", "Winter")).title, "Season: Winter");
        assert_eq!(PlotConfig::depth_time(NO_TITLE).ylabel, "Depth (m)");
    }

    #[test]
    fn test_species_colors() {
        let config = PlotConfig::default();
        assert_eq!(config.get_species_color(0), RED);
        assert_eq!(config.get_species_color(10), RED);

        let epidemic = PlotConfig::epidemic(NO_TITLE);
        assert_eq!(epidemic.get_species_color(0), BLUE);
        assert_eq!(epidemic.get_species_color(3), BLACK);
        // Past the custom list the palette takes over
        assert_eq!(epidemic.get_species_color(4), CYAN);
    }
}
