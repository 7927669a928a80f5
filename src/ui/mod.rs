//! Presentation helpers. `BarLayout` and `BarHeights` turn level vectors into
//! pixel geometry for a graphical renderer (the dump tool reports it too);
//! `TerminalBars` is the sink the live binary draws with.

pub mod terminal;

pub use terminal::TerminalBars;

use crate::config::VisualizerConfig;

/// Bar geometry for a bottom-aligned row of equally spaced bars.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarLayout {
    pub bar_count: usize,
    pub spacing: f32,
    pub min_bar_width: f32,
    pub min_bar_height: f32,
    pub height_margin: f32,
}

impl BarLayout {
    pub fn from_config(config: &VisualizerConfig) -> Self {
        Self {
            bar_count: config.bar_count,
            spacing: config.bar_spacing,
            min_bar_width: config.min_bar_width,
            min_bar_height: config.min_bar_height,
            height_margin: config.height_margin,
        }
    }

    pub fn bar_width(&self, canvas_width: f32) -> f32 {
        let n = self.bar_count.max(1) as f32;
        let fitted = (canvas_width - self.spacing * (n - 1.0)) / n;
        fitted.max(self.min_bar_width)
    }

    /// Left edge of bar `index`.
    pub fn bar_x(&self, index: usize, canvas_width: f32) -> f32 {
        index as f32 * (self.bar_width(canvas_width) + self.spacing)
    }

    /// Pixel height for a normalized level; never below the minimum bar height.
    pub fn target_height(&self, level: f32, canvas_height: f32) -> f32 {
        (level * (canvas_height - self.height_margin)).max(self.min_bar_height)
    }
}

/// One bar's animation endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarAnimation {
    pub from: f32,
    pub to: f32,
}

/// Last emitted height per bar, so a renderer can animate from it.
pub struct BarHeights {
    layout: BarLayout,
    previous: Vec<f32>,
}

impl BarHeights {
    pub fn new(layout: BarLayout) -> Self {
        Self {
            previous: vec![0.0; layout.bar_count],
            layout,
        }
    }

    pub fn previous(&self) -> &[f32] {
        &self.previous
    }

    /// Compute new targets from `levels` and record them as the previous heights.
    pub fn update(&mut self, levels: &[f32], canvas_height: f32) -> Vec<BarAnimation> {
        levels
            .iter()
            .zip(self.previous.iter_mut())
            .map(|(&level, previous)| {
                let to = self.layout.target_height(level, canvas_height);
                let animation = BarAnimation { from: *previous, to };
                *previous = to;
                animation
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> BarLayout {
        BarLayout::from_config(&VisualizerConfig::default())
    }

    #[test]
    fn bar_width_fills_canvas_or_hits_minimum() {
        let layout = BarLayout {
            bar_count: 4,
            ..layout()
        };
        // (118 - 6 * 3) / 4 = 25
        assert_eq!(layout.bar_width(118.0), 25.0);
        assert_eq!(layout.bar_x(2, 118.0), 62.0);

        // 200 bars never fit in 800 px, so the minimum applies
        assert_eq!(self::layout().bar_width(800.0), 6.0);
    }

    #[test]
    fn target_height_respects_margin_and_minimum() {
        let layout = layout();
        assert_eq!(layout.target_height(1.0, 200.0), 180.0);
        assert_eq!(layout.target_height(0.5, 200.0), 90.0);
        assert_eq!(layout.target_height(0.0, 200.0), 10.0);
    }

    #[test]
    fn heights_animate_from_previous_target() {
        let mut heights = BarHeights::new(BarLayout {
            bar_count: 2,
            ..layout()
        });

        let first = heights.update(&[1.0, 0.0], 120.0);
        assert_eq!(first[0], BarAnimation { from: 0.0, to: 100.0 });
        assert_eq!(first[1], BarAnimation { from: 0.0, to: 10.0 });

        let second = heights.update(&[0.5, 0.5], 120.0);
        assert_eq!(second[0], BarAnimation { from: 100.0, to: 50.0 });
        assert_eq!(heights.previous(), &[50.0, 50.0]);
    }
}
