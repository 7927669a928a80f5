use std::io::{self, Write};

const GLYPHS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Renders bar levels as a single redrawn line of block glyphs.
pub struct TerminalBars {
    columns: usize,
    line: String,
}

impl TerminalBars {
    pub fn new(columns: usize) -> Self {
        Self {
            columns: columns.max(1),
            line: String::with_capacity(columns * 3),
        }
    }

    /// Average `levels` down (or repeat them up) to the column count.
    pub fn render_line(&mut self, levels: &[f32]) -> &str {
        self.line.clear();
        if levels.is_empty() {
            return &self.line;
        }

        for column in 0..self.columns {
            let start = column * levels.len() / self.columns;
            let end = ((column + 1) * levels.len() / self.columns).max(start + 1);
            let slice = &levels[start..end.min(levels.len())];
            let level = slice.iter().sum::<f32>() / slice.len() as f32;

            let index = (level.clamp(0.0, 1.0) * (GLYPHS.len() - 1) as f32).round() as usize;
            self.line.push(GLYPHS[index]);
        }
        &self.line
    }

    pub fn draw(&mut self, levels: &[f32]) -> io::Result<()> {
        let line = self.render_line(levels);
        let mut stdout = io::stdout().lock();
        write!(stdout, "\r{}", line)?;
        stdout.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_down_to_columns() {
        let mut bars = TerminalBars::new(2);
        assert_eq!(bars.render_line(&[0.0, 0.0, 1.0, 1.0]), " █");
    }

    #[test]
    fn repeats_up_to_columns() {
        let mut bars = TerminalBars::new(4);
        assert_eq!(bars.render_line(&[0.5, 1.0]), "▄▄██");
    }

    #[test]
    fn empty_levels_render_nothing() {
        let mut bars = TerminalBars::new(10);
        assert_eq!(bars.render_line(&[]), "");
    }
}
