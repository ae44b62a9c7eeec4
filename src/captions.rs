//! Time-sliced caption lines for the narration.

/// Characters per caption line.
pub const WRAP_WIDTH: usize = 30;

pub const FONT_SIZE: u32 = 60;
pub const FONT_COLOR: &str = "yellow";
pub const BORDER_COLOR: &str = "black";
pub const BORDER_WIDTH: u32 = 3;
/// Vertical position of the caption baseline box in the 1920 px frame.
pub const CAPTION_Y: u32 = 1400;

#[derive(Debug, Clone, PartialEq)]
pub struct CaptionSegment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

impl CaptionSegment {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Text as rendered on screen.
    pub fn display_text(&self) -> String {
        self.text.to_uppercase()
    }
}

/// Wraps `text` into lines of at most [`WRAP_WIDTH`] columns and gives each
/// line an equal share of `total_duration`.
pub fn build_captions(text: &str, total_duration: f64) -> Vec<CaptionSegment> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut lines: Vec<String> = textwrap::wrap(&normalized, WRAP_WIDTH)
        .into_iter()
        .map(|line| line.into_owned())
        .collect();
    if lines.is_empty() {
        lines.push(String::new());
    }

    let count = lines.len();
    let per_line = total_duration / count as f64;

    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let start = i as f64 * per_line;
            // The last line takes whatever rounding left over.
            let duration = if i + 1 == count {
                total_duration - start
            } else {
                per_line
            };
            CaptionSegment {
                text: line,
                start,
                duration,
            }
        })
        .collect()
}
