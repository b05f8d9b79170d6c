use crate::types::{Color, Pt, Size};

/// Recorded draw operations, top-left origin. The serializer flips y when it
/// emits content streams.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetFillColor(Color),
    SetStrokeColor(Color),
    SetLineWidth(Pt),
    SetFontName(String),
    SetFontSize(Pt),
    DrawString {
        x: Pt,
        y: Pt,
        text: String,
    },
    DrawLine {
        x1: Pt,
        y1: Pt,
        x2: Pt,
        y2: Pt,
    },
    DrawImage {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        resource_id: String,
    },
}

#[derive(Debug, Clone)]
pub struct Page {
    pub commands: Vec<Command>,
}

impl Page {
    fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub page_size: Size,
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone)]
struct GraphicsState {
    fill_color: Color,
    stroke_color: Color,
    line_width: Pt,
    font_name: String,
    font_size: Pt,
}

impl GraphicsState {
    fn page_default() -> Self {
        Self {
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            line_width: Pt::from_f32(1.0),
            font_name: crate::font::HELVETICA.to_string(),
            font_size: Pt::from_f32(12.0),
        }
    }
}

/// Append-only recording surface. State setters are deduplicated against the
/// current graphics state, which resets at every page boundary (content
/// streams are independent).
pub struct Canvas {
    page_size: Size,
    pages: Vec<Page>,
    current: Page,
    state: GraphicsState,
}

impl Canvas {
    pub fn new(page_size: Size) -> Self {
        Self {
            page_size,
            pages: Vec::new(),
            current: Page::new(),
            state: GraphicsState::page_default(),
        }
    }

    pub fn page_size(&self) -> Size {
        self.page_size
    }

    /// Pages already closed by `show_page`; the page under the cursor is not
    /// counted.
    pub fn completed_pages(&self) -> usize {
        self.pages.len()
    }

    pub fn is_current_empty(&self) -> bool {
        self.current.commands.is_empty()
    }

    pub fn set_fill_color(&mut self, color: Color) {
        if self.state.fill_color == color {
            return;
        }
        self.state.fill_color = color;
        self.current.commands.push(Command::SetFillColor(color));
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        if self.state.stroke_color == color {
            return;
        }
        self.state.stroke_color = color;
        self.current.commands.push(Command::SetStrokeColor(color));
    }

    pub fn set_line_width(&mut self, width: Pt) {
        let width = if width < Pt::ZERO { Pt::ZERO } else { width };
        if self.state.line_width == width {
            return;
        }
        self.state.line_width = width;
        self.current.commands.push(Command::SetLineWidth(width));
    }

    pub fn set_font_name(&mut self, name: &str) {
        if self.state.font_name == name {
            return;
        }
        self.state.font_name = name.to_string();
        self.current
            .commands
            .push(Command::SetFontName(self.state.font_name.clone()));
    }

    pub fn set_font_size(&mut self, size: Pt) {
        if self.state.font_size == size {
            return;
        }
        self.state.font_size = size;
        self.current.commands.push(Command::SetFontSize(size));
    }

    pub fn draw_string(&mut self, x: Pt, y: Pt, text: impl Into<String>) {
        self.current.commands.push(Command::DrawString {
            x,
            y,
            text: text.into(),
        });
    }

    pub fn draw_line(&mut self, x1: Pt, y1: Pt, x2: Pt, y2: Pt) {
        self.current.commands.push(Command::DrawLine { x1, y1, x2, y2 });
    }

    pub fn draw_image(
        &mut self,
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        resource_id: impl Into<String>,
    ) {
        self.current.commands.push(Command::DrawImage {
            x,
            y,
            width,
            height,
            resource_id: resource_id.into(),
        });
    }

    pub fn show_page(&mut self) {
        let current = std::mem::replace(&mut self.current, Page::new());
        self.pages.push(current);
        self.state = GraphicsState::page_default();
    }

    /// Clone of the accumulated document including the in-progress page.
    /// Serialization works on the snapshot, so finalizing never consumes the
    /// canvas and may be repeated.
    pub fn snapshot(&self) -> Document {
        let mut pages = self.pages.clone();
        if !self.current.commands.is_empty() || pages.is_empty() {
            pages.push(self.current.clone());
        }
        Document {
            page_size: self.page_size,
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_setters_dedupe_repeats() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_fill_color(Color::GRAY);
        canvas.set_fill_color(Color::GRAY);
        canvas.set_font_size(Pt::from_f32(11.0));
        canvas.set_font_size(Pt::from_f32(11.0));
        canvas.draw_string(Pt::ZERO, Pt::ZERO, "x");
        let doc = canvas.snapshot();
        let setters = doc.pages[0]
            .commands
            .iter()
            .filter(|c| {
                matches!(c, Command::SetFillColor(_) | Command::SetFontSize(_))
            })
            .count();
        assert_eq!(setters, 2);
    }

    #[test]
    fn show_page_resets_graphics_state() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_font_name(crate::font::HELVETICA_BOLD);
        canvas.show_page();
        // Same name again must be re-recorded on the fresh page.
        canvas.set_font_name(crate::font::HELVETICA_BOLD);
        canvas.draw_string(Pt::ZERO, Pt::ZERO, "x");
        let doc = canvas.snapshot();
        assert_eq!(doc.pages.len(), 2);
        assert!(
            doc.pages[1]
                .commands
                .iter()
                .any(|c| matches!(c, Command::SetFontName(n) if n == crate::font::HELVETICA_BOLD))
        );
    }

    #[test]
    fn snapshot_includes_in_progress_page_and_repeats() {
        let mut canvas = Canvas::new(Size::letter());
        canvas.draw_string(Pt::ZERO, Pt::ZERO, "hola");
        let first = canvas.snapshot();
        let second = canvas.snapshot();
        assert_eq!(first.pages.len(), 1);
        assert_eq!(second.pages.len(), 1);
        assert_eq!(first.pages[0].commands, second.pages[0].commands);
    }

    #[test]
    fn empty_canvas_snapshots_single_blank_page() {
        let canvas = Canvas::new(Size::a4());
        let doc = canvas.snapshot();
        assert_eq!(doc.pages.len(), 1);
        assert!(doc.pages[0].commands.is_empty());
    }
}
