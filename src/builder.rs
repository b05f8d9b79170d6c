use crate::canvas::Canvas;
use crate::debug::{DebugLogger, json_escape};
use crate::error::{Error, Result};
use crate::font;
use crate::image::{ImageRegistry, decode_image_source};
use crate::pdf;
use crate::types::{Color, Margins, Orientation, PaperFormat, Pt, Size};
use base64::Engine;
use std::path::PathBuf;

/// Drawn in place of an image whose payload could not be decoded.
pub const IMAGE_PLACEHOLDER: &str = "[ERROR AL PROCESAR IMAGEN]";
/// Drawn in place of a missing or undecodable signature.
pub const SIGNATURE_PLACEHOLDER: &str = "[SIN FIRMA]";

/// Page geometry and layout knobs, resolved once at `DocumentBuilder::new`.
/// Defaults mirror the service paperwork this crate renders: A4 portrait,
/// 20 mm margins, 7 mm line height, 11 pt body text.
#[derive(Debug, Clone)]
pub struct DocumentOptions {
    orientation: Orientation,
    paper: PaperFormat,
    margins: Margins,
    line_height: Pt,
    body_font_size: Pt,
    debug_log_path: Option<PathBuf>,
    fixed_footer_timestamp: Option<String>,
}

impl DocumentOptions {
    pub fn new(orientation: Orientation, paper: PaperFormat) -> Self {
        Self {
            orientation,
            paper,
            margins: Margins::all(Pt::from_mm(20.0)),
            line_height: Pt::from_mm(7.0),
            body_font_size: Pt::from_f32(11.0),
            debug_log_path: None,
            fixed_footer_timestamp: None,
        }
    }

    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    /// Vertical advance per text line and table row. Deliberately independent
    /// of font size so mixed-size sections stay on one grid.
    pub fn with_line_height(mut self, line_height: Pt) -> Self {
        self.line_height = line_height;
        self
    }

    pub fn with_body_font_size(mut self, size: Pt) -> Self {
        self.body_font_size = size;
        self
    }

    /// Enables the JSON-lines diagnostics log at `path`.
    pub fn with_debug_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_log_path = Some(path.into());
        self
    }

    /// Replaces the footer's generation timestamp with a fixed string so the
    /// emitted bytes are identical across runs.
    pub fn with_fixed_footer_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.fixed_footer_timestamp = Some(timestamp.into());
        self
    }
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self::new(Orientation::Portrait, PaperFormat::A4)
    }
}

/// Per-call styling for `add_text`. `size: None` uses the body font size.
#[derive(Debug, Clone, Copy)]
pub struct TextOptions {
    pub bold: bool,
    pub size: Option<Pt>,
    pub indent: Pt,
}

impl TextOptions {
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Self::default()
        }
    }

    pub fn with_size(mut self, size: Pt) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_indent(mut self, indent: Pt) -> Self {
        self.indent = indent;
        self
    }
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            bold: false,
            size: None,
            indent: Pt::ZERO,
        }
    }
}

/// One half of a side-by-side signature block: a caption above the signature
/// area and a name label below it. A slot without an image renders the
/// `[SIN FIRMA]` placeholder; slots degrade independently.
#[derive(Debug, Clone, Default)]
pub struct SignatureSlot {
    pub caption: String,
    pub name: String,
    pub image: Option<String>,
}

impl SignatureSlot {
    pub fn new(caption: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            caption: caption.into(),
            name: name.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, payload: impl Into<String>) -> Self {
        self.image = Some(payload.into());
        self
    }
}

/// Paginated drawing surface with a vertical cursor and automatic page
/// breaks. Every operation is best-effort: content that does not fit moves to
/// a fresh page, undecodable images degrade to placeholder text, and nothing
/// short of `save_to_file` I/O can fail once construction succeeds.
pub struct DocumentBuilder {
    canvas: Canvas,
    images: ImageRegistry,
    cursor: Pt,
    margins: Margins,
    line_height: Pt,
    body_font_size: Pt,
    fixed_footer_timestamp: Option<String>,
    debug: Option<DebugLogger>,
}

impl DocumentBuilder {
    pub fn new(options: DocumentOptions) -> Result<Self> {
        let page_size = options.paper.page_size(options.orientation);
        validate_options(&options, page_size)?;

        let debug = match options.debug_log_path.as_ref() {
            Some(path) => Some(DebugLogger::new(path)?),
            None => None,
        };
        if let Some(logger) = debug.as_ref() {
            logger.log_json(&format!(
                "{{\"type\":\"document.new\",\"page\":{{\"w\":{},\"h\":{}}},\"margins\":{{\"top\":{},\"right\":{},\"bottom\":{},\"left\":{}}},\"line_height\":{}}}",
                page_size.width.to_milli_i64(),
                page_size.height.to_milli_i64(),
                options.margins.top.to_milli_i64(),
                options.margins.right.to_milli_i64(),
                options.margins.bottom.to_milli_i64(),
                options.margins.left.to_milli_i64(),
                options.line_height.to_milli_i64(),
            ));
        }

        Ok(Self {
            canvas: Canvas::new(page_size),
            images: ImageRegistry::default(),
            cursor: options.margins.top,
            margins: options.margins,
            line_height: options.line_height,
            body_font_size: options.body_font_size,
            fixed_footer_timestamp: options.fixed_footer_timestamp,
            debug,
        })
    }

    pub fn page_size(&self) -> Size {
        self.canvas.page_size()
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    pub fn line_height(&self) -> Pt {
        self.line_height
    }

    /// Current vertical write position on the active page.
    pub fn cursor(&self) -> Pt {
        self.cursor
    }

    pub fn content_width(&self) -> Pt {
        (self.page_size().width - self.margins.left - self.margins.right).max(Pt::ZERO)
    }

    /// Pages the document currently spans, counting the page under the
    /// cursor unless it is both empty and not the first.
    pub fn page_count(&self) -> usize {
        let completed = self.canvas.completed_pages();
        if completed > 0 && self.canvas.is_current_empty() {
            completed
        } else {
            completed + 1
        }
    }

    /// Splits `text` into wrapped lines against `content_width - indent` and
    /// draws each at the cursor, breaking the page per line when needed.
    /// Embedded `\n` forces line breaks; a word wider than the available
    /// width gets its own line.
    pub fn add_text(&mut self, text: &str, options: TextOptions) {
        let size = options.size.unwrap_or(self.body_font_size);
        let indent = options.indent.max(Pt::ZERO);
        let name = font::font_name(options.bold);
        let max_width = (self.content_width() - indent).max(Pt::from_f32(1.0));
        for line in wrap_text(name, size, text, max_width) {
            self.ensure_room(self.line_height);
            if !line.is_empty() {
                self.canvas.set_fill_color(Color::BLACK);
                self.canvas.set_font_name(name);
                self.canvas.set_font_size(size);
                self.canvas
                    .draw_string(self.margins.left + indent, self.cursor, line);
            }
            self.cursor += self.line_height;
        }
    }

    /// Company line, document title, optional subtitle, then a rule. The
    /// company string is caller-supplied; the builder knows nothing about
    /// companies. May page-break through its constituent text draws.
    pub fn add_header(&mut self, company: &str, title: &str, subtitle: Option<&str>) {
        self.add_text(company, TextOptions::bold().with_size(Pt::from_f32(16.0)));
        self.add_text(title, TextOptions::bold().with_size(Pt::from_f32(13.0)));
        if let Some(subtitle) = subtitle {
            self.add_text(subtitle, TextOptions::default().with_size(Pt::from_f32(10.0)));
        }
        self.add_horizontal_line();
    }

    /// Rule from the left to the right margin at the cursor.
    pub fn add_horizontal_line(&mut self) {
        self.ensure_room(self.rule_gap());
        self.draw_rule(self.margins.left, self.page_size().width - self.margins.right);
        self.cursor += self.rule_gap();
    }

    /// Advances the cursor by `height`, breaking the page first when the gap
    /// would pass the bottom margin.
    pub fn add_spacer(&mut self, height: Pt) {
        let height = height.max(Pt::ZERO);
        self.ensure_room(height);
        self.cursor += height;
    }

    /// Embeds a decodable payload at the left margin sized `width x height`.
    /// An undecodable payload draws `[ERROR AL PROCESAR IMAGEN]` instead and
    /// generation continues.
    pub fn add_image(&mut self, payload: &str, width: Pt, height: Pt) {
        self.place_image(payload, width, height, IMAGE_PLACEHOLDER);
    }

    /// Same placement as `add_image`; distinct only by caller intent and the
    /// `[SIN FIRMA]` placeholder.
    pub fn add_signature(&mut self, payload: &str, width: Pt, height: Pt) {
        self.place_image(payload, width, height, SIGNATURE_PLACEHOLDER);
    }

    fn place_image(&mut self, payload: &str, width: Pt, height: Pt, placeholder: &str) {
        let width = width.max(Pt::ZERO);
        let height = height.max(Pt::ZERO);
        match decode_image_source(payload) {
            Ok(image) => {
                self.ensure_room(height);
                let resource_id = self.images.intern(image);
                self.canvas
                    .draw_image(self.margins.left, self.cursor, width, height, resource_id);
                self.cursor += height + self.image_gap();
            }
            Err(err) => {
                self.count("image.embed_failed", 1);
                if let Some(logger) = self.debug.as_ref() {
                    logger.log_json(&format!(
                        "{{\"type\":\"image.embed_failed\",\"error\":\"{}\"}}",
                        json_escape(&err.to_string())
                    ));
                }
                self.add_text(placeholder, TextOptions::default());
            }
        }
    }

    /// Equal-width columns spanning the content width. The header row stays
    /// with at least the first data row; continuation pages do not repeat the
    /// header. Cells draw their first wrapped line only, truncated to the
    /// column. Rows are normalized to the header length: excess cells
    /// dropped, missing cells blank.
    pub fn add_table<H, C>(&mut self, headers: &[H], rows: &[Vec<C>])
    where
        H: AsRef<str>,
        C: AsRef<str>,
    {
        if headers.is_empty() {
            return;
        }
        let columns = headers.len();
        let column_width = self.content_width() / columns as i32;
        let cell_width = (column_width - Pt::from_mm(2.0)).max(Pt::from_f32(1.0));
        let size = table_font_size();

        let lead = if rows.is_empty() {
            self.line_height + self.rule_gap()
        } else {
            self.line_height + self.rule_gap() + self.line_height
        };
        self.ensure_room(lead);

        self.canvas.set_fill_color(Color::BLACK);
        self.canvas.set_font_name(font::HELVETICA_BOLD);
        self.canvas.set_font_size(size);
        for (index, header) in headers.iter().enumerate() {
            let text = cell_text(font::HELVETICA_BOLD, size, header.as_ref(), cell_width);
            if !text.is_empty() {
                let x = self.margins.left + column_width * index as i32;
                self.canvas.draw_string(x, self.cursor, text);
            }
        }
        self.cursor += self.line_height;
        self.draw_rule(self.margins.left, self.page_size().width - self.margins.right);
        self.cursor += self.rule_gap();

        for row in rows {
            if row.len() != columns {
                self.count("table.row_normalized", 1);
            }
            self.ensure_room(self.line_height);
            self.canvas.set_fill_color(Color::BLACK);
            self.canvas.set_font_name(font::HELVETICA);
            self.canvas.set_font_size(size);
            for index in 0..columns {
                let cell = row.get(index).map(AsRef::as_ref).unwrap_or("");
                let text = cell_text(font::HELVETICA, size, cell, cell_width);
                if !text.is_empty() {
                    let x = self.margins.left + column_width * index as i32;
                    self.canvas.draw_string(x, self.cursor, text);
                }
            }
            self.cursor += self.line_height;
        }
    }

    /// Lays `items` out row-major across equal-width columns; each visual row
    /// is page-break-checked as a unit. Items truncate like table cells.
    pub fn add_multi_column_list<S: AsRef<str>>(&mut self, items: &[S], columns: usize) {
        let columns = columns.max(1);
        let column_width = self.content_width() / columns as i32;
        let cell_width = (column_width - Pt::from_mm(2.0)).max(Pt::from_f32(1.0));
        let size = table_font_size();
        for chunk in items.chunks(columns) {
            self.ensure_room(self.line_height);
            self.canvas.set_fill_color(Color::BLACK);
            self.canvas.set_font_name(font::HELVETICA);
            self.canvas.set_font_size(size);
            for (index, item) in chunk.iter().enumerate() {
                let text = cell_text(font::HELVETICA, size, item.as_ref(), cell_width);
                if !text.is_empty() {
                    let x = self.margins.left + column_width * index as i32;
                    self.canvas.draw_string(x, self.cursor, text);
                }
            }
            self.cursor += self.line_height;
        }
    }

    /// Fixed-position gray text and a generation timestamp near the bottom of
    /// the current page only. The timestamp is captured once per call;
    /// `with_fixed_footer_timestamp` pins it for reproducible output.
    pub fn add_footer(&mut self, text: &str) {
        let timestamp = self
            .fixed_footer_timestamp
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format("%d/%m/%Y %H:%M").to_string());
        let size = Pt::from_f32(8.0);
        let page_height = self.page_size().height;
        let text_y = (page_height - Pt::from_mm(12.0) - size).max(Pt::ZERO);
        let stamp_y = (page_height - Pt::from_mm(7.0) - size).max(Pt::ZERO);

        self.canvas.set_fill_color(Color::GRAY);
        self.canvas.set_font_name(font::HELVETICA);
        self.canvas.set_font_size(size);
        self.canvas.draw_string(self.margins.left, text_y, text);
        self.canvas.draw_string(
            self.margins.left,
            stamp_y,
            format!("Generado el: {timestamp}"),
        );
    }

    /// Two signature slots side by side: caption, signature image or the
    /// `[SIN FIRMA]` placeholder, a separator line, and the name label. Both
    /// name labels render regardless of signature presence. The whole block
    /// is page-break-checked once, as a unit.
    pub fn add_side_by_side_signatures(&mut self, left: &SignatureSlot, right: &SignatureSlot) {
        let sig_height = Pt::from_mm(20.0);
        let gap = Pt::from_mm(2.0);
        let block = self.line_height + sig_height + gap + gap + self.line_height;
        self.ensure_room(block);

        let top = self.cursor;
        let slot_gap = Pt::from_mm(10.0);
        let slot_width = ((self.content_width() - slot_gap) / 2).max(Pt::from_f32(1.0));
        let size = table_font_size();
        let slots = [
            (left, self.margins.left),
            (right, self.margins.left + slot_width + slot_gap),
        ];

        for (slot, slot_x) in slots {
            self.draw_centered(&slot.caption, slot_x, slot_width, top, font::HELVETICA, size);

            let image_y = top + self.line_height;
            let decoded = slot.image.as_deref().map(decode_image_source);
            match decoded {
                Some(Ok(image)) => {
                    let width = slot_width.min(Pt::from_mm(50.0));
                    let resource_id = self.images.intern(image);
                    let x = slot_x + (slot_width - width) / 2;
                    self.canvas
                        .draw_image(x, image_y, width, sig_height, resource_id);
                }
                Some(Err(err)) => {
                    self.count("image.embed_failed", 1);
                    if let Some(logger) = self.debug.as_ref() {
                        logger.log_json(&format!(
                            "{{\"type\":\"image.embed_failed\",\"error\":\"{}\"}}",
                            json_escape(&err.to_string())
                        ));
                    }
                    let placeholder_y = image_y + (sig_height - self.line_height) / 2;
                    self.draw_centered(
                        SIGNATURE_PLACEHOLDER,
                        slot_x,
                        slot_width,
                        placeholder_y,
                        font::HELVETICA,
                        size,
                    );
                }
                None => {
                    let placeholder_y = image_y + (sig_height - self.line_height) / 2;
                    self.draw_centered(
                        SIGNATURE_PLACEHOLDER,
                        slot_x,
                        slot_width,
                        placeholder_y,
                        font::HELVETICA,
                        size,
                    );
                }
            }

            let line_y = image_y + sig_height + gap;
            self.canvas.set_stroke_color(Color::BLACK);
            self.canvas.set_line_width(Pt::from_f32(0.5));
            self.canvas.draw_line(slot_x, line_y, slot_x + slot_width, line_y);
            self.draw_centered(
                &slot.name,
                slot_x,
                slot_width,
                line_y + gap,
                font::HELVETICA_BOLD,
                size,
            );
        }

        self.cursor = top + block;
    }

    /// Snapshot of the recorded pages. Finalization is non-consuming:
    /// serialization never mutates builder state, so it may be repeated and
    /// drawing may continue afterwards.
    pub fn document(&self) -> crate::canvas::Document {
        self.canvas.snapshot()
    }

    /// Serializes the accumulated pages to PDF bytes. Identical builder
    /// state yields byte-identical output.
    pub fn to_bytes(&self) -> Vec<u8> {
        let document = self.canvas.snapshot();
        let bytes = pdf::render(&document, self.images.entries(), self.debug.as_ref());
        if let Some(logger) = self.debug.as_ref() {
            logger.emit_summary("finalize");
            logger.flush();
        }
        bytes
    }

    /// `data:application/pdf;base64,...` form of `to_bytes`.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:application/pdf;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(self.to_bytes())
        )
    }

    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        std::fs::write(path, self.to_bytes())?;
        Ok(())
    }

    /// Breaks the page when `height` would pass the bottom margin. At the top
    /// of a fresh page an over-tall operation is placed anyway and allowed to
    /// overrun rather than looping on empty pages.
    fn ensure_room(&mut self, height: Pt) {
        if self.cursor + height > self.bottom_limit() && self.cursor > self.margins.top {
            self.page_break();
        }
    }

    fn page_break(&mut self) {
        self.canvas.show_page();
        self.cursor = self.margins.top;
        self.count("page.break", 1);
    }

    fn bottom_limit(&self) -> Pt {
        self.page_size().height - self.margins.bottom
    }

    fn rule_gap(&self) -> Pt {
        self.line_height / 2
    }

    fn image_gap(&self) -> Pt {
        self.line_height / 2
    }

    fn draw_rule(&mut self, x1: Pt, x2: Pt) {
        self.canvas.set_stroke_color(Color::BLACK);
        self.canvas.set_line_width(Pt::from_f32(0.5));
        self.canvas.draw_line(x1, self.cursor, x2, self.cursor);
    }

    fn draw_centered(&mut self, text: &str, x: Pt, width: Pt, y: Pt, name: &str, size: Pt) {
        if text.is_empty() {
            return;
        }
        let text = cell_text(name, size, text, width);
        let text_width = font::measure_text_width(name, size, &text);
        let offset = ((width - text_width) / 2).max(Pt::ZERO);
        self.canvas.set_fill_color(Color::BLACK);
        self.canvas.set_font_name(name);
        self.canvas.set_font_size(size);
        self.canvas.draw_string(x + offset, y, text);
    }

    fn count(&self, key: &str, amount: u64) {
        if let Some(logger) = self.debug.as_ref() {
            logger.increment(key, amount);
        }
    }
}

fn validate_options(options: &DocumentOptions, page_size: Size) -> Result<()> {
    let margins = options.margins;
    if margins.top < Pt::ZERO
        || margins.right < Pt::ZERO
        || margins.bottom < Pt::ZERO
        || margins.left < Pt::ZERO
    {
        return Err(Error::InvalidOptions(
            "margins must be non-negative".to_string(),
        ));
    }
    if options.line_height <= Pt::ZERO {
        return Err(Error::InvalidOptions(
            "line height must be positive".to_string(),
        ));
    }
    if options.body_font_size <= Pt::ZERO {
        return Err(Error::InvalidOptions(
            "body font size must be positive".to_string(),
        ));
    }
    if page_size.width - margins.left - margins.right <= Pt::ZERO {
        return Err(Error::InvalidOptions(
            "margins leave no horizontal content area".to_string(),
        ));
    }
    if page_size.height - margins.top - margins.bottom < options.line_height {
        return Err(Error::InvalidOptions(
            "margins leave no room for a single line".to_string(),
        ));
    }
    Ok(())
}

fn table_font_size() -> Pt {
    Pt::from_f32(9.0)
}

/// Greedy word wrap: split on `\n`, accumulate whitespace-separated words
/// against `max_width`. A word wider than the line gets its own line. Always
/// yields at least one (possibly empty) line.
fn wrap_text(name: &str, size: Pt, text: &str, max_width: Pt) -> Vec<String> {
    let mut lines = Vec::new();
    let space_width = font::measure_text_width(name, size, " ");
    for segment in text.split('\n') {
        if segment.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut current = String::new();
        let mut current_width = Pt::ZERO;
        for word in segment.split_whitespace() {
            let word_width = font::measure_text_width(name, size, word);
            if current.is_empty() {
                current.push_str(word);
                current_width = word_width;
            } else if current_width + space_width + word_width <= max_width {
                current.push(' ');
                current.push_str(word);
                current_width = current_width + space_width + word_width;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_width = word_width;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// First wrapped line of `text`, hard-truncated by measured width when a
/// single word overruns the cell.
fn cell_text(name: &str, size: Pt, text: &str, max_width: Pt) -> String {
    let line = wrap_text(name, size, text, max_width)
        .into_iter()
        .next()
        .unwrap_or_default();
    if font::measure_text_width(name, size, &line) <= max_width {
        return line;
    }
    let mut out = String::new();
    let mut width = Pt::ZERO;
    for ch in line.chars() {
        let advance = font::char_width(name, size, ch);
        if width + advance > max_width {
            break;
        }
        out.push(ch);
        width += advance;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Command;
    use crate::image::test_png_data_uri;

    fn builder() -> DocumentBuilder {
        DocumentBuilder::new(DocumentOptions::default()).unwrap()
    }

    fn draw_strings(page: &crate::canvas::Page) -> Vec<(Pt, Pt, String)> {
        page.commands
            .iter()
            .filter_map(|cmd| match cmd {
                Command::DrawString { x, y, text } => Some((*x, *y, text.clone())),
                _ => None,
            })
            .collect()
    }

    fn page_contains_text(page: &crate::canvas::Page, needle: &str) -> bool {
        draw_strings(page).iter().any(|(_, _, text)| text.contains(needle))
    }

    fn image_count(page: &crate::canvas::Page) -> usize {
        page.commands
            .iter()
            .filter(|cmd| matches!(cmd, Command::DrawImage { .. }))
            .count()
    }

    #[test]
    fn wrap_respects_width_and_newlines() {
        let size = Pt::from_f32(11.0);
        let lines = wrap_text(font::HELVETICA, size, "uno dos\ntres", Pt::from_f32(500.0));
        assert_eq!(lines, vec!["uno dos".to_string(), "tres".to_string()]);

        let narrow = font::measure_text_width(font::HELVETICA, size, "uno dos") - Pt::from_f32(1.0);
        let lines = wrap_text(font::HELVETICA, size, "uno dos", narrow);
        assert_eq!(lines, vec!["uno".to_string(), "dos".to_string()]);

        // A word wider than the line still lands on its own line.
        let tiny = Pt::from_f32(4.0);
        let lines = wrap_text(font::HELVETICA, size, "independiente ya", tiny);
        assert_eq!(lines[0], "independiente");
    }

    #[test]
    fn text_advances_on_the_line_grid() {
        let mut doc = builder();
        let start = doc.cursor();
        doc.add_text("primera", TextOptions::default());
        doc.add_text("segunda", TextOptions::default());
        assert_eq!(doc.cursor(), start + doc.line_height() * 2);
        let pages = doc.document().pages;
        assert_eq!(pages.len(), 1);
        let drawn = draw_strings(&pages[0]);
        assert_eq!(drawn.len(), 2);
        assert_eq!(drawn[0].0, doc.margins().left);
        assert_eq!(drawn[1].1 - drawn[0].1, doc.line_height());
    }

    #[test]
    fn long_text_paginates_and_stays_inside_the_content_area() {
        let mut doc = builder();
        let usable = doc.page_size().height - doc.margins().top - doc.margins().bottom;
        let per_page = (usable.to_milli_i64() / doc.line_height().to_milli_i64()) as usize;
        for index in 0..per_page + 5 {
            doc.add_text(&format!("linea {index}"), TextOptions::default());
        }
        let document = doc.document();
        assert!(document.pages.len() > 1);
        let limit = doc.page_size().height - doc.margins().bottom - doc.line_height();
        for page in &document.pages {
            for (_, y, _) in draw_strings(page) {
                assert!(y >= doc.margins().top);
                assert!(y <= limit);
            }
        }
    }

    #[test]
    fn wrap_split_lands_two_lines_then_three() {
        let mut doc = builder();
        let usable = doc.page_size().height - doc.margins().top - doc.margins().bottom;
        doc.add_spacer(usable - doc.line_height() * 2);
        // 50 identical words wrap to exactly five lines at the default
        // content width and body size.
        let text = vec!["palabra"; 50].join(" ");
        doc.add_text(&text, TextOptions::default());
        let document = doc.document();
        assert_eq!(document.pages.len(), 2);
        assert_eq!(draw_strings(&document.pages[0]).len(), 2);
        assert_eq!(draw_strings(&document.pages[1]).len(), 3);
    }

    #[test]
    fn header_writes_company_title_subtitle_and_rule() {
        let mut doc = builder();
        doc.add_header("Grúas del Norte", "FACTURA", Some("Folio: F-0042"));
        let page = &doc.document().pages[0];
        assert!(page_contains_text(page, "Grúas del Norte"));
        assert!(page_contains_text(page, "FACTURA"));
        assert!(page_contains_text(page, "Folio: F-0042"));
        assert!(
            page.commands
                .iter()
                .any(|cmd| matches!(cmd, Command::DrawLine { .. }))
        );
    }

    #[test]
    fn table_cells_sit_on_column_multiples() {
        let mut doc = builder();
        let headers = ["Concepto", "Cantidad", "Importe"];
        let rows = vec![vec!["Maniobra", "2", "$1,500"]];
        doc.add_table(&headers, &rows);
        let column_width = doc.content_width() / 3;
        let left = doc.margins().left;
        let drawn = draw_strings(&doc.document().pages[0]);
        assert_eq!(drawn.len(), 6);
        for (index, (x, _, _)) in drawn.iter().enumerate() {
            let column = index % 3;
            assert_eq!(
                x.to_milli_i64(),
                (left + column_width * column as i32).to_milli_i64()
            );
        }
    }

    #[test]
    fn table_rows_normalize_to_header_length() {
        let mut doc = builder();
        let headers = ["A", "B"];
        let rows = vec![
            vec!["1", "2", "3"],
            vec!["solo"],
        ];
        doc.add_table(&headers, &rows);
        let drawn = draw_strings(&doc.document().pages[0]);
        // Two header cells, then "1", "2" (excess dropped), then "solo"
        // (missing cell blank, not drawn).
        let texts: Vec<&str> = drawn.iter().map(|(_, _, t)| t.as_str()).collect();
        assert_eq!(texts, vec!["A", "B", "1", "2", "solo"]);
    }

    #[test]
    fn table_header_keeps_first_row_on_the_same_page() {
        let mut doc = builder();
        let usable = doc.page_size().height - doc.margins().top - doc.margins().bottom;
        // Leave exactly one line of room: not enough for header + rule + row.
        doc.add_spacer(usable - doc.line_height());
        doc.add_table(&["Columna"], &[vec!["valor"]]);
        let document = doc.document();
        assert_eq!(document.pages.len(), 2);
        assert!(draw_strings(&document.pages[0]).is_empty());
        assert!(page_contains_text(&document.pages[1], "Columna"));
        assert!(page_contains_text(&document.pages[1], "valor"));
    }

    #[test]
    fn table_continuation_does_not_repeat_the_header() {
        let mut doc = builder();
        let rows: Vec<Vec<String>> = (0..60)
            .map(|index| vec![format!("fila {index}")])
            .collect();
        doc.add_table(&["Encabezado"], &rows);
        let document = doc.document();
        assert!(document.pages.len() > 1);
        assert!(page_contains_text(&document.pages[0], "Encabezado"));
        for page in &document.pages[1..] {
            assert!(!page_contains_text(page, "Encabezado"));
        }
    }

    #[test]
    fn invalid_image_payload_degrades_to_placeholder() {
        let mut doc = builder();
        doc.add_image("no-es-imagen", Pt::from_mm(40.0), Pt::from_mm(30.0));
        let document = doc.document();
        assert_eq!(image_count(&document.pages[0]), 0);
        assert!(page_contains_text(&document.pages[0], IMAGE_PLACEHOLDER));
    }

    #[test]
    fn valid_image_embeds_and_advances_cursor() {
        let mut doc = builder();
        let before = doc.cursor();
        let height = Pt::from_mm(30.0);
        doc.add_image(&test_png_data_uri(4, 4), Pt::from_mm(40.0), height);
        assert_eq!(image_count(&doc.document().pages[0]), 1);
        assert_eq!(
            doc.cursor().to_milli_i64(),
            (before + height + doc.line_height() / 2).to_milli_i64()
        );
    }

    #[test]
    fn repeated_payload_shares_one_resource() {
        let mut doc = builder();
        let uri = test_png_data_uri(3, 3);
        doc.add_image(&uri, Pt::from_mm(30.0), Pt::from_mm(20.0));
        doc.add_image(&uri, Pt::from_mm(30.0), Pt::from_mm(20.0));
        assert_eq!(image_count(&doc.document().pages[0]), 2);
        let bytes = doc.to_bytes();
        let needle = b"/Subtype /Image";
        let count = bytes
            .windows(needle.len())
            .filter(|window| *window == needle)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn oversized_image_overruns_a_fresh_page_instead_of_looping() {
        let mut doc = builder();
        let taller_than_page = doc.page_size().height * 2;
        doc.add_image(&test_png_data_uri(2, 2), Pt::from_mm(40.0), taller_than_page);
        let document = doc.document();
        assert_eq!(document.pages.len(), 1);
        assert_eq!(image_count(&document.pages[0]), 1);
    }

    #[test]
    fn signature_slots_degrade_independently() {
        let mut doc = builder();
        let left = SignatureSlot::new("Firma del operador", "Juan Pérez");
        let right = SignatureSlot::new("Firma del cliente", "María López")
            .with_image(test_png_data_uri(6, 3));
        doc.add_side_by_side_signatures(&left, &right);
        let page = &doc.document().pages[0];
        assert!(page_contains_text(page, SIGNATURE_PLACEHOLDER));
        assert_eq!(image_count(page), 1);
        assert!(page_contains_text(page, "Juan Pérez"));
        assert!(page_contains_text(page, "María López"));
        // The image sits in the right half of the content area.
        let middle = doc.margins().left + doc.content_width() / 2;
        for cmd in &page.commands {
            if let Command::DrawImage { x, .. } = cmd {
                assert!(*x > middle);
            }
        }
    }

    #[test]
    fn footer_stays_on_the_current_page_with_fixed_timestamp() {
        let options =
            DocumentOptions::default().with_fixed_footer_timestamp("01/02/2025 12:00");
        let mut doc = DocumentBuilder::new(options).unwrap();
        doc.add_text("contenido", TextOptions::default());
        doc.add_footer("Documento generado por el sistema");
        let page = &doc.document().pages[0];
        assert!(page_contains_text(page, "Generado el: 01/02/2025 12:00"));
        let limit = doc.page_size().height - doc.margins().bottom;
        let below_margin = draw_strings(page)
            .iter()
            .filter(|(_, y, _)| *y > limit)
            .count();
        assert_eq!(below_margin, 2);
    }

    #[test]
    fn finalization_is_repeatable_and_byte_identical() {
        let options =
            DocumentOptions::default().with_fixed_footer_timestamp("01/02/2025 12:00");
        let mut doc = DocumentBuilder::new(options).unwrap();
        doc.add_text("idéntico", TextOptions::default());
        doc.add_footer("pie");
        let first = doc.to_bytes();
        let second = doc.to_bytes();
        assert_eq!(first, second);
        assert_eq!(
            crate::inspect::fingerprint(&first),
            crate::inspect::fingerprint(&second)
        );
    }

    #[test]
    fn drawing_after_finalization_extends_the_document() {
        let mut doc = builder();
        doc.add_text("antes", TextOptions::default());
        let first = doc.to_bytes();
        doc.add_text("después", TextOptions::default());
        let second = doc.to_bytes();
        assert!(second.len() > first.len());
        assert!(page_contains_text(&doc.document().pages[0], "después"));
    }

    #[test]
    fn multi_column_list_places_items_row_major() {
        let mut doc = builder();
        let items = ["Frenos: OK", "Luces: OK", "Cables: OK"];
        doc.add_multi_column_list(&items, 2);
        let drawn = draw_strings(&doc.document().pages[0]);
        assert_eq!(drawn.len(), 3);
        let column_width = doc.content_width() / 2;
        assert_eq!(drawn[0].0, doc.margins().left);
        assert_eq!(
            drawn[1].0.to_milli_i64(),
            (doc.margins().left + column_width).to_milli_i64()
        );
        // Third item wraps to the next visual row, first column.
        assert_eq!(drawn[2].0, doc.margins().left);
        assert_eq!(drawn[2].1 - drawn[0].1, doc.line_height());
    }

    #[test]
    fn spacer_breaks_instead_of_passing_the_bottom_margin() {
        let mut doc = builder();
        let usable = doc.page_size().height - doc.margins().top - doc.margins().bottom;
        doc.add_spacer(usable - doc.line_height());
        assert_eq!(doc.page_count(), 1);
        doc.add_spacer(doc.line_height() * 3);
        doc.add_text("nueva página", TextOptions::default());
        let document = doc.document();
        assert_eq!(document.pages.len(), 2);
        assert!(page_contains_text(&document.pages[1], "nueva página"));
    }

    #[test]
    fn margins_that_leave_no_content_area_are_rejected() {
        let wide = Margins::all(Pt::from_f32(300.0));
        let err = DocumentBuilder::new(DocumentOptions::default().with_margins(wide))
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidOptions(_)));

        let negative = Margins {
            top: Pt::from_f32(-1.0),
            ..Margins::all(Pt::from_mm(20.0))
        };
        assert!(DocumentBuilder::new(DocumentOptions::default().with_margins(negative)).is_err());

        let flat = DocumentOptions::default().with_line_height(Pt::ZERO);
        assert!(DocumentBuilder::new(flat).is_err());
    }

    #[test]
    fn landscape_letter_widens_the_content_area() {
        let portrait = builder();
        let landscape = DocumentBuilder::new(DocumentOptions::new(
            Orientation::Landscape,
            PaperFormat::Letter,
        ))
        .unwrap();
        assert!(landscape.content_width() > portrait.content_width());
        assert_eq!(landscape.page_size().width, Pt::from_f32(792.0));
    }

    #[test]
    fn data_url_has_pdf_prefix_and_valid_base64() {
        let mut doc = builder();
        doc.add_text("hola", TextOptions::default());
        let url = doc.to_data_url();
        assert!(url.starts_with("data:application/pdf;base64,"));
        let payload = url.trim_start_matches("data:application/pdf;base64,");
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .unwrap();
        assert_eq!(decoded, doc.to_bytes());
    }

    #[test]
    fn lossy_winansi_text_reaches_the_debug_log() {
        let path = std::env::temp_dir().join(format!(
            "papeleo-builder-lossy-{}.log",
            std::process::id()
        ));
        let options = DocumentOptions::default().with_debug_log_path(&path);
        let mut doc = DocumentBuilder::new(options).unwrap();
        doc.add_text("grúa 中", TextOptions::default());
        let _ = doc.to_bytes();
        let contents = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        // One event for the replaced character, then the counter in the
        // finalize summary. The mappable accent does not count.
        assert!(contents.contains("\"type\":\"pdf.winansi.lossy\""));
        assert!(contents.contains("\"replaced\":1"));
        assert!(contents.contains("\"pdf.winansi.lossy\":1"));
    }

    #[test]
    fn debug_log_records_counters_for_degraded_operations() {
        let path = std::env::temp_dir().join(format!(
            "papeleo-builder-debug-{}.log",
            std::process::id()
        ));
        let options = DocumentOptions::default().with_debug_log_path(&path);
        let mut doc = DocumentBuilder::new(options).unwrap();
        doc.add_image("payload roto", Pt::from_mm(30.0), Pt::from_mm(20.0));
        doc.add_table(&["A", "B"], &[vec!["solo"]]);
        let _ = doc.to_bytes();
        let contents = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert!(contents.contains("\"type\":\"document.new\""));
        assert!(contents.contains("\"image.embed_failed\":1"));
        assert!(contents.contains("\"table.row_normalized\":1"));
    }
}
