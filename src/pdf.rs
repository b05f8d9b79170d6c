use crate::canvas::{Command, Document, Page};
use crate::debug::{DebugLogger, json_escape};
use crate::font;
use crate::image::{AlphaData, ImageData};
use crate::types::{Color, Pt};
use fixed::types::I32F32;
use std::collections::HashMap;

const PDF_CATALOG_ID: usize = 1;
const PDF_PAGES_ID: usize = 2;
const PDF_RESOURCES_ID: usize = 3;

// Base-14 fonts carried by every document; resource names are fixed so the
// content streams never depend on registration order.
const FONT_REGULAR_ID: usize = 4;
const FONT_BOLD_ID: usize = 5;

/// Serializes the recorded document into PDF 1.4 bytes. Pure function of its
/// inputs: no timestamps, no document id, fixed object numbering, so the same
/// state always yields the same bytes. Lossy WinAnsi encodings are reported to
/// the diagnostics logger when one is attached.
pub(crate) fn render(
    document: &Document,
    images: &[(String, ImageData)],
    debug: Option<&DebugLogger>,
) -> Vec<u8> {
    // Object ids are positional (index + 1), so lay out the id space first:
    // catalog, pages, resources, two fonts, then per image an optional smask
    // followed by the image, then per page a content stream and the page.
    let mut next_id = FONT_BOLD_ID + 1;
    let mut image_ids: Vec<(Option<usize>, usize)> = Vec::with_capacity(images.len());
    let mut image_names: HashMap<String, String> = HashMap::new();
    for (index, (resource_id, image)) in images.iter().enumerate() {
        let smask_id = image.alpha.as_ref().map(|_| {
            let id = next_id;
            next_id += 1;
            id
        });
        let object_id = next_id;
        next_id += 1;
        image_ids.push((smask_id, object_id));
        image_names.insert(resource_id.clone(), format!("Im{}", index + 1));
    }

    let mut page_ids: Vec<(usize, usize)> = Vec::with_capacity(document.pages.len());
    for _ in &document.pages {
        page_ids.push((next_id, next_id + 1));
        next_id += 2;
    }

    let mut objects: Vec<String> = Vec::with_capacity(next_id - 1);
    objects.push(format!("<< /Type /Catalog /Pages {} 0 R >>", PDF_PAGES_ID));

    let kids = page_ids
        .iter()
        .map(|(_, page_id)| format!("{} 0 R", page_id))
        .collect::<Vec<_>>()
        .join(" ");
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids,
        page_ids.len()
    ));

    let mut resources = format!(
        "<< /Font << /F1 {} 0 R /F2 {} 0 R >>",
        FONT_REGULAR_ID, FONT_BOLD_ID
    );
    if !images.is_empty() {
        let entries = images
            .iter()
            .enumerate()
            .map(|(index, _)| format!("/Im{} {} 0 R", index + 1, image_ids[index].1))
            .collect::<Vec<_>>()
            .join(" ");
        resources.push_str(&format!(" /XObject << {} >>", entries));
    }
    resources.push_str(" >>");
    objects.push(resources);

    objects.push(font_object(font::HELVETICA));
    objects.push(font_object(font::HELVETICA_BOLD));

    for ((smask_id, _), (_, image)) in image_ids.iter().zip(images.iter()) {
        if let (Some(_), Some(alpha)) = (smask_id, image.alpha.as_ref()) {
            objects.push(image_smask_object(alpha));
        }
        objects.push(image_object(image, *smask_id));
    }

    let page_height = document.page_size.height;
    for (index, page) in document.pages.iter().enumerate() {
        let (content_id, _) = page_ids[index];
        let content = render_page(page, page_height, &image_names, debug);
        objects.push(stream_object(&content));
        objects.push(format!(
            "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] /Resources {} 0 R /Contents {} 0 R >>",
            PDF_PAGES_ID,
            fmt_pt(document.page_size.width),
            fmt_pt(document.page_size.height),
            PDF_RESOURCES_ID,
            content_id,
        ));
    }

    build_pdf(objects)
}

fn build_pdf(objects: Vec<String>) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    out.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::new();
    for (index, obj) in objects.iter().enumerate() {
        offsets.push(out.len());
        let obj_id = index + 1;
        out.extend_from_slice(format!("{} 0 obj\n", obj_id).as_bytes());
        out.extend_from_slice(obj.as_bytes());
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }

    let trailer = format!(
        "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF",
        objects.len() + 1,
        PDF_CATALOG_ID,
        xref_start
    );
    out.extend_from_slice(trailer.as_bytes());

    out
}

fn render_page(
    page: &Page,
    page_height: Pt,
    image_names: &HashMap<String, String>,
    debug: Option<&DebugLogger>,
) -> String {
    let mut out = String::new();
    // Content streams are independent; tracked state resets per page to the
    // canvas defaults.
    let mut current_font_name = font::HELVETICA.to_string();
    let mut current_font_size = Pt::from_f32(12.0);

    for cmd in &page.commands {
        match cmd {
            Command::SetFillColor(color) => {
                out.push_str(&color_to_pdf_fill(*color));
            }
            Command::SetStrokeColor(color) => {
                out.push_str(&color_to_pdf_stroke(*color));
            }
            Command::SetLineWidth(width) => {
                out.push_str(&format!("{} w\n", fmt_pt(*width)));
            }
            Command::SetFontName(name) => {
                current_font_name = name.clone();
            }
            Command::SetFontSize(size) => {
                current_font_size = *size;
            }
            Command::DrawString { x, y, text } => {
                out.push_str("BT\n");
                out.push_str(&format!(
                    "/{} {} Tf\n",
                    font_resource(&current_font_name),
                    fmt_pt(current_font_size)
                ));
                out.push_str(&format!(
                    "{} {} Td\n",
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - current_font_size)
                ));
                let encoded = encode_winansi_pdf_string(text);
                if encoded.replaced > 0 {
                    if let Some(logger) = debug {
                        logger.log_json(&format!(
                            "{{\"type\":\"pdf.winansi.lossy\",\"font\":\"{}\",\"replaced\":{},\"sample\":\"{}\"}}",
                            json_escape(&current_font_name),
                            encoded.replaced,
                            json_escape(&truncate_preview(text, 80))
                        ));
                        logger.increment("pdf.winansi.lossy", encoded.replaced as u64);
                    }
                }
                out.push_str(&format!("({}) Tj\n", encoded.text));
                out.push_str("ET\n");
            }
            Command::DrawLine { x1, y1, x2, y2 } => {
                out.push_str(&format!(
                    "{} {} m\n",
                    fmt_pt(*x1),
                    fmt_pt(page_height - *y1)
                ));
                out.push_str(&format!(
                    "{} {} l\n",
                    fmt_pt(*x2),
                    fmt_pt(page_height - *y2)
                ));
                out.push_str("S\n");
            }
            Command::DrawImage {
                x,
                y,
                width,
                height,
                resource_id,
            } => {
                if let Some(name) = image_names.get(resource_id) {
                    let draw_y = page_height - *y - *height;
                    out.push_str("q\n");
                    out.push_str(&format!(
                        "{} 0 0 {} {} {} cm\n",
                        fmt_pt(*width),
                        fmt_pt(*height),
                        fmt_pt(*x),
                        fmt_pt(draw_y)
                    ));
                    out.push_str(&format!("/{} Do\n", name));
                    out.push_str("Q\n");
                }
            }
        }
    }

    out
}

fn truncate_preview(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    let mut out: String = input.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

fn font_resource(name: &str) -> &'static str {
    if name == font::HELVETICA_BOLD {
        "F2"
    } else {
        "F1"
    }
}

fn font_object(name: &str) -> String {
    format!(
        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
        name
    )
}

fn image_object(image: &ImageData, smask_id: Option<usize>) -> String {
    let stream_data = encode_stream_data(&image.data);
    let filters = match image.filter {
        "/DCTDecode" => "[/ASCIIHexDecode /DCTDecode]",
        _ => "[/ASCIIHexDecode /FlateDecode]",
    };
    let smask = smask_id
        .map(|id| format!(" /SMask {} 0 R", id))
        .unwrap_or_default();
    format!(
        "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {} /BitsPerComponent {} /Length {} /Filter {}{} >>
stream
{}
endstream",
        image.width,
        image.height,
        image.color_space,
        image.bits_per_component,
        stream_data.as_bytes().len(),
        filters,
        smask,
        stream_data
    )
}

fn image_smask_object(alpha: &AlphaData) -> String {
    let stream_data = encode_stream_data(&alpha.data);
    let filters = match alpha.filter {
        "/DCTDecode" => "[/ASCIIHexDecode /DCTDecode]",
        _ => "[/ASCIIHexDecode /FlateDecode]",
    };
    format!(
        "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceGray /BitsPerComponent {} /Length {} /Filter {} >>
stream
{}
endstream",
        alpha.width,
        alpha.height,
        alpha.bits_per_component,
        stream_data.as_bytes().len(),
        filters,
        stream_data
    )
}

fn encode_stream_data(data: &[u8]) -> String {
    let mut hex = ascii_hex_encode(data);
    hex.push('>');
    hex
}

fn ascii_hex_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for (index, byte) in data.iter().enumerate() {
        use std::fmt::Write;
        let _ = write!(&mut out, "{:02X}", byte);
        if index % 32 == 31 {
            out.push('\n');
        }
    }
    out
}

fn stream_object(content: &str) -> String {
    let length = content.as_bytes().len();
    format!("<< /Length {} >>\nstream\n{}\nendstream", length, content)
}

fn color_to_pdf_fill(color: Color) -> String {
    format!(
        "{} {} {} rg\n",
        fmt(color.r),
        fmt(color.g),
        fmt(color.b)
    )
}

fn color_to_pdf_stroke(color: Color) -> String {
    format!(
        "{} {} {} RG\n",
        fmt(color.r),
        fmt(color.g),
        fmt(color.b)
    )
}

pub(crate) struct WinAnsiEncoded {
    pub text: String,
    pub replaced: usize,
}

/// WinAnsi (cp1252) with octal escapes for everything outside printable
/// ASCII. Unmappable characters degrade to '?'.
pub(crate) fn encode_winansi_pdf_string(input: &str) -> WinAnsiEncoded {
    let mut out = String::new();
    let mut replaced = 0usize;
    for ch in input.chars() {
        let byte = match ch {
            '\u{0000}'..='\u{007F}' => ch as u8,
            '\u{00A0}'..='\u{00FF}' => ch as u8,
            '\u{20AC}' => 0x80,
            '\u{201A}' => 0x82,
            '\u{0192}' => 0x83,
            '\u{201E}' => 0x84,
            '\u{2026}' => 0x85,
            '\u{2020}' => 0x86,
            '\u{2021}' => 0x87,
            '\u{02C6}' => 0x88,
            '\u{2030}' => 0x89,
            '\u{0160}' => 0x8A,
            '\u{2039}' => 0x8B,
            '\u{0152}' => 0x8C,
            '\u{017D}' => 0x8E,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{02DC}' => 0x98,
            '\u{2122}' => 0x99,
            '\u{0161}' => 0x9A,
            '\u{203A}' => 0x9B,
            '\u{0153}' => 0x9C,
            '\u{017E}' => 0x9E,
            '\u{0178}' => 0x9F,
            _ => {
                replaced += 1;
                b'?'
            }
        };

        match byte {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b if b < 0x20 || b >= 0x7f => out.push_str(&format!("\\{:03o}", b)),
            b => out.push(b as char),
        }
    }

    WinAnsiEncoded {
        text: out,
        replaced,
    }
}

fn fmt(value: f32) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let fixed = I32F32::from_num(value);
    let scaled = (fixed * I32F32::from_num(1000)).round();
    let milli: i64 = scaled.to_num();
    format_milli(milli)
}

fn format_milli(milli: i64) -> String {
    if milli == 0 {
        return "0".to_string();
    }
    let sign = if milli < 0 { "-" } else { "" };
    let abs = milli.abs();
    let int_part = abs / 1000;
    let frac_part = abs % 1000;
    if frac_part == 0 {
        format!("{}{}", sign, int_part)
    } else {
        let mut s = format!("{}{}.{:03}", sign, int_part, frac_part);
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
        s
    }
}

fn fmt_pt(value: Pt) -> String {
    format_milli(value.to_milli_i64())
}
