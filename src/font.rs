use crate::types::Pt;

/// Built-in fonts only. Both are base-14, WinAnsi-encoded, never embedded.
pub const HELVETICA: &str = "Helvetica";
pub const HELVETICA_BOLD: &str = "Helvetica-Bold";

/// Advance for characters outside the tables, in 1/1000 em.
const FALLBACK_ADVANCE: i64 = 600;

pub fn font_name(bold: bool) -> &'static str {
    if bold { HELVETICA_BOLD } else { HELVETICA }
}

/// Width of `text` at `font_size`, from the standard Helvetica advance tables.
/// Integer milli-point arithmetic end to end, so measurement is deterministic.
pub fn measure_text_width(font: &str, font_size: Pt, text: &str) -> Pt {
    let bold = font == HELVETICA_BOLD;
    let mut units: i64 = 0;
    for ch in text.chars() {
        units += advance_units(ch, bold);
    }
    let size_milli = font_size.to_milli_i64();
    Pt::from_milli_i64((size_milli * units + 500) / 1000)
}

pub fn char_width(font: &str, font_size: Pt, ch: char) -> Pt {
    let units = advance_units(ch, font == HELVETICA_BOLD);
    Pt::from_milli_i64((font_size.to_milli_i64() * units + 500) / 1000)
}

/// Advance of one char in 1/1000 em. Accented Latin-1 letters share their
/// base glyph's advance.
fn advance_units(ch: char, bold: bool) -> i64 {
    let ch = fold_accent(ch);
    match ch {
        ' ' | '.' | ',' | ';' | '/' | '\\' => 278,
        ':' => {
            if bold {
                333
            } else {
                278
            }
        }
        '-' | '!' | '(' | ')' | '[' | ']' | '{' | '}' | '`' | '¡' => 333,
        '\'' => 222,
        '"' => 400,
        '@' => 800,
        '#' | '$' | '_' => 556,
        '%' => 889,
        '^' | '?' | '¿' => 500,
        '&' => 722,
        '*' => 389,
        '+' | '=' | '<' | '>' | '~' => 584,
        '|' => 280,
        '°' => 400,
        '0'..='9' => 556,
        'A' | 'B' | 'C' | 'D' | 'H' | 'K' | 'N' | 'R' | 'U' => 722,
        'E' | 'P' | 'S' | 'V' | 'X' | 'Y' => 667,
        'F' | 'L' | 'T' | 'Z' => 611,
        'G' | 'O' | 'Q' => 778,
        'I' => 278,
        'J' => 556,
        'M' => 833,
        'W' => 944,
        'a' | 'c' | 'e' | 'k' | 's' | 'v' | 'x' | 'y' => 556,
        'b' | 'd' | 'g' | 'h' | 'n' | 'o' | 'p' | 'q' | 'u' => 611,
        'f' => {
            if bold {
                333
            } else {
                278
            }
        }
        'i' | 'j' | 'l' => {
            if bold {
                278
            } else {
                222
            }
        }
        'm' => {
            if bold {
                889
            } else {
                833
            }
        }
        'r' => 389,
        't' => 333,
        'w' => 778,
        'z' => 500,
        _ => FALLBACK_ADVANCE,
    }
}

fn fold_accent(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        'Á' | 'À' | 'Â' | 'Ä' => 'A',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'Ó' | 'Ò' | 'Ô' | 'Ö' => 'O',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'Ñ' => 'N',
        'Ç' => 'C',
        _ => ch,
    }
}
