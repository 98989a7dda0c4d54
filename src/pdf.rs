//! Paged PDF rendering for generated documents.
//!
//! Renders a long-form text document into an in-memory PDF for email
//! attachment: title, optional company subheading, generation date, then the
//! body with heading/bullet styling and word-wrapped lines.
//!
//! The builtin Helvetica font uses WinAnsi encoding, so characters outside
//! Latin-1 (emoji, CJK) cannot be represented and are stripped here. This is
//! a lossy transform for the attachment only; CRM-stored text keeps the full
//! content.

use crate::errors::AppError;
use chrono::Utc;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const LINE_HEIGHT_MM: f32 = 5.0;
const BODY_WRAP_COLS: usize = 95;

/// Renders a document to PDF bytes.
pub fn render_document(
    title: &str,
    company: Option<&str>,
    body: &str,
) -> Result<Vec<u8>, AppError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| AppError::InternalError(format!("PDF font load failed: {}", e)))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| AppError::InternalError(format!("PDF font load failed: {}", e)))?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    let mut y = PAGE_HEIGHT_MM - MARGIN_MM;

    // Header block
    layer.use_text(sanitize_for_pdf(title), 18.0, Mm(MARGIN_MM), Mm(y), &bold);
    y -= 9.0;
    if let Some(company) = company {
        layer.use_text(sanitize_for_pdf(company), 12.0, Mm(MARGIN_MM), Mm(y), &regular);
        y -= 7.0;
    }
    let date_line = format!("Generated {}", Utc::now().format("%Y-%m-%d"));
    layer.use_text(date_line, 9.0, Mm(MARGIN_MM), Mm(y), &regular);
    y -= 10.0;

    // Body
    for raw_line in sanitize_for_pdf(body).lines() {
        let line = raw_line.trim_end();
        if line.trim().is_empty() {
            y -= LINE_HEIGHT_MM * 0.6;
            continue;
        }

        let (text, font, size, indent) = style_line(line, &regular, &bold);

        for (i, wrapped) in wrap_line(&text, BODY_WRAP_COLS).into_iter().enumerate() {
            if y < MARGIN_MM + LINE_HEIGHT_MM {
                let (page, page_layer) =
                    doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
                layer = doc.get_page(page).get_layer(page_layer);
                y = PAGE_HEIGHT_MM - MARGIN_MM;
            }
            // continuation lines of a bullet keep the bullet's indent
            let x = if i == 0 { indent } else { indent + 3.0 };
            layer.use_text(wrapped, size, Mm(MARGIN_MM + x), Mm(y), font);
            y -= LINE_HEIGHT_MM;
        }

        if size > 10.0 {
            y -= 2.0;
        }
    }

    doc.save_to_bytes()
        .map_err(|e| AppError::InternalError(format!("PDF serialization failed: {}", e)))
}

/// Chooses font, size, and indent for one body line based on its markup.
fn style_line<'a>(
    line: &str,
    regular: &'a IndirectFontRef,
    bold: &'a IndirectFontRef,
) -> (String, &'a IndirectFontRef, f32, f32) {
    let trimmed = line.trim_start();

    if let Some(heading) = trimmed.strip_prefix("## ") {
        return (heading.to_string(), bold, 12.0, 0.0);
    }
    if let Some(heading) = trimmed.strip_prefix("# ") {
        return (heading.to_string(), bold, 13.5, 0.0);
    }
    if is_caps_heading(trimmed) {
        return (trimmed.to_string(), bold, 11.5, 0.0);
    }
    if let Some(item) = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
    {
        return (format!("- {}", item), regular, 10.0, 4.0);
    }
    if trimmed
        .chars()
        .next()
        .map(|c| c.is_ascii_digit())
        .unwrap_or(false)
        && (trimmed.contains(". ") || trimmed.contains(") "))
    {
        // numbered list item, slight indent
        return (trimmed.to_string(), regular, 10.0, 4.0);
    }

    (trimmed.to_string(), regular, 10.0, 0.0)
}

/// ALL-CAPS lines act as headings in generated documents.
fn is_caps_heading(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 4
        && trimmed.len() < 80
        && trimmed.chars().any(|c| c.is_alphabetic())
        && trimmed == trimmed.to_uppercase()
}

/// Greedy word wrap at a fixed column budget. Words longer than the budget
/// are hard-split.
pub fn wrap_line(line: &str, cols: usize) -> Vec<String> {
    if line.len() <= cols {
        return vec![line.to_string()];
    }

    let mut wrapped = Vec::new();
    let mut current = String::new();

    for word in line.split_whitespace() {
        if word.len() > cols {
            if !current.is_empty() {
                wrapped.push(std::mem::take(&mut current));
            }
            let mut rest = word;
            while rest.len() > cols {
                // Latin-1 survivors of the sanitizer are two bytes in UTF-8;
                // back the cut down to a char boundary before splitting
                let mut cut = cols;
                while cut > 0 && !rest.is_char_boundary(cut) {
                    cut -= 1;
                }
                if cut == 0 {
                    cut = rest.chars().next().map(char::len_utf8).unwrap_or(rest.len());
                }
                let (head, tail) = rest.split_at(cut);
                wrapped.push(head.to_string());
                rest = tail;
            }
            current = rest.to_string();
            continue;
        }

        if current.is_empty() {
            current = word.to_string();
        } else if current.len() + 1 + word.len() <= cols {
            current.push(' ');
            current.push_str(word);
        } else {
            wrapped.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }

    if !current.is_empty() {
        wrapped.push(current);
    }

    wrapped
}

/// Strips characters the builtin font cannot encode, mapping common
/// typographic punctuation to ASCII first.
pub fn sanitize_for_pdf(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => out.push('\n'),
            '\t' => out.push_str("    "),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2022}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            c if (' '..='~').contains(&c) => out.push(c),
            c if ('\u{00A0}'..='\u{00FF}').contains(&c) => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizer_strips_emoji_keeps_latin1() {
        assert_eq!(sanitize_for_pdf("café ✨ rocket 🚀"), "café  rocket ");
        assert_eq!(sanitize_for_pdf("“smart” — dashes…"), "\"smart\" - dashes...");
    }

    #[test]
    fn wrap_respects_column_budget() {
        let wrapped = wrap_line("one two three four five six seven", 10);
        assert!(wrapped.iter().all(|l| l.len() <= 10));
        assert_eq!(wrapped.join(" "), "one two three four five six seven");
    }

    #[test]
    fn wrap_hard_splits_oversized_words() {
        let wrapped = wrap_line("abcdefghijklmnop", 5);
        assert!(wrapped.iter().all(|l| l.len() <= 5));
    }

    #[test]
    fn wrap_hard_splits_multibyte_words_on_char_boundaries() {
        let word = "é".repeat(20); // 40 bytes of two-byte chars
        let wrapped = wrap_line(&word, 5);
        assert!(wrapped.iter().all(|l| l.len() <= 5));
        assert_eq!(wrapped.concat(), word);
    }

    #[test]
    fn caps_headings_detected() {
        assert!(is_caps_heading("VOICE AND TONE"));
        assert!(!is_caps_heading("Voice and tone"));
        assert!(!is_caps_heading("OK"));
    }

    #[test]
    fn renders_a_parseable_document() {
        let pdf = render_document(
            "Company Voice Guide",
            Some("Acme Corp"),
            "# Overview\nBe direct.\n\n- Bullet one\n- Bullet two",
        )
        .unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }
}
