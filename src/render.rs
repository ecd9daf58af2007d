// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! PDF rendering of the 8-section advisory report.
//!
//! [`layout`] is pure and decides fonts, colours, wrapping and page breaks;
//! [`render_pdf`] only replays the placed lines through `printpdf`.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use printpdf::{BuiltinFont, Color, Mm, PdfDocument, Rgb};
use regex::Regex;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d)\.\s\*(.*?)\*").expect("valid regex"));

const PT_PER_MM: f32 = 72.0 / 25.4;
/// Helvetica averages roughly half an em per glyph.
const AVG_GLYPH_EM: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSetup {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_mm: f32,
    pub body_size: f32,
    pub heading_size: f32,
    pub line_gap_pt: f32,
}

impl Default for PageSetup {
    /// A4 with the ~50pt margin the reports have always used.
    fn default() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            margin_mm: 17.6,
            body_size: 12.0,
            heading_size: 16.0,
            line_gap_pt: 4.0,
        }
    }
}

impl PageSetup {
    fn usable_width_pt(&self) -> f32 {
        (self.width_mm - 2.0 * self.margin_mm) * PT_PER_MM
    }

    fn chars_per_line(&self, size: f32) -> usize {
        ((self.usable_width_pt() / (size * AVG_GLYPH_EM)).floor() as usize).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub weight: FontWeight,
    pub size: f32,
    pub color: (f32, f32, f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x_mm: f32,
    /// Baseline, measured from the bottom of the page as PDF does.
    pub y_mm: f32,
    pub style: TextStyle,
    pub section: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub lines: Vec<PlacedLine>,
}

const BLACK: (f32, f32, f32) = (0.0, 0.0, 0.0);

pub fn section_color(section: u8) -> (f32, f32, f32) {
    let hex = match section {
        1 => "2c3e50",
        2 => "2980b9",
        3 => "27ae60",
        4 => "d35400",
        5 => "8e44ad",
        6 => "16a085",
        7 => "c0392b",
        8 => "7f8c8d",
        _ => return BLACK,
    };
    hex_to_rgb(hex).unwrap_or(BLACK)
}

fn hex_to_rgb(hex: &str) -> Option<(f32, f32, f32)> {
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
            .map(|v| v as f32 / 255.0)
    };
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Greedy word wrap on a character budget; words longer than a line are split.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// The builtin PDF fonts only cover Latin-1.
pub fn pdf_safe(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '₹' => out.push_str("Rs."),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201c}' | '\u{201d}' => out.push('"'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2022}' => out.push('*'),
            c if (c as u32) < 0x100 => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

struct Cursor<'a> {
    setup: &'a PageSetup,
    pages: Vec<Page>,
    y_mm: f32,
}

impl<'a> Cursor<'a> {
    fn new(setup: &'a PageSetup) -> Self {
        Self {
            setup,
            pages: vec![Page::default()],
            y_mm: setup.height_mm - setup.margin_mm,
        }
    }

    fn advance(&mut self, pt: f32) {
        self.y_mm -= pt / PT_PER_MM;
    }

    fn place(&mut self, text: String, style: TextStyle, section: Option<u8>, gap_pt: f32) {
        let line_mm = (style.size + gap_pt) / PT_PER_MM;
        if self.y_mm - line_mm < self.setup.margin_mm {
            self.pages.push(Page::default());
            self.y_mm = self.setup.height_mm - self.setup.margin_mm;
        }
        // y is the baseline: drop by the font size first.
        self.advance(style.size);
        let line = PlacedLine {
            text,
            x_mm: self.setup.margin_mm,
            y_mm: self.y_mm,
            style,
            section,
        };
        if let Some(page) = self.pages.last_mut() {
            page.lines.push(line);
        }
        self.advance(gap_pt);
    }
}

/// Lay the report out into pages. Numbered `N. *Title*` lines become bold
/// coloured headings; everything else is wrapped body text.
pub fn layout(report: &str, setup: &PageSetup) -> Vec<Page> {
    let body = TextStyle {
        weight: FontWeight::Regular,
        size: setup.body_size,
        color: BLACK,
    };
    let mut cursor = Cursor::new(setup);

    for line in report.split('\n') {
        if let Some(caps) = HEADING.captures(line) {
            let number = caps[1].parse::<u8>().unwrap_or(0);
            let title = caps[2].trim();
            let style = TextStyle {
                weight: FontWeight::Bold,
                size: setup.heading_size,
                color: section_color(number),
            };
            cursor.advance(setup.body_size);
            let heading = format!("{}. {}", number, title);
            cursor.place(heading, style, Some(number), setup.body_size / 2.0);
        } else if line.trim().is_empty() {
            cursor.advance(setup.body_size + setup.line_gap_pt);
        } else {
            for wrapped in wrap(line, setup.chars_per_line(setup.body_size)) {
                cursor.place(wrapped, body, None, setup.line_gap_pt);
            }
        }
    }

    cursor.pages
}

/// Render `report` to a PDF file at `path`.
pub fn render_pdf(report: &str, title: &str, path: &Path) -> Result<()> {
    let setup = PageSetup::default();
    let pages = layout(report, &setup);

    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(setup.width_mm), Mm(setup.height_mm), "Layer 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .context("Load Helvetica")?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .context("Load Helvetica-Bold")?;

    let mut first = Some((first_page, first_layer));
    for page in &pages {
        let (page_idx, layer_idx) = match first.take() {
            Some(indices) => indices,
            None => doc.add_page(Mm(setup.width_mm), Mm(setup.height_mm), "Layer 1"),
        };
        let layer = doc.get_page(page_idx).get_layer(layer_idx);
        for line in &page.lines {
            let (r, g, b) = line.style.color;
            layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
            let font = match line.style.weight {
                FontWeight::Regular => &regular,
                FontWeight::Bold => &bold,
            };
            layer.use_text(
                pdf_safe(&line.text),
                line.style.size,
                Mm(line.x_mm),
                Mm(line.y_mm),
                font,
            );
        }
    }

    let file = File::create(path).with_context(|| format!("Create {}", path.display()))?;
    doc.save(&mut BufWriter::new(file))
        .with_context(|| format!("Write PDF {}", path.display()))?;
    Ok(())
}

/// `{millis}_{email}_report.pdf`, with every character of the email other
/// than ASCII letters, digits and '-' replaced by '_'.
pub fn report_filename(email: &str, unix_millis: i64) -> String {
    let safe: String = email
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("{}_{}_report.pdf", unix_millis, safe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_get_section_colours_and_bold() {
        let pages = layout(
            "1. *Summary & Portfolio Characteristics*\nBody text.\n4. *Risk Meter*\nHigh",
            &PageSetup::default(),
        );
        assert_eq!(pages.len(), 1);
        let lines = &pages[0].lines;
        assert_eq!(lines[0].text, "1. Summary & Portfolio Characteristics");
        assert_eq!(lines[0].style.weight, FontWeight::Bold);
        assert_eq!(lines[0].style.size, 16.0);
        assert_eq!(lines[0].style.color, section_color(1));
        assert_eq!(lines[1].style.weight, FontWeight::Regular);
        assert_eq!(lines[1].style.color, BLACK);
        assert_eq!(lines[2].section, Some(4));
        assert_ne!(lines[2].style.color, lines[0].style.color);
        assert!(lines[0].y_mm > lines[1].y_mm && lines[1].y_mm > lines[2].y_mm);
    }

    #[test]
    fn section_palette_is_distinct() {
        let colours: Vec<_> = (1..=8).map(section_color).collect();
        for (i, a) in colours.iter().enumerate() {
            for b in &colours[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(section_color(9), BLACK);
        let (r, g, b) = section_color(7);
        assert!((r - 0xc0 as f32 / 255.0).abs() < 1e-6);
        assert!((g - 0x39 as f32 / 255.0).abs() < 1e-6);
        assert!((b - 0x2b as f32 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn long_reports_paginate_within_margins() {
        let setup = PageSetup::default();
        let report = (0..200)
            .map(|i| format!("Paragraph line {}", i))
            .collect::<Vec<_>>()
            .join("\n");
        let pages = layout(&report, &setup);
        assert!(pages.len() > 1);
        for page in &pages {
            for line in &page.lines {
                assert!(line.y_mm >= setup.margin_mm);
                assert!(line.y_mm <= setup.height_mm - setup.margin_mm);
            }
        }
        let total: usize = pages.iter().map(|p| p.lines.len()).sum();
        assert_eq!(total, 200);
    }

    #[test]
    fn wrap_respects_budget_and_splits_long_words() {
        let lines = wrap("alpha beta gamma delta", 11);
        assert_eq!(lines, vec!["alpha beta", "gamma delta"]);
        let lines = wrap("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("", 10), vec![String::new()]);
    }

    #[test]
    fn pdf_text_is_latin1() {
        assert_eq!(pdf_safe("₹1,234 – ok"), "Rs.1,234 - ok");
        assert!(pdf_safe("日本").chars().all(|c| c == '?'));
    }

    #[test]
    fn filename_encodes_timestamp_and_email() {
        assert_eq!(
            report_filename("jane.doe@example.com", 1_720_000_000_000),
            "1720000000000_jane_doe_example_com_report.pdf"
        );
    }

    #[test]
    fn filename_never_contains_path_separators() {
        let name = report_filename("../a/b\\c@x.in", 1);
        assert_eq!(name, "1____a_b_c_x_in_report.pdf");
        assert!(!name.contains('/') && !name.contains('\\'));
    }

    #[test]
    fn renders_a_pdf_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.pdf");
        render_pdf("1. *Summary & Portfolio*\n₹100 invested", "Report", &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
