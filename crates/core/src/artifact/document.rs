//! Single-page PDF rendering for tickets.
//!
//! Coordinates are given in millimetres from the top-left corner of an A4
//! page and converted to PDF user space (points, bottom-left origin).
//! The QR symbol is drawn as filled vector squares, so the document needs
//! no image codec and stays sharp at any zoom level.

use std::fmt::Write as _;

use super::types::{Symbol, TicketMetadata};
use crate::identifiers::TicketCode;

const PT_PER_MM: f64 = 72.0 / 25.4;
const A4_WIDTH_MM: f64 = 210.0;
const A4_HEIGHT_MM: f64 = 297.0;

/// Builder for one A4 page of text and filled rectangles.
#[derive(Debug, Default)]
pub struct PdfPage {
    content: String,
}

impl PdfPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws `text` in Helvetica with its baseline at (`x_mm`, `y_mm`).
    pub fn text(&mut self, x_mm: f64, y_mm: f64, size_pt: f64, text: &str) -> &mut Self {
        let _ = writeln!(
            self.content,
            "BT /F1 {:.2} Tf {:.2} {:.2} Td ({}) Tj ET",
            size_pt,
            x_mm * PT_PER_MM,
            (A4_HEIGHT_MM - y_mm) * PT_PER_MM,
            escape_text(text)
        );
        self
    }

    /// Draws `symbol` filling a `size_mm` square whose top-left corner is at (`x_mm`, `y_mm`).
    pub fn symbol(&mut self, x_mm: f64, y_mm: f64, size_mm: f64, symbol: &Symbol) -> &mut Self {
        let module = size_mm / symbol.width() as f64;
        self.content.push_str("0 g\n");
        for row in 0..symbol.width() {
            for col in 0..symbol.width() {
                if !symbol.is_dark(col, row) {
                    continue;
                }
                let left = x_mm + col as f64 * module;
                let bottom = y_mm + (row + 1) as f64 * module;
                let _ = writeln!(
                    self.content,
                    "{:.3} {:.3} {:.3} {:.3} re",
                    left * PT_PER_MM,
                    (A4_HEIGHT_MM - bottom) * PT_PER_MM,
                    module * PT_PER_MM,
                    module * PT_PER_MM
                );
            }
        }
        self.content.push_str("f\n");
        self
    }

    /// Serializes the page as a complete PDF 1.4 file.
    pub fn finish(&self) -> Vec<u8> {
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>",
                A4_WIDTH_MM * PT_PER_MM,
                A4_HEIGHT_MM * PT_PER_MM
            ),
            format!(
                "<< /Length {} >>\nstream\n{}endstream",
                self.content.len(),
                self.content
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        ];

        let mut out = String::from("%PDF-1.4\n");
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            let _ = write!(out, "{} 0 obj\n{}\nendobj\n", i + 1, body);
        }

        let xref_offset = out.len();
        let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            let _ = write!(out, "{:010} 00000 n \n", offset);
        }
        let _ = write!(
            out,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        );

        out.into_bytes()
    }
}

/// Escapes a string for a PDF literal under WinAnsiEncoding.
///
/// Latin-1 letters are written as octal escapes so the content stream stays
/// ASCII and byte offsets match the `String` length. Control characters and
/// anything above U+00FF become `?`.
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            ' '..='~' => escaped.push(c),
            '\u{a0}'..='\u{ff}' => {
                let _ = write!(escaped, "\\{:03o}", c as u32);
            }
            _ => escaped.push('?'),
        }
    }
    escaped
}

/// Lays out a ticket: heading, QR symbol, then the ticket details.
pub fn render_ticket(code: &TicketCode, meta: &TicketMetadata, symbol: &Symbol) -> Vec<u8> {
    let mut page = PdfPage::new();
    page.text(80.0, 32.0, 28.0, "Your Ticket")
        .symbol(50.0, 50.0, 100.0, symbol)
        .text(50.0, 157.0, 16.0, &format!("Event: {}", meta.event_name))
        .text(50.0, 167.0, 16.0, &format!("Name: {}", meta.user_name))
        .text(50.0, 177.0, 16.0, &format!("Email: {}", meta.buyer_email))
        .text(50.0, 187.0, 16.0, &format!("Location: {}", meta.venue))
        .text(50.0, 197.0, 16.0, &format!("Date & Time: {}", meta.date))
        .text(50.0, 207.0, 16.0, &format!("Ticket: {} of event {}", meta.index, meta.event_id))
        .text(25.0, 222.0, 9.0, code.as_str());
    page.finish()
}
