//! PDF → positioned text fragments.
//!
//! pdf-extract walks each page's content streams and reports every glyph together
//! with its text-rendering matrix. `FragmentCollector` turns that glyph stream
//! into word/phrase-sized fragments in top-left page coordinates.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;

use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};
use tracing::debug;

use super::models::TextFragment;
use super::ParseError;

/// Used when the PDF reports no usable font size.
pub const DEFAULT_FONT_SIZE: f32 = 10.0;

/// The `%PDF-` header must start within this many bytes.
const SIGNATURE_WINDOW: usize = 1024;

/// Where the resume bytes come from.
#[derive(Debug, Clone)]
pub enum PdfSource {
    Path(PathBuf),
    Url(String),
    Bytes(Vec<u8>),
}

/// Reads the raw bytes of a resume.
pub async fn load_pdf_bytes(source: PdfSource, http: &reqwest::Client) -> Result<Vec<u8>, ParseError> {
    match source {
        PdfSource::Bytes(bytes) => Ok(bytes),
        PdfSource::Path(path) => Ok(tokio::fs::read(&path).await?),
        PdfSource::Url(url) => {
            let response = http
                .get(&url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| ParseError::Fetch(e.to_string()))?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| ParseError::Fetch(e.to_string()))?;
            Ok(bytes.to_vec())
        }
    }
}

/// True when the `%PDF-` signature appears near the start of the buffer.
pub fn has_pdf_signature(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(SIGNATURE_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

/// Extracts positioned fragments from every page, in content-stream order.
///
/// A PDF without a text layer (e.g. a scanned image) yields an empty vector.
pub fn extract_fragments(bytes: &[u8]) -> Result<Vec<TextFragment>, ParseError> {
    if !has_pdf_signature(bytes) {
        return Err(ParseError::NotPdf);
    }

    let doc = pdf_extract::Document::load_mem(bytes)
        .map_err(|e| ParseError::Unreadable(e.to_string()))?;
    if doc.is_encrypted() {
        return Err(ParseError::Encrypted);
    }

    let mut collector = FragmentCollector::default();
    // The decoder panics on some malformed font programs instead of returning an error.
    catch_unwind(AssertUnwindSafe(|| pdf_extract::output_doc(&doc, &mut collector)))
        .map_err(|_| ParseError::Unreadable("PDF decoder panicked".to_string()))?
        .map_err(|e| ParseError::Unreadable(e.to_string()))?;

    let fragments = collector.finish();
    debug!("Extracted {} text fragments", fragments.len());
    Ok(fragments)
}

// ────────────────────────────────────────────────────────────────────────────
// Glyph collector
// ────────────────────────────────────────────────────────────────────────────

/// A fragment under construction.
struct OpenFragment {
    text: String,
    x: f32,
    baseline: f32,
    right: f32,
    font_size: f32,
}

#[derive(Default)]
struct FragmentCollector {
    page: u32,
    page_height: f64,
    current: Option<OpenFragment>,
    fragments: Vec<TextFragment>,
}

impl FragmentCollector {
    fn flush(&mut self) {
        let Some(open) = self.current.take() else {
            return;
        };
        let text = open.text.trim_end().to_string();
        if text.is_empty() {
            return;
        }
        // Approximate the glyph box from the baseline: ascent ≈ 0.8em, descent ≈ 0.2em.
        self.fragments.push(TextFragment {
            text,
            x: open.x,
            y: open.baseline - open.font_size * 0.8,
            width: (open.right - open.x).max(0.0),
            height: open.font_size,
            font_size: open.font_size,
            bold: false,
            italic: false,
            page: self.page,
        });
    }

    fn finish(mut self) -> Vec<TextFragment> {
        self.flush();
        self.fragments
    }

    fn continues(&self, open: &OpenFragment, x: f32, baseline: f32, font_size: f32) -> bool {
        let same_row = (baseline - open.baseline).abs() <= open.font_size.max(font_size) * 0.5;
        let near = (x - open.right).abs() <= font_size * 0.35;
        let same_size = (font_size - open.font_size).abs() < 0.5;
        same_row && near && same_size
    }
}

fn effective_font_size(trm: &Transform, font_size: f64) -> f32 {
    let scale = (trm.m11 * trm.m22 - trm.m12 * trm.m21).abs().sqrt();
    let size = (font_size * scale) as f32;
    if size.is_finite() && size > 0.5 {
        size
    } else {
        DEFAULT_FONT_SIZE
    }
}

impl OutputDev for FragmentCollector {
    fn begin_page(
        &mut self,
        page_num: u32,
        media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> Result<(), OutputError> {
        self.flush();
        self.page = page_num;
        self.page_height = media_box.ury - media_box.lly;
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        self.flush();
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        spacing: f64,
        font_size: f64,
        char: &str,
    ) -> Result<(), OutputError> {
        let size = effective_font_size(trm, font_size);
        let x = trm.m31 as f32;
        let baseline = (self.page_height - trm.m32) as f32;
        let horizontal_scale = (trm.m11 * trm.m11 + trm.m12 * trm.m12).sqrt();
        let advance = ((width * font_size + spacing) * horizontal_scale) as f32;
        let advance = if advance.is_finite() && advance >= 0.0 {
            advance
        } else {
            size * 0.5
        };

        let extends = self
            .current
            .as_ref()
            .is_some_and(|open| self.continues(open, x, baseline, size));

        if extends {
            if let Some(open) = self.current.as_mut() {
                open.text.push_str(char);
                open.right = x + advance;
            }
            return Ok(());
        }

        self.flush();
        if char.trim().is_empty() {
            return Ok(());
        }
        self.current = Some(OpenFragment {
            text: char.to_string(),
            x,
            baseline,
            right: x + advance,
            font_size: size,
        });
        Ok(())
    }

    fn begin_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}
