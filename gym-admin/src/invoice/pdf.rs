//! PDF rendering of an [`InvoiceLayout`] through `printpdf`.
//!
//! The page is A4 portrait. Text is set in DejaVu Sans, embedded in the
//! binary, so member names and currency symbols outside Latin-1 survive.
//! Characters the font has no glyph for are still left out by `printpdf`;
//! they are reported with a warning.

use printpdf::{
    Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rgb,
};
use tracing::warn;
use ttf_parser::Face;

use super::{
    DocumentRenderer,
    layout::{Cell, Header, InvoiceLayout, Section},
};
use crate::{
    error::{AdminError, Result},
    settings::LogoImage,
};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const RIGHT_COLUMN_X: f32 = 110.0;
const VALUE_OFFSET: f32 = 40.0;
const LINE_HEIGHT: f32 = 6.0;
const PT_TO_MM: f32 = 0.352_778;

const REGULAR_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
const BOLD_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

const LOGO_MAX_WIDTH: f32 = 32.0;
const LOGO_MAX_HEIGHT: f32 = 16.0;
const LOGO_DPI: f32 = 300.0;

const TITLE_SIZE: f32 = 20.0;
const NUMBER_SIZE: f32 = 14.0;
const SECTION_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 10.0;

fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(Rgb::new(f32::from(r) / 255.0, f32::from(g) / 255.0, f32::from(b) / 255.0, None))
}

fn render_error(error: impl std::fmt::Display) -> AdminError {
    AdminError::Render(error.to_string())
}

/// An embedded font: the document's reference plus the parsed face for metrics.
struct Typeface {
    font: IndirectFontRef,
    face: Face<'static>,
}

impl Typeface {
    fn embed(doc: &PdfDocumentReference, bytes: &'static [u8]) -> Result<Self> {
        let face = Face::parse(bytes, 0).map_err(render_error)?;
        let font = doc.add_external_font(bytes).map_err(render_error)?;
        Ok(Self { font, face })
    }

    /// Characters of `text` this face cannot draw.
    fn missing_glyphs(&self, text: &str) -> String {
        text.chars().filter(|c| !c.is_control() && self.face.glyph_index(*c).is_none()).collect()
    }

    #[allow(clippy::cast_precision_loss, reason = "advance sums are far below f32 precision limits")]
    fn width(&self, text: &str, size: f32) -> f32 {
        let advance: u32 = text
            .chars()
            .filter_map(|c| self.face.glyph_index(c))
            .filter_map(|glyph| self.face.glyph_hor_advance(glyph))
            .map(u32::from)
            .sum();
        advance as f32 / f32::from(self.face.units_per_em()) * size * PT_TO_MM
    }
}

/// Renders invoices as single-page PDF documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

impl PdfRenderer {
    /// Creates a renderer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

struct Pen<'a> {
    layer: &'a PdfLayerReference,
    regular: &'a Typeface,
    bold: &'a Typeface,
}

impl Pen<'_> {
    fn text(&self, text: &str, size: f32, x: f32, y: f32, bold: bool) {
        let typeface = if bold { self.bold } else { self.regular };
        let missing = typeface.missing_glyphs(text);
        if !missing.is_empty() {
            warn!(text, missing = %missing, "invoice font has no glyph, characters left out");
        }
        self.layer.use_text(text, size, Mm(x), Mm(y), &typeface.font);
    }

    fn color(&self, color: Color) {
        self.layer.set_fill_color(color);
    }

    fn header(&self, header: &Header) {
        let top = PAGE_HEIGHT - MARGIN;
        if let Some(logo) = &header.logo {
            self.logo(logo, top);
        }

        self.color(rgb(0x22, 0x22, 0x22));
        let title_y = top - 8.0;
        let title_x = PAGE_WIDTH - MARGIN - self.bold.width(&header.title, TITLE_SIZE);
        self.text(&header.title, TITLE_SIZE, title_x.max(RIGHT_COLUMN_X), title_y, true);

        self.color(rgb(0x88, 0x88, 0x88));
        let number_x =
            PAGE_WIDTH - MARGIN - self.regular.width(&header.invoice_number, NUMBER_SIZE);
        self.text(&header.invoice_number, NUMBER_SIZE, number_x.max(RIGHT_COLUMN_X), title_y - 9.0, false);
        self.color(rgb(0x22, 0x22, 0x22));
    }

    #[allow(clippy::cast_precision_loss, reason = "image dimensions are far below f32 precision limits")]
    fn logo(&self, logo: &LogoImage, top: f32) {
        let image = match printpdf::image_crate::load_from_memory(&logo.bytes) {
            Ok(image) => image,
            Err(error) => {
                warn!(logo = %logo.path, error = %error, "logo could not be decoded, skipping");
                return;
            }
        };
        let natural_width = image.width() as f32 / LOGO_DPI * 25.4;
        let natural_height = image.height() as f32 / LOGO_DPI * 25.4;
        if natural_width <= 0.0 || natural_height <= 0.0 {
            return;
        }
        let scale = (LOGO_MAX_WIDTH / natural_width).min(LOGO_MAX_HEIGHT / natural_height);
        Image::from_dynamic_image(&image).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN)),
                translate_y: Some(Mm(top - natural_height * scale)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(LOGO_DPI),
                ..ImageTransform::default()
            },
        );
    }

    /// Draws one section at column `x`; returns the y below its last row.
    fn section(&self, section: &Section, x: f32, top: f32) -> f32 {
        self.color(rgb(0x44, 0x44, 0x44));
        self.text(&section.title, SECTION_SIZE, x, top, true);
        self.color(rgb(0x22, 0x22, 0x22));

        let mut y = top - LINE_HEIGHT - 1.0;
        for row in &section.rows {
            let value_x = match &row.label {
                Some(label) => {
                    self.text(label, BODY_SIZE, x, y, false);
                    x + VALUE_OFFSET
                }
                None => x,
            };
            match &row.value {
                Cell::Text(text) => self.text(text, BODY_SIZE, value_x, y, false),
                Cell::Badge(badge) => {
                    let (r, g, b) = badge.tone.rgb();
                    self.color(rgb(r, g, b));
                    self.text(&badge.label, BODY_SIZE, value_x, y, true);
                    self.color(rgb(0x22, 0x22, 0x22));
                }
            }
            y -= LINE_HEIGHT;
        }
        y
    }

    /// Draws two sections side by side; returns the lower of their ends.
    fn band(&self, sections: &[Section; 2], top: f32) -> f32 {
        let left = self.section(&sections[0], MARGIN, top);
        let right = self.section(&sections[1], RIGHT_COLUMN_X, top);
        left.min(right)
    }

    fn divider(&self, y: f32) {
        self.layer.set_outline_color(rgb(0xee, 0xee, 0xee));
        self.layer.set_outline_thickness(0.8);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN), Mm(y)), false),
                (Point::new(Mm(PAGE_WIDTH - MARGIN), Mm(y)), false),
            ],
            is_closed: false,
        });
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, layout: &InvoiceLayout) -> Result<Vec<u8>> {
        let (doc, page, layer) = PdfDocument::new(
            layout.header.invoice_number.clone(),
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            "invoice",
        );
        let regular = Typeface::embed(&doc, REGULAR_FONT)?;
        let bold = Typeface::embed(&doc, BOLD_FONT)?;

        {
            let layer = doc.get_page(page).get_layer(layer);
            let pen = Pen { layer: &layer, regular: &regular, bold: &bold };
            pen.header(&layout.header);

            let upper_end = pen.band(&layout.upper, PAGE_HEIGHT - MARGIN - 45.0);
            let divider_y = upper_end - 4.0;
            pen.divider(divider_y);
            pen.band(&layout.lower, divider_y - 12.0);
        }

        doc.save_to_bytes().map_err(render_error)
    }
}
