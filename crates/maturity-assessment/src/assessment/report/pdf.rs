//! Minimal PDF 1.4 writer for the maturity report.
//!
//! Uses the base-14 Helvetica faces, so no font program is embedded. Charts are drawn as vector
//! paths; a JPEG logo is passed through with `DCTDecode`, a PNG logo is stored with `FlateDecode`
//! and its alpha channel, if any, as a soft mask.

use super::super::charts::{ChartElement, ChartImage, Color, TextAnchor};
use super::branding::{Logo, LogoData};
use super::builder::Report;
use std::io::Write;

/// Turns an assembled report into a downloadable byte stream.
pub trait ReportRenderer: Send + Sync {
    fn content_type(&self) -> &'static str;
    fn file_name(&self) -> &'static str;
    fn render(&self, report: &Report) -> Result<Vec<u8>, RenderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to write report bytes: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfRenderer;

impl ReportRenderer for PdfRenderer {
    fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    fn file_name(&self) -> &'static str {
        "maturity_report.pdf"
    }

    fn render(&self, report: &Report) -> Result<Vec<u8>, RenderError> {
        let mut pages = Vec::with_capacity(report.charts.len() + 2);
        pages.push(cover_page(report)?);
        for chart in &report.charts {
            let mut page = Page::new();
            page.chart(chart, mm(10.0), mm(20.0), mm(180.0))?;
            pages.push(page);
        }
        pages.extend(recommendation_pages(report)?);

        write_document(report, &pages)
    }
}

const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const GLYPH_WIDTH: f32 = 0.52;

fn mm(value: f32) -> f32 {
    value * 72.0 / 25.4
}

#[derive(Debug, Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "/F1",
            Font::Bold => "/F2",
        }
    }
}

/// One page's content stream, addressed in top-left millimetre-free point coordinates.
struct Page {
    content: Vec<u8>,
    has_logo: bool,
}

impl Page {
    fn new() -> Self {
        Self {
            content: Vec::new(),
            has_logo: false,
        }
    }

    fn text(
        &mut self,
        x: f32,
        top: f32,
        size: f32,
        font: Font,
        color: Color,
        content: &str,
    ) -> std::io::Result<()> {
        write!(
            self.content,
            "BT {} {:.2} Tf {} rg {:.2} {:.2} Td (",
            font.resource(),
            size,
            fill_components(color),
            x,
            PAGE_HEIGHT - top
        )?;
        self.content.extend(pdf_string(content));
        self.content.extend_from_slice(b") Tj ET\n");
        Ok(())
    }

    fn centered_text(
        &mut self,
        top: f32,
        size: f32,
        font: Font,
        content: &str,
    ) -> std::io::Result<()> {
        let x = (PAGE_WIDTH - text_width(content, size)) / 2.0;
        self.text(x, top, size, font, Color::BLACK, content)
    }

    fn logo(&mut self, width: f32, height: f32, x: f32, top: f32) -> std::io::Result<()> {
        self.has_logo = true;
        writeln!(
            self.content,
            "q {:.2} 0 0 {:.2} {:.2} {:.2} cm /Im1 Do Q",
            width,
            height,
            x,
            PAGE_HEIGHT - top - height
        )
    }

    fn chart(
        &mut self,
        chart: &ChartImage,
        left: f32,
        top: f32,
        width: f32,
    ) -> std::io::Result<()> {
        let scale = width / chart.width;
        let px = |x: f32| left + x * scale;
        let py = |y: f32| PAGE_HEIGHT - top - y * scale;

        for element in &chart.elements {
            match element {
                ChartElement::Rect {
                    x,
                    y,
                    width,
                    height,
                    fill,
                    stroke,
                } => {
                    write!(self.content, "{} rg ", fill_components(*fill))?;
                    let op = match stroke {
                        Some(stroke) => {
                            write!(self.content, "{} RG 0.5 w ", stroke_components(*stroke))?;
                            "B"
                        }
                        None => "f",
                    };
                    writeln!(
                        self.content,
                        "{:.2} {:.2} {:.2} {:.2} re {op}",
                        px(*x),
                        py(y + height),
                        width * scale,
                        height * scale
                    )?;
                }
                ChartElement::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    color,
                } => {
                    writeln!(
                        self.content,
                        "{} RG 0.5 w {:.2} {:.2} m {:.2} {:.2} l S",
                        stroke_components(*color),
                        px(*x1),
                        py(*y1),
                        px(*x2),
                        py(*y2)
                    )?;
                }
                ChartElement::Text {
                    x,
                    y,
                    size,
                    bold,
                    anchor,
                    color,
                    content,
                } => {
                    let size = size * scale;
                    let offset = match anchor {
                        TextAnchor::Start => 0.0,
                        TextAnchor::Middle => text_width(content, size) / 2.0,
                        TextAnchor::End => text_width(content, size),
                    };
                    let font = if *bold { Font::Bold } else { Font::Regular };
                    self.text(
                        px(*x) - offset,
                        top + y * scale,
                        size,
                        font,
                        *color,
                        content,
                    )?;
                }
            }
        }
        Ok(())
    }
}

fn cover_page(report: &Report) -> std::io::Result<Page> {
    let mut page = Page::new();
    if let Some(logo) = &report.logo {
        let width = mm(30.0);
        let height = width * logo.height as f32 / logo.width.max(1) as f32;
        page.logo(width, height, mm(10.0), mm(10.0))?;
    }

    let mut cursor = mm(10.0) + mm(20.0);
    page.centered_text(cursor, 14.0, Font::Bold, report.title)?;
    cursor += mm(20.0);
    for line in report.header_lines() {
        page.text(mm(10.0), cursor, 12.0, Font::Regular, Color::BLACK, &line)?;
        cursor += mm(10.0);
    }
    page.text(
        mm(10.0),
        cursor,
        12.0,
        Font::Regular,
        Color::BLACK,
        &report.overall_line(),
    )?;
    Ok(page)
}

fn recommendation_pages(report: &Report) -> std::io::Result<Vec<Page>> {
    let line_height = mm(8.0);
    let bottom = PAGE_HEIGHT - mm(15.0);
    let max_width = PAGE_WIDTH - 2.0 * mm(10.0);

    let mut pages = Vec::new();
    let mut page = Page::new();
    let mut cursor = mm(10.0) + mm(7.0);
    page.text(
        mm(10.0),
        cursor,
        12.0,
        Font::Bold,
        Color::BLACK,
        "Domain Recommendations",
    )?;
    cursor += mm(10.0);

    for line in report.recommendation_lines() {
        for wrapped in wrap(&line, 10.0, max_width) {
            if cursor > bottom {
                pages.push(std::mem::replace(&mut page, Page::new()));
                cursor = mm(10.0) + mm(7.0);
            }
            page.text(mm(10.0), cursor, 10.0, Font::Regular, Color::BLACK, &wrapped)?;
            cursor += line_height;
        }
    }

    pages.push(page);
    Ok(pages)
}

fn write_document(report: &Report, pages: &[Page]) -> Result<Vec<u8>, RenderError> {
    const CATALOG: usize = 1;
    const PAGES: usize = 2;
    const FONT_REGULAR: usize = 3;
    const FONT_BOLD: usize = 4;
    const INFO: usize = 5;
    const LOGO: usize = 6;

    let logo_streams = report
        .logo
        .as_ref()
        .map(|logo| logo_objects(logo, LOGO))
        .unwrap_or_default();
    let first_page = LOGO + logo_streams.len();
    let page_id = |index: usize| first_page + index * 2;

    let mut objects: Vec<Vec<u8>> = Vec::new();

    let kids: Vec<String> = (0..pages.len())
        .map(|index| format!("{} 0 R", page_id(index)))
        .collect();
    objects.push(format!("<< /Type /Catalog /Pages {PAGES} 0 R >>").into_bytes());
    objects.push(
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        )
        .into_bytes(),
    );
    objects.push(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    );
    objects.push(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    );

    let mut info = b"<< /Title (".to_vec();
    info.extend(pdf_string(report.title));
    info.extend_from_slice(b") /Author (");
    info.extend(pdf_string(&report.metadata.assessor));
    info.extend_from_slice(b") /Subject (");
    info.extend(pdf_string(&report.metadata.organization));
    write!(
        info,
        ") /CreationDate (D:{}) /Producer (maturity-assessment) >>",
        report.metadata.date.format("%Y%m%d")
    )?;
    objects.push(info);

    objects.extend(logo_streams);

    for (index, page) in pages.iter().enumerate() {
        let xobject = if page.has_logo && report.logo.is_some() {
            format!(" /XObject << /Im1 {LOGO} 0 R >>")
        } else {
            String::new()
        };
        objects.push(
            format!(
                "<< /Type /Page /Parent {PAGES} 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] /Resources << /Font << /F1 {FONT_REGULAR} 0 R /F2 {FONT_BOLD} 0 R >>{xobject} >> /Contents {} 0 R >>",
                page_id(index) + 1
            )
            .into_bytes(),
        );
        objects.push(stream_object("", &page.content));
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        write!(out, "{} 0 obj\n", index + 1)?;
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref = out.len();
    write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1)?;
    for offset in offsets {
        write!(out, "{offset:010} 00000 n \n")?;
    }
    write!(
        out,
        "trailer\n<< /Size {} /Root {CATALOG} 0 R /Info {INFO} 0 R >>\nstartxref\n{xref}\n%%EOF\n",
        objects.len() + 1
    )?;

    Ok(out)
}

/// Image XObject for the logo at `image_id`, followed by its soft mask when it has one.
fn logo_objects(logo: &Logo, image_id: usize) -> Vec<Vec<u8>> {
    let color_space = match logo.components {
        1 => "/DeviceGray",
        4 => "/DeviceCMYK",
        _ => "/DeviceRGB",
    };
    let image = |color_space: &str, filter: &str, extra: &str, data: &[u8]| {
        stream_object(
            &format!(
                "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {color_space} /BitsPerComponent 8 /Filter {filter}{extra} ",
                logo.width, logo.height
            ),
            data,
        )
    };

    match &logo.data {
        LogoData::Jpeg(bytes) => vec![image(color_space, "/DCTDecode", "", bytes)],
        LogoData::Flate { samples, alpha } => match alpha {
            Some(mask) => vec![
                image(
                    color_space,
                    "/FlateDecode",
                    &format!(" /SMask {} 0 R", image_id + 1),
                    samples,
                ),
                image("/DeviceGray", "/FlateDecode", "", mask),
            ],
            None => vec![image(color_space, "/FlateDecode", "", samples)],
        },
    }
}

fn stream_object(dict: &str, data: &[u8]) -> Vec<u8> {
    let mut object = format!("<< {dict}/Length {} >>\nstream\n", data.len()).into_bytes();
    object.extend_from_slice(data);
    object.extend_from_slice(b"\nendstream");
    object
}

fn fill_components(color: Color) -> String {
    format!(
        "{:.3} {:.3} {:.3}",
        f32::from(color.r) / 255.0,
        f32::from(color.g) / 255.0,
        f32::from(color.b) / 255.0
    )
}

fn stroke_components(color: Color) -> String {
    fill_components(color)
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * GLYPH_WIDTH
}

/// Greedy word wrap against the approximate glyph width.
fn wrap(text: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if !current.is_empty() && text_width(&candidate, size) > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Literal string body in WinAnsiEncoding, matching the font dictionaries; unmappable
/// characters become `?`.
fn pdf_string(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let byte = win_ansi(ch).unwrap_or(b'?');
        if matches!(byte, b'(' | b')' | b'\\') {
            out.push(b'\\');
        }
        out.push(byte);
    }
    out
}

fn win_ansi(ch: char) -> Option<u8> {
    match u32::from(ch) {
        code @ (0x20..=0x7E | 0xA0..=0xFF) => u8::try_from(code).ok(),
        _ => WIN_ANSI_HIGH
            .iter()
            .find(|(mapped, _)| *mapped == ch)
            .map(|(_, byte)| *byte),
    }
}

/// Byte codes 0x80-0x9F, where WinAnsiEncoding departs from Latin-1.
const WIN_ANSI_HIGH: [(char, u8); 27] = [
    ('\u{20AC}', 0x80),
    ('\u{201A}', 0x82),
    ('\u{0192}', 0x83),
    ('\u{201E}', 0x84),
    ('\u{2026}', 0x85),
    ('\u{2020}', 0x86),
    ('\u{2021}', 0x87),
    ('\u{02C6}', 0x88),
    ('\u{2030}', 0x89),
    ('\u{0160}', 0x8A),
    ('\u{2039}', 0x8B),
    ('\u{0152}', 0x8C),
    ('\u{017D}', 0x8E),
    ('\u{2018}', 0x91),
    ('\u{2019}', 0x92),
    ('\u{201C}', 0x93),
    ('\u{201D}', 0x94),
    ('\u{2022}', 0x95),
    ('\u{2013}', 0x96),
    ('\u{2014}', 0x97),
    ('\u{02DC}', 0x98),
    ('\u{2122}', 0x99),
    ('\u{0161}', 0x9A),
    ('\u{203A}', 0x9B),
    ('\u{0153}', 0x9C),
    ('\u{017E}', 0x9E),
    ('\u{0178}', 0x9F),
];
