use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Point, Pt, RawImage, TextItem,
    XObjectTransform,
};
use std::path::Path;
use tracing::debug;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;
const FONT_SIZE_PT: f32 = 10.0;
const LINE_HEIGHT_MM: f32 = 4.5;
const MAX_LINE_CHARS: usize = 120;
const RENDER_DPI: f32 = 96.0;

#[derive(Debug)]
pub enum RenderError {
    Io(std::io::Error),
    Decode(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Io(err) => write!(f, "IO error: {err}"),
            RenderError::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::Io(err)
    }
}

/// Paginated plain-text rendering: monospace, long lines clipped, a fresh
/// page whenever the cursor runs off the bottom margin.
pub fn text_to_pdf(src: &Path, dst: &Path) -> Result<(), RenderError> {
    let raw = std::fs::read(src)?;
    let text = String::from_utf8_lossy(&raw);

    let lines_per_page =
        (((PAGE_HEIGHT_MM - 2.0 * MARGIN_MM) / LINE_HEIGHT_MM) as usize).max(1);

    let mut doc = PdfDocument::new(&src.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default());
    let mut pages = Vec::new();
    let lines: Vec<&str> = text.lines().collect();

    for chunk in lines.chunks(lines_per_page.max(1)) {
        let mut ops = vec![
            Op::StartTextSection,
            Op::SetFontSizeBuiltinFont {
                size: Pt(FONT_SIZE_PT),
                font: BuiltinFont::Courier,
            },
        ];
        let mut y = PAGE_HEIGHT_MM - MARGIN_MM;
        for line in chunk {
            let clipped: String = line.chars().take(MAX_LINE_CHARS).collect();
            ops.push(Op::SetTextCursor {
                pos: Point {
                    x: Mm(MARGIN_MM).into(),
                    y: Mm(y).into(),
                },
            });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(clipped)],
                font: BuiltinFont::Courier,
            });
            y -= LINE_HEIGHT_MM;
        }
        ops.push(Op::EndTextSection);
        pages.push(PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), ops));
    }

    if pages.is_empty() {
        pages.push(PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), vec![]));
    }

    let mut warnings = Vec::new();
    let bytes = doc
        .with_pages(pages)
        .save(&PdfSaveOptions::default(), &mut warnings);
    for warning in &warnings {
        debug!("printpdf warning for {}: {:?}", src.display(), warning);
    }
    std::fs::write(dst, bytes)?;
    Ok(())
}

/// Single-page raster embedding, page sized to the image at a fixed DPI.
pub fn image_to_pdf(src: &Path, dst: &Path) -> Result<(), RenderError> {
    let raw = std::fs::read(src)?;
    let mut warnings = Vec::new();
    let image = RawImage::decode_from_bytes(&raw, &mut warnings)
        .map_err(|msg| RenderError::Decode(msg.to_string()))?;

    let page_w = Mm(image.width as f32 * 25.4 / RENDER_DPI);
    let page_h = Mm(image.height as f32 * 25.4 / RENDER_DPI);

    let mut doc = PdfDocument::new(&src.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default());
    let image_id = doc.add_image(&image);
    let ops = vec![Op::UseXobject {
        id: image_id,
        transform: XObjectTransform {
            dpi: Some(RENDER_DPI),
            ..Default::default()
        },
    }];
    let page = PdfPage::new(page_w, page_h, ops);

    let bytes = doc
        .with_pages(vec![page])
        .save(&PdfSaveOptions::default(), &mut warnings);
    for warning in &warnings {
        debug!("printpdf warning for {}: {:?}", src.display(), warning);
    }
    std::fs::write(dst, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn text_render_produces_pdf_magic() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("notes.txt");
        let dst = tmp.path().join("notes.pdf");
        let long_line = "x".repeat(500);
        let body: String = (0..200)
            .map(|i| format!("line {i} {long_line}\n"))
            .collect();
        std::fs::write(&src, body).unwrap();

        text_to_pdf(&src, &dst).unwrap();
        let bytes = std::fs::read(&dst).unwrap();
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[0..4], b"%PDF");
    }

    #[test]
    fn empty_text_still_renders_a_page() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("empty.txt");
        let dst = tmp.path().join("empty.pdf");
        std::fs::write(&src, "").unwrap();

        text_to_pdf(&src, &dst).unwrap();
        assert_eq!(&std::fs::read(&dst).unwrap()[0..4], b"%PDF");
    }

    #[test]
    fn garbage_image_is_a_decode_error() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("broken.png");
        let dst = tmp.path().join("broken.pdf");
        std::fs::write(&src, b"not an image at all").unwrap();

        assert!(matches!(
            image_to_pdf(&src, &dst),
            Err(RenderError::Decode(_))
        ));
    }
}
