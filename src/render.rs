//! Document renderer: markdown narrative to a paginated PDF.
//!
//! The markdown is parsed line-wise into a small block model (headings,
//! paragraphs, bullet items, fenced code) which is laid out with printpdf
//! builtin fonts. Styling is a fixed built-in [`Style`]; there is no
//! external stylesheet input.

use printpdf::{BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Point, Pt, TextItem};
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

use crate::workspace::Workspace;

#[derive(Debug)]
pub enum RenderError {
    /// The markdown input file is absent.
    MissingInput(PathBuf),
    Io(std::io::Error),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::MissingInput(path) => {
                write!(f, "markdown input not found: {}", path.display())
            }
            RenderError::Io(e) => write!(f, "render I/O failed: {e}"),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<std::io::Error> for RenderError {
    fn from(e: std::io::Error) -> Self {
        RenderError::Io(e)
    }
}

/// Structural block of the narrative document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    Bullet(String),
    Code(Vec<String>),
}

/// Fixed page metrics and font sizes (all sizes in points, page in mm).
#[derive(Debug, Clone)]
pub struct Style {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub body_size: f32,
    pub code_size: f32,
    pub line_spacing: f32,
}

impl Default for Style {
    fn default() -> Self {
        // A4 portrait, sans-serif body, monospaced code.
        Self {
            page_width: 210.0,
            page_height: 297.0,
            margin: 20.0,
            body_size: 11.0,
            code_size: 9.5,
            line_spacing: 1.4,
        }
    }
}

impl Style {
    fn heading_size(&self, level: u8) -> f32 {
        match level {
            1 => 22.0,
            2 => 17.0,
            3 => 14.0,
            _ => 12.0,
        }
    }
}

/// Strips the inline emphasis markers the builtin fonts cannot express.
fn clean_inline(text: &str) -> String {
    text.replace("**", "").replace('`', "")
}

/// Line-wise markdown parser covering the structures the summariser emits:
/// ATX headings, fenced code blocks, bullet items and paragraphs.
pub fn parse_markdown(markdown: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();
    let mut code: Option<Vec<String>> = None;

    fn flush_paragraph(paragraph: &mut Vec<String>, blocks: &mut Vec<Block>) {
        if !paragraph.is_empty() {
            blocks.push(Block::Paragraph(paragraph.join(" ")));
            paragraph.clear();
        }
    }

    for line in markdown.lines() {
        if code.is_some() {
            if line.trim_start().starts_with("```") {
                blocks.push(Block::Code(code.take().unwrap_or_default()));
            } else if let Some(code_lines) = code.as_mut() {
                code_lines.push(line.to_string());
            }
            continue;
        }

        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            flush_paragraph(&mut paragraph, &mut blocks);
            code = Some(Vec::new());
        } else if trimmed.is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
        } else if let Some(rest) = heading_line(trimmed) {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::Heading {
                level: rest.0,
                text: clean_inline(rest.1),
            });
        } else if let Some(item) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::Bullet(clean_inline(item)));
        } else {
            paragraph.push(clean_inline(trimmed));
        }
    }

    // Unterminated fence: keep the collected lines rather than dropping them.
    if let Some(code_lines) = code.take() {
        blocks.push(Block::Code(code_lines));
    }
    flush_paragraph(&mut paragraph, &mut blocks);
    blocks
}

fn heading_line(line: &str) -> Option<(u8, &str)> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&hashes) {
        if let Some(rest) = line[hashes..].strip_prefix(' ') {
            return Some((hashes as u8, rest.trim()));
        }
    }
    None
}

struct LayoutLine {
    text: String,
    size: f32,
    font: BuiltinFont,
    gap_before: f32,
}

/// Greedy word wrap against an approximate glyph width for the builtin
/// fonts. Not typographically exact, but stable and deterministic.
fn wrap(text: &str, size: f32, glyph_factor: f32, usable_width_pt: f32) -> Vec<String> {
    let max_chars = ((usable_width_pt / (size * glyph_factor)) as usize).max(8);
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn layout(blocks: &[Block], style: &Style) -> Vec<LayoutLine> {
    const MM_PER_PT: f32 = 0.352_778;
    let usable_width_pt = (style.page_width - 2.0 * style.margin) / MM_PER_PT;
    let mut lines = Vec::new();

    for block in blocks {
        match block {
            Block::Heading { level, text } => {
                let size = style.heading_size(*level);
                for (i, text) in wrap(text, size, 0.52, usable_width_pt).into_iter().enumerate() {
                    lines.push(LayoutLine {
                        text,
                        size,
                        font: BuiltinFont::HelveticaBold,
                        gap_before: if i == 0 { size * 0.8 } else { 0.0 },
                    });
                }
            }
            Block::Paragraph(text) => {
                for (i, text) in wrap(text, style.body_size, 0.5, usable_width_pt)
                    .into_iter()
                    .enumerate()
                {
                    lines.push(LayoutLine {
                        text,
                        size: style.body_size,
                        font: BuiltinFont::Helvetica,
                        gap_before: if i == 0 { style.body_size * 0.5 } else { 0.0 },
                    });
                }
            }
            Block::Bullet(text) => {
                for (i, text) in wrap(text, style.body_size, 0.5, usable_width_pt - 15.0)
                    .into_iter()
                    .enumerate()
                {
                    lines.push(LayoutLine {
                        text: if i == 0 {
                            format!("- {text}")
                        } else {
                            format!("  {text}")
                        },
                        size: style.body_size,
                        font: BuiltinFont::Helvetica,
                        gap_before: if i == 0 { style.body_size * 0.25 } else { 0.0 },
                    });
                }
            }
            Block::Code(code_lines) => {
                for (i, text) in code_lines.iter().enumerate() {
                    for (j, text) in wrap(text, style.code_size, 0.6, usable_width_pt)
                        .into_iter()
                        .enumerate()
                    {
                        lines.push(LayoutLine {
                            text,
                            size: style.code_size,
                            font: BuiltinFont::Courier,
                            gap_before: if i == 0 && j == 0 { style.code_size * 0.5 } else { 0.0 },
                        });
                    }
                }
            }
        }
    }
    lines
}

/// Renders markdown text to PDF bytes using the fixed style.
pub fn markdown_to_pdf(markdown: &str, title: &str, style: &Style) -> Vec<u8> {
    const MM_PER_PT: f32 = 0.352_778;
    let blocks = parse_markdown(markdown);
    let lines = layout(&blocks, style);

    let mut pages: Vec<PdfPage> = Vec::new();
    let mut ops: Vec<Op> = Vec::new();
    let mut cursor_mm = style.page_height - style.margin;

    for line in lines {
        let advance_mm = (line.gap_before + line.size * style.line_spacing) * MM_PER_PT;
        if cursor_mm - advance_mm < style.margin {
            pages.push(PdfPage::new(
                Mm(style.page_width),
                Mm(style.page_height),
                std::mem::take(&mut ops),
            ));
            cursor_mm = style.page_height - style.margin;
        }
        cursor_mm -= advance_mm;

        if !line.text.is_empty() {
            ops.push(Op::StartTextSection);
            ops.push(Op::SetTextCursor {
                pos: Point::new(Mm(style.margin), Mm(cursor_mm)),
            });
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(line.size),
                font: line.font,
            });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(line.text)],
                font: line.font,
            });
            ops.push(Op::EndTextSection);
        }
    }
    pages.push(PdfPage::new(
        Mm(style.page_width),
        Mm(style.page_height),
        ops,
    ));

    let mut warnings = Vec::new();
    let mut doc = PdfDocument::new(title);
    doc.with_pages(pages)
        .save(&PdfSaveOptions::default(), &mut warnings)
}

/// Renders `summary.md` to `output.pdf`. Fails with a clear error when the
/// markdown input is absent instead of failing opaquely mid-render.
pub fn render_report(workspace: &Workspace) -> Result<PathBuf, RenderError> {
    let input = workspace.summary_md();
    if !input.exists() {
        error!(path = %input.display(), "Markdown input for rendering is missing");
        return Err(RenderError::MissingInput(input));
    }

    let markdown = fs::read_to_string(&input)?;
    let bytes = markdown_to_pdf(&markdown, "Repository Report", &Style::default());

    let output = workspace.output_pdf();
    fs::write(&output, &bytes)?;
    info!(
        path = %output.display(),
        size = bytes.len(),
        "Rendered markdown narrative to PDF"
    );
    Ok(output)
}
