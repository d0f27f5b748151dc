// 🎨 Badge Renderer - Colors + Text + Icon → SVG
// Flat two-panel badge in the shields.io layout. Same input, same bytes.

use crate::error::BadgeError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Media type of every rendered badge
pub const SVG_MEDIA_TYPE: &str = "image/svg+xml";

const BADGE_HEIGHT: u32 = 20;
const HORIZONTAL_PADDING: f64 = 10.0;
const LOGO_WIDTH: f64 = 14.0;
const LOGO_PADDING: f64 = 3.0;

// ============================================================================
// PALETTE
// ============================================================================

/// Fixed badge palette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeColor {
    Blue,
    Green,
    Yellow,
    Red,
}

impl BadgeColor {
    pub fn name(&self) -> &'static str {
        match self {
            BadgeColor::Blue => "blue",
            BadgeColor::Green => "green",
            BadgeColor::Yellow => "yellow",
            BadgeColor::Red => "red",
        }
    }

    /// Fill used in the SVG
    pub fn hex(&self) -> &'static str {
        match self {
            BadgeColor::Blue => "#007ec6",
            BadgeColor::Green => "#97ca00",
            BadgeColor::Yellow => "#dfb317",
            BadgeColor::Red => "#e05d44",
        }
    }
}

// ============================================================================
// STATUS ICONS
// ============================================================================

/// Icon shown on the left panel, one per lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIcon {
    Cutover,
    PreCutover,
    Inactive,
}

impl StatusIcon {
    /// Public location of the icon
    pub fn url(&self) -> &'static str {
        match self {
            StatusIcon::Cutover => "https://stato-migrazione.anpr.it/img/hand_subentro.svg",
            StatusIcon::PreCutover => "https://stato-migrazione.anpr.it/img/hand_presubentro.svg",
            StatusIcon::Inactive => "https://stato-migrazione.anpr.it/img/thumb-down.svg",
        }
    }

    /// Bundled copy of the icon, embedded without touching the network
    pub fn svg(&self) -> &'static str {
        match self {
            StatusIcon::Cutover => include_str!("../assets/hand_subentro.svg"),
            StatusIcon::PreCutover => include_str!("../assets/hand_presubentro.svg"),
            StatusIcon::Inactive => include_str!("../assets/thumb-down.svg"),
        }
    }

    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            SVG_MEDIA_TYPE,
            STANDARD.encode(self.svg().trim_end())
        )
    }
}

// ============================================================================
// RENDER INPUT / OUTPUT
// ============================================================================

/// Everything the renderer needs; nothing it has to look up
#[derive(Debug, Clone, PartialEq)]
pub struct BadgeSpec {
    pub left_color: BadgeColor,
    pub right_color: BadgeColor,
    pub left_text: String,
    pub right_text: String,
    pub logo: Option<StatusIcon>,
    pub embed_logo: bool,
}

/// Rendered badge
#[derive(Debug, Clone, PartialEq)]
pub struct BadgeImage {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
}

impl BadgeImage {
    /// Strong entity tag: quoted hex SHA-256 of the bytes
    pub fn etag(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        format!("\"{:x}\"", hasher.finalize())
    }
}

/// Image-rendering collaborator
pub trait BadgeRenderer: Send + Sync {
    fn render(&self, spec: &BadgeSpec) -> Result<BadgeImage, BadgeError>;
}

// ============================================================================
// SVG RENDERER
// ============================================================================

/// Flat-style SVG badge
#[derive(Debug, Clone, Default)]
pub struct SvgBadgeRenderer;

impl SvgBadgeRenderer {
    pub fn new() -> Self {
        SvgBadgeRenderer
    }
}

impl BadgeRenderer for SvgBadgeRenderer {
    fn render(&self, spec: &BadgeSpec) -> Result<BadgeImage, BadgeError> {
        let left_text = single_line(&spec.left_text);
        let right_text = single_line(&spec.right_text);
        check_text("left_text", &left_text)?;
        check_text("right_text", &right_text)?;

        let logo_space = if spec.logo.is_some() {
            LOGO_WIDTH + LOGO_PADDING
        } else {
            0.0
        };
        let left_text_width = text_width(&left_text);
        let right_text_width = text_width(&right_text);
        let left_width = (left_text_width + HORIZONTAL_PADDING + logo_space).round() as u32;
        let right_width = (right_text_width + HORIZONTAL_PADDING).round() as u32;
        let total_width = left_width + right_width;

        // Text is laid out at 10x and scaled down, like shields.io does
        let left_center = ((logo_space + left_width as f64) / 2.0 * 10.0).round() as u32;
        let right_center = ((left_width as f64 + right_width as f64 / 2.0) * 10.0).round() as u32;
        let left_length = (left_text_width * 10.0).round() as u32;
        let right_length = (right_text_width * 10.0).round() as u32;

        let left_text = xml_escape(&left_text);
        let right_text = xml_escape(&right_text);

        let logo = match spec.logo {
            Some(icon) => {
                let href = if spec.embed_logo {
                    icon.data_uri()
                } else {
                    icon.url().to_string()
                };
                format!(
                    r#"<image x="5" y="3" width="{}" height="{}" xlink:href="{}"/>"#,
                    LOGO_WIDTH,
                    LOGO_WIDTH,
                    xml_escape(&href)
                )
            }
            None => String::new(),
        };

        let svg = format!(
            concat!(
                r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{total}" height="{height}" role="img" aria-label="{lt}: {rt}">"##,
                r##"<title>{lt}: {rt}</title>"##,
                r##"<linearGradient id="s" x2="0" y2="100%"><stop offset="0" stop-color="#bbb" stop-opacity=".1"/><stop offset="1" stop-opacity=".1"/></linearGradient>"##,
                r##"<clipPath id="r"><rect width="{total}" height="{height}" rx="3" fill="#fff"/></clipPath>"##,
                r##"<g clip-path="url(#r)"><rect width="{lw}" height="{height}" fill="{lc}"/><rect x="{lw}" width="{rw}" height="{height}" fill="{rc}"/><rect width="{total}" height="{height}" fill="url(#s)"/></g>"##,
                r##"<g fill="#fff" text-anchor="middle" font-family="DejaVu Sans,Verdana,Geneva,sans-serif" text-rendering="geometricPrecision" font-size="110">"##,
                "{logo}",
                r##"<text aria-hidden="true" x="{lx}" y="150" fill="#010101" fill-opacity=".3" transform="scale(.1)" textLength="{ll}">{lt}</text>"##,
                r##"<text x="{lx}" y="140" transform="scale(.1)" fill="#fff" textLength="{ll}">{lt}</text>"##,
                r##"<text aria-hidden="true" x="{rx}" y="150" fill="#010101" fill-opacity=".3" transform="scale(.1)" textLength="{rl}">{rt}</text>"##,
                r##"<text x="{rx}" y="140" transform="scale(.1)" fill="#fff" textLength="{rl}">{rt}</text>"##,
                "</g></svg>"
            ),
            total = total_width,
            height = BADGE_HEIGHT,
            lw = left_width,
            rw = right_width,
            lc = spec.left_color.hex(),
            rc = spec.right_color.hex(),
            logo = logo,
            lx = left_center,
            rx = right_center,
            ll = left_length,
            rl = right_length,
            lt = left_text,
            rt = right_text,
        );

        Ok(BadgeImage {
            bytes: svg.into_bytes(),
            media_type: SVG_MEDIA_TYPE,
        })
    }
}

/// Badges are one line tall: tabs and line breaks become plain spaces
fn single_line(text: &str) -> String {
    text.chars()
        .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c })
        .collect()
}

/// XML 1.0 cannot carry the remaining control characters, even escaped
fn check_text(field: &str, text: &str) -> Result<(), BadgeError> {
    if text.chars().any(|c| c.is_control()) {
        return Err(BadgeError::Render(format!(
            "{} contains control characters",
            field
        )));
    }
    Ok(())
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Approximate advance width at 11px Verdana/DejaVu Sans
fn text_width(text: &str) -> f64 {
    text.chars().map(char_width).sum()
}

fn char_width(c: char) -> f64 {
    match c {
        'i' | 'l' | 'j' | '.' | ',' | ':' | ';' | '|' | '!' | '\'' => 3.4,
        ' ' | 'I' | 'f' | 't' | 'r' | '(' | ')' | '[' | ']' => 4.3,
        'm' | 'w' => 9.8,
        'M' | 'W' => 11.0,
        '0'..='9' => 7.0,
        'A'..='Z' => 7.6,
        'a'..='z' => 6.6,
        _ => 7.4,
    }
}

// ============================================================================
// TESTS
// ============================================================================
