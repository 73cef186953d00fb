// src/services/pdf.rs
//! HTML to PDF conversion through a headless browser
//!
//! The PDF is always derived from the same HTML the preview shows. A print
//! stylesheet injected before conversion removes screen chrome and sets the
//! A4 page geometry.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};
use tracing::{debug, error};

// A4 page with 1.2cm top, 1.5cm side, 2cm bottom margins, in inches
const PAGE_WIDTH_IN: f64 = 8.27;
const PAGE_HEIGHT_IN: f64 = 11.69;
const MARGIN_TOP_IN: f64 = 0.47;
const MARGIN_BOTTOM_IN: f64 = 0.79;
const MARGIN_SIDE_IN: f64 = 0.59;

const PRINT_STYLE: &str = r#"
<style>
@page {
    size: A4;
    margin: 1.2cm 1.5cm 2cm 1.5cm;
}
body {
    background: white !important;
}
.cv-container {
    box-shadow: none !important;
    padding: 0 !important;
    margin: 0 !important;
    max-width: none !important;
}
</style>
"#;

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("PDF engine error: {0}")]
    Engine(String),
}

#[derive(Debug, Default)]
pub struct PdfService;

impl PdfService {
    pub fn new() -> Self {
        Self
    }

    /// Convert an HTML document to PDF bytes.
    ///
    /// Chrome's API is synchronous, so the conversion runs on the blocking
    /// pool to keep the async runtime free.
    pub async fn html_to_pdf(&self, html: &str) -> Result<Vec<u8>, PdfError> {
        let document = inject_print_style(html);

        let bytes = tokio::task::spawn_blocking(move || render_with_chrome(&document))
            .await
            .map_err(|e| PdfError::Engine(format!("conversion task failed: {}", e)))??;

        debug!(size = bytes.len(), "Generated PDF document");
        Ok(bytes)
    }
}

fn render_with_chrome(html: &str) -> Result<Vec<u8>, PdfError> {
    let options = LaunchOptions::default_builder()
        .headless(true)
        .sandbox(false)
        .build()
        .map_err(|e| PdfError::Engine(e.to_string()))?;

    let browser = Browser::new(options).map_err(|e| {
        error!(error = %e, "Failed to launch headless browser");
        PdfError::Engine(e.to_string())
    })?;

    let tab = browser
        .new_tab()
        .map_err(|e| PdfError::Engine(e.to_string()))?;

    let url = format!("data:text/html;base64,{}", BASE64.encode(html));
    tab.navigate_to(&url)
        .and_then(|t| t.wait_until_navigated())
        .map_err(|e| PdfError::Engine(e.to_string()))?;

    let pdf_options = PrintToPdfOptions {
        print_background: Some(true),
        prefer_css_page_size: Some(true),
        paper_width: Some(PAGE_WIDTH_IN),
        paper_height: Some(PAGE_HEIGHT_IN),
        margin_top: Some(MARGIN_TOP_IN),
        margin_bottom: Some(MARGIN_BOTTOM_IN),
        margin_left: Some(MARGIN_SIDE_IN),
        margin_right: Some(MARGIN_SIDE_IN),
        ..Default::default()
    };

    tab.print_to_pdf(Some(pdf_options))
        .map_err(|e| PdfError::Engine(e.to_string()))
}

/// Insert the print stylesheet at the end of <head> so it wins the cascade
/// over the embedded screen styles
fn inject_print_style(html: &str) -> String {
    if let Some(pos) = html.find("</head>") {
        let mut out = String::with_capacity(html.len() + PRINT_STYLE.len());
        out.push_str(&html[..pos]);
        out.push_str(PRINT_STYLE);
        out.push_str(&html[pos..]);
        out
    } else {
        // No head element: prepend so the rules still apply
        format!("{}{}", PRINT_STYLE, html)
    }
}
