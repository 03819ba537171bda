//! Quote document rendering: a Tera HTML template converted to PDF via
//! wkhtmltopdf when the binary is present, with an HTML file fallback so a
//! document path is still produced on hosts without a converter.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use chrono::Utc;
use quoteforge_core::document::QuoteDocument;
use tera::{Context, Tera};
use tokio::process::Command;
use tracing::{info, warn};
use uuid::Uuid;

use crate::orchestrator::DocumentRenderer;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(String),
    #[error("conversion error: {0}")]
    Conversion(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn register_template_filters(tera: &mut Tera) {
    tera.register_filter("comma", tera_comma_filter);
}

/// Digit grouping for KRW amounts: `550000 | comma` renders `550,000`.
fn tera_comma_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let amount = value
        .as_i64()
        .ok_or_else(|| tera::Error::msg("comma filter expects an integer"))?;
    Ok(tera::Value::String(group_digits(amount)))
}

fn group_digits(value: i64) -> String {
    let negative = value < 0;
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

pub struct PdfRenderer {
    tera: Tera,
    output_dir: PathBuf,
    wkhtmltopdf_path: Option<String>,
}

impl PdfRenderer {
    /// Renderer with the default template compiled into the binary.
    pub fn embedded(output_dir: PathBuf) -> Self {
        let mut tera = Tera::default();
        register_template_filters(&mut tera);
        tera.add_raw_template(
            "quote.html.tera",
            include_str!("../../../templates/quote.html.tera"),
        )
        .expect("embedded quote template must compile");

        let wkhtmltopdf_path = locate_wkhtmltopdf();
        if wkhtmltopdf_path.is_none() {
            warn!("wkhtmltopdf not found in PATH, quotes will be written as HTML");
        }
        Self { tera, output_dir, wkhtmltopdf_path }
    }

    fn render_html(
        &self,
        document: &QuoteDocument,
        client_name: &str,
    ) -> Result<String, RenderError> {
        let mut context = Context::new();
        context.insert("client_name", client_name);
        context.insert("document", document);
        context.insert("issued_on", &Utc::now().format("%Y-%m-%d").to_string());
        self.tera
            .render("quote.html.tera", &context)
            .map_err(|error| RenderError::Template(error.to_string()))
    }

    async fn convert_html_to_pdf(
        &self,
        html: &str,
        wkhtmltopdf: &str,
        pdf_path: &Path,
    ) -> Result<(), RenderError> {
        let html_path = self.output_dir.join(format!(".render_{}.html", Uuid::new_v4()));
        tokio::fs::write(&html_path, html).await?;

        let result = Command::new(wkhtmltopdf)
            .args([
                "--page-size",
                "A4",
                "--margin-top",
                "10mm",
                "--margin-bottom",
                "10mm",
                "--margin-left",
                "10mm",
                "--margin-right",
                "10mm",
                "--encoding",
                "utf-8",
                "--enable-local-file-access",
            ])
            .arg(&html_path)
            .arg(pdf_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        // Remove the intermediate file before inspecting the command result
        // so a spawn failure cannot leak it.
        let _ = tokio::fs::remove_file(&html_path).await;
        let output = result?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::Conversion(stderr.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentRenderer for PdfRenderer {
    async fn render(
        &self,
        document: &QuoteDocument,
        client_name: &str,
        filename: &str,
    ) -> Result<PathBuf, RenderError> {
        let html = self.render_html(document, client_name)?;
        tokio::fs::create_dir_all(&self.output_dir).await?;

        if let Some(wkhtmltopdf) = &self.wkhtmltopdf_path {
            let pdf_path = self.output_dir.join(filename);
            self.convert_html_to_pdf(&html, wkhtmltopdf, &pdf_path).await?;
            info!(path = %pdf_path.display(), "quote PDF written");
            Ok(pdf_path)
        } else {
            let html_path = self.output_dir.join(Path::new(filename).with_extension("html"));
            tokio::fs::write(&html_path, &html).await?;
            info!(path = %html_path.display(), "quote HTML written (no PDF converter)");
            Ok(html_path)
        }
    }
}

fn locate_wkhtmltopdf() -> Option<String> {
    which::which("wkhtmltopdf").ok().map(|path| path.to_string_lossy().to_string())
}
