use pulldown_cmark::{html, Options, Parser};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

use super::{Action, ActionContext, ActionParams, ParamSpec};
use crate::error::ActionError;
use crate::models::Mode;

/// File name of the exported resume; the email action attaches it
pub const EXPORT_FILE_NAME: &str = "resume_optimized.pdf";

const ACTION: &str = "export_to_pdf";

/// Turns an HTML document into a PDF file
pub trait PdfRenderer: Send + Sync {
    fn render(&self, html: &str, output: &Path) -> Result<(), String>;
}

/// Renders through the `wkhtmltopdf` binary, HTML piped on stdin
pub struct WkhtmltopdfRenderer {
    binary: String,
}

impl WkhtmltopdfRenderer {
    pub fn new() -> Self {
        Self {
            binary: "wkhtmltopdf".to_string(),
        }
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }
}

impl Default for WkhtmltopdfRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfRenderer for WkhtmltopdfRenderer {
    fn render(&self, html: &str, output: &Path) -> Result<(), String> {
        let mut child = Command::new(&self.binary)
            .args(["--quiet", "--encoding", "UTF-8", "--enable-local-file-access", "-"])
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    format!("{} not found in PATH. Please install it first.", self.binary)
                } else {
                    format!("Failed to spawn {}: {}", self.binary, e)
                }
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(html.as_bytes())
                .map_err(|e| format!("Failed to send HTML to {}: {}", self.binary, e))?;
        }

        let result = child
            .wait_with_output()
            .map_err(|e| format!("{} did not finish: {}", self.binary, e))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(format!("{} exited with {}: {}", self.binary, result.status, stderr.trim()));
        }
        Ok(())
    }
}

/// Render Markdown into a standalone HTML page
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut body = String::new();
    html::push_html(&mut body, Parser::new_ext(markdown, options));

    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\
<style>body{{font-family:Arial,\"Noto Sans CJK SC\",sans-serif;font-size:12pt;line-height:1.45;margin:2em;}}\
h1,h2,h3{{margin-bottom:0.3em;}}ul{{margin-top:0.2em;}}</style></head>\n<body>\n{}</body></html>\n",
        body
    )
}

/// `export_to_pdf(md_content)`: writes `<workdir>/resume_optimized.pdf`
pub struct ExportPdfAction {
    renderer: Box<dyn PdfRenderer>,
    open_after: bool,
}

impl ExportPdfAction {
    pub fn new(renderer: Box<dyn PdfRenderer>, open_after: bool) -> Self {
        Self { renderer, open_after }
    }

    pub fn output_path(workdir: &Path) -> PathBuf {
        workdir.join(EXPORT_FILE_NAME)
    }
}

impl Action for ExportPdfAction {
    fn name(&self) -> &'static str {
        ACTION
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["export2pdf", "export_pdf"]
    }

    fn summary(&self, mode: Mode) -> &'static str {
        match mode {
            Mode::Candidate => "Export the optimized resume to a PDF file",
            Mode::Hunter => "Export the optimized candidate resume to a PDF file",
        }
    }

    fn params(&self, _mode: Mode) -> Vec<ParamSpec> {
        vec![ParamSpec::new(
            "md_content",
            "the full optimized resume in Markdown",
        )]
    }

    fn invoke(&self, params: &ActionParams, ctx: &ActionContext<'_>) -> Result<String, ActionError> {
        let markdown = params.require(ACTION, "md_content")?;
        let failed = |message: String| ActionError::Failed { action: ACTION, message };

        fs::create_dir_all(ctx.workdir)
            .map_err(|e| failed(format!("cannot create {}: {}", ctx.workdir.display(), e)))?;

        let output = Self::output_path(ctx.workdir);
        let html = markdown_to_html(markdown);
        debug!("Rendering {} bytes of HTML to {}", html.len(), output.display());

        self.renderer.render(&html, &output).map_err(failed)?;
        info!("Exported PDF to {}", output.display());

        if self.open_after {
            if let Err(e) = open::that(&output) {
                warn!("Could not open {}: {}", output.display(), e);
            }
        }

        Ok(output.display().to_string())
    }
}
