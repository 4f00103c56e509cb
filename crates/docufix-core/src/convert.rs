use crate::config::AppConfig;
use crate::platform;
use crate::render;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const IMG_EXTS: [&str; 8] = [".jpg", ".jpeg", ".png", ".bmp", ".tif", ".tiff", ".gif", ".webp"];
const TXT_EXTS: [&str; 4] = [".txt", ".csv", ".md", ".log"];
const HTML_EXTS: [&str; 2] = [".html", ".htm"];
const OFFICE_EXTS: [&str; 10] = [
    ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".odt", ".ods", ".odp", ".rtf",
];

const BROWSER_CANDIDATES: [&str; 5] = [
    "chrome",
    "google-chrome",
    "chromium",
    "chromium-browser",
    "msedge",
];

/// Extension class deciding which converter chain a file enters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtClass {
    Pdf,
    Image,
    Text,
    Html,
    Office,
    Other,
}

/// Classify by lowercased extension (dot included).
pub fn classify(ext: &str) -> ExtClass {
    let ext = ext.to_ascii_lowercase();
    let ext = ext.as_str();
    if ext == ".pdf" {
        ExtClass::Pdf
    } else if IMG_EXTS.contains(&ext) {
        ExtClass::Image
    } else if TXT_EXTS.contains(&ext) {
        ExtClass::Text
    } else if HTML_EXTS.contains(&ext) {
        ExtClass::Html
    } else if OFFICE_EXTS.contains(&ext) {
        ExtClass::Office
    } else {
        ExtClass::Other
    }
}

/// Typed result of one converter attempt. Timeouts are distinct from
/// failures: a timeout escalates to a user decision, a failure routes the
/// file to the overflow tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertOutcome {
    Success,
    Failed,
    TimedOut,
}

/// External converter binaries found on this host. Discovery runs once per
/// engine; tests inject `Converters::none()` for determinism.
#[derive(Debug, Clone, Default)]
pub struct Converters {
    pub soffice: Option<PathBuf>,
    pub browser: Option<PathBuf>,
    pub wkhtmltopdf: Option<PathBuf>,
}

impl Converters {
    pub fn discover() -> Self {
        let soffice = which::which("soffice")
            .or_else(|_| which::which("libreoffice"))
            .ok();
        let browser = BROWSER_CANDIDATES
            .iter()
            .find_map(|name| which::which(name).ok());
        let wkhtmltopdf = which::which("wkhtmltopdf").ok();

        info!(
            soffice = soffice.is_some(),
            browser = browser.is_some(),
            wkhtmltopdf = wkhtmltopdf.is_some(),
            "Converter discovery complete"
        );
        Self {
            soffice,
            browser,
            wkhtmltopdf,
        }
    }

    /// Empty set: every external conversion fails fast.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Spawn and poll against a deadline; a child over its deadline is killed.
/// Judged solely by exit status; no converter output is parsed.
fn run_with_deadline(cmd: &mut Command, timeout: Duration) -> ConvertOutcome {
    let mut child = match cmd.stdout(Stdio::null()).stderr(Stdio::null()).spawn() {
        Ok(child) => child,
        Err(err) => {
            debug!("Failed to spawn converter: {}", err);
            return ConvertOutcome::Failed;
        }
    };

    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                return if status.success() {
                    ConvertOutcome::Success
                } else {
                    ConvertOutcome::Failed
                };
            }
            Ok(None) => {
                if start.elapsed() > timeout {
                    if let Err(err) = child.kill() {
                        warn!("Failed to kill stuck converter: {}", err);
                    }
                    let _ = child.wait();
                    return ConvertOutcome::TimedOut;
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(err) => {
                warn!("Error waiting on converter: {}", err);
                return ConvertOutcome::Failed;
            }
        }
    }
}

fn convert_image(src: &Path, out_pdf: &Path) -> ConvertOutcome {
    match render::image_to_pdf(src, out_pdf) {
        Ok(()) => ConvertOutcome::Success,
        Err(err) => {
            debug!("Image conversion of {} failed: {}", src.display(), err);
            ConvertOutcome::Failed
        }
    }
}

fn convert_text(src: &Path, out_pdf: &Path) -> ConvertOutcome {
    match render::text_to_pdf(src, out_pdf) {
        Ok(()) => ConvertOutcome::Success,
        Err(err) => {
            debug!("Text conversion of {} failed: {}", src.display(), err);
            ConvertOutcome::Failed
        }
    }
}

/// Headless browser print-to-PDF, else wkhtmltopdf. First success wins; a
/// timeout short-circuits the chain so it can escalate.
fn convert_html(
    src: &Path,
    out_pdf: &Path,
    converters: &Converters,
    config: &AppConfig,
) -> ConvertOutcome {
    if let Some(browser) = &converters.browser {
        let mut cmd = Command::new(browser);
        cmd.arg("--headless")
            .arg("--disable-gpu")
            .arg(format!("--print-to-pdf={}", out_pdf.display()))
            .arg(src);
        match run_with_deadline(&mut cmd, config.browser_timeout()) {
            ConvertOutcome::Success if out_pdf.exists() => return ConvertOutcome::Success,
            ConvertOutcome::TimedOut => return ConvertOutcome::TimedOut,
            _ => {}
        }
    }
    if let Some(wkhtmltopdf) = &converters.wkhtmltopdf {
        let mut cmd = Command::new(wkhtmltopdf);
        cmd.arg(src).arg(out_pdf);
        match run_with_deadline(&mut cmd, config.wkhtmltopdf_timeout()) {
            ConvertOutcome::Success if out_pdf.exists() => return ConvertOutcome::Success,
            ConvertOutcome::TimedOut => return ConvertOutcome::TimedOut,
            _ => {}
        }
    }
    ConvertOutcome::Failed
}

/// Office chain: headless document suite first, then native automation of
/// the installed office application. A timeout stops the chain so it can
/// escalate.
fn convert_office(
    src: &Path,
    out_pdf: &Path,
    converters: &Converters,
    config: &AppConfig,
) -> ConvertOutcome {
    match convert_via_soffice(src, out_pdf, converters, config) {
        ConvertOutcome::Success => return ConvertOutcome::Success,
        ConvertOutcome::TimedOut => return ConvertOutcome::TimedOut,
        ConvertOutcome::Failed => {}
    }
    convert_via_office_automation(src, out_pdf, config)
}

/// Headless document-suite conversion. soffice names its output after the
/// input stem, so the produced file is renamed onto the fitted target.
fn convert_via_soffice(
    src: &Path,
    out_pdf: &Path,
    converters: &Converters,
    config: &AppConfig,
) -> ConvertOutcome {
    let Some(soffice) = &converters.soffice else {
        return ConvertOutcome::Failed;
    };
    let Some(out_dir) = out_pdf.parent() else {
        return ConvertOutcome::Failed;
    };

    let mut cmd = Command::new(soffice);
    cmd.arg("--headless")
        .arg("--convert-to")
        .arg("pdf")
        .arg("--outdir")
        .arg(out_dir)
        .arg(src);
    match run_with_deadline(&mut cmd, config.office_timeout()) {
        ConvertOutcome::Success => {}
        other => return other,
    }

    let stem = src
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let produced = out_dir.join(format!("{stem}.pdf"));
    if !produced.exists() {
        return ConvertOutcome::Failed;
    }
    if produced != out_pdf {
        if let Err(err) = std::fs::rename(
            platform::extended_length(&produced),
            platform::extended_length(out_pdf),
        ) {
            warn!("Could not move produced PDF into place: {}", err);
            return ConvertOutcome::Failed;
        }
    }
    ConvertOutcome::Success
}

fn ps_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// PowerShell script driving the native office application's own PDF export
/// (Word/Excel/PowerPoint COM objects, fixed-format export). Extensions no
/// application claims get `None`.
pub fn office_automation_script(ext: &str, src: &Path, out_pdf: &Path) -> Option<String> {
    let src = ps_quote(&src.to_string_lossy());
    let dst = ps_quote(&out_pdf.to_string_lossy());
    let script = match ext {
        ".doc" | ".docx" | ".rtf" => format!(
            "$app = New-Object -ComObject Word.Application; $app.Visible = $false; \
             $doc = $app.Documents.Open({src}); $doc.ExportAsFixedFormat({dst}, 17); \
             $doc.Close($false); $app.Quit()"
        ),
        ".xls" | ".xlsx" => format!(
            "$app = New-Object -ComObject Excel.Application; $app.Visible = $false; \
             $wb = $app.Workbooks.Open({src}); $wb.ExportAsFixedFormat(0, {dst}); \
             $wb.Close($false); $app.Quit()"
        ),
        ".ppt" | ".pptx" => format!(
            "$app = New-Object -ComObject PowerPoint.Application; \
             $pres = $app.Presentations.Open({src}, $true, $true, $false); \
             $pres.SaveAs({dst}, 32); $pres.Close(); $app.Quit()"
        ),
        _ => return None,
    };
    Some(script)
}

/// Drive the installed office application through PowerShell, bounded by the
/// same deadline as the suite converter.
#[cfg(windows)]
fn convert_via_office_automation(src: &Path, out_pdf: &Path, config: &AppConfig) -> ConvertOutcome {
    let ext = src
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_ascii_lowercase()))
        .unwrap_or_default();
    let Some(script) = office_automation_script(&ext, src, out_pdf) else {
        return ConvertOutcome::Failed;
    };

    let mut cmd = Command::new("powershell");
    cmd.arg("-NoProfile")
        .arg("-NonInteractive")
        .arg("-Command")
        .arg(script);
    match run_with_deadline(&mut cmd, config.office_timeout()) {
        ConvertOutcome::Success if out_pdf.exists() => ConvertOutcome::Success,
        ConvertOutcome::TimedOut => ConvertOutcome::TimedOut,
        _ => ConvertOutcome::Failed,
    }
}

#[cfg(not(windows))]
fn convert_via_office_automation(
    _src: &Path,
    _out_pdf: &Path,
    _config: &AppConfig,
) -> ConvertOutcome {
    ConvertOutcome::Failed
}

/// Dispatch a non-PDF file to its converter chain. Unknown extensions fall
/// back to the generic document-suite converter.
pub fn convert_to_pdf(
    src: &Path,
    out_pdf: &Path,
    class: ExtClass,
    converters: &Converters,
    config: &AppConfig,
) -> ConvertOutcome {
    match class {
        ExtClass::Pdf => ConvertOutcome::Failed, // already-PDF files are copied, not converted
        ExtClass::Image => convert_image(src, out_pdf),
        ExtClass::Text => convert_text(src, out_pdf),
        ExtClass::Html => convert_html(src, out_pdf, converters, config),
        ExtClass::Office | ExtClass::Other => convert_office(src, out_pdf, converters, config),
    }
}
