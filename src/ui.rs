// UI layer: runs the single upload flow and prints status lines.
// Each step either succeeds or stops the flow with a classified error;
// the reporter turns that error into the operator-facing message.

use crate::api::{AccessToken, UploadedVideo, VideoPlatform};
use crate::cli::UploadRequest;
use crate::UploadError;
use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

/// Prints glyph-prefixed status lines to any writer.
pub struct Reporter<W: Write> {
    out: W,
    color: bool,
    spinners: bool,
}

impl Reporter<io::Stdout> {
    /// Reporter for the terminal: colors and spinners only when attached
    /// to a tty.
    pub fn stdout() -> Self {
        let out = io::stdout();
        let color = out.is_tty();
        Reporter {
            out,
            color,
            spinners: io::stderr().is_tty(),
        }
    }
}

impl<W: Write> Reporter<W> {
    /// Plain reporter: no colors, no spinners.
    pub fn new(out: W) -> Self {
        Reporter {
            out,
            color: false,
            spinners: false,
        }
    }

    /// Give back the writer, e.g. to inspect captured output.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Line announcing that remote work begins.
    pub fn start(&mut self, message: &str) {
        self.line(format!("🚀 {}", message));
    }

    /// Plain line naming the step about to run.
    pub fn progress(&mut self, message: &str) {
        self.line(message.to_string());
    }

    /// Line confirming a step finished.
    pub fn success(&mut self, message: &str) {
        let text = format!("✅ {}", message);
        if self.color {
            self.line(text.green().to_string());
        } else {
            self.line(text);
        }
    }

    /// Indented line belonging to the previous status line.
    pub fn detail(&mut self, message: &str) {
        self.line(format!("   {}", message));
    }

    /// Headline for `err`, followed by its hint when there is one.
    pub fn failure(&mut self, err: &UploadError) {
        let text = format!("❌ {}", err);
        if self.color {
            self.line(text.red().to_string());
        } else {
            self.line(text);
        }
        if let Some(hint) = err.hint() {
            self.detail(&hint);
        }
    }

    /// Spinner on stderr while a blocking call runs. Hidden when spinners
    /// are off; always call `finish_and_clear` on the result.
    pub fn spinner(&self, message: &str) -> ProgressBar {
        if !self.spinners {
            return ProgressBar::hidden();
        }
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} ({elapsed})") {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    }

    fn line(&mut self, text: String) {
        if let Err(err) = writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            warn!("failed to write status line: {}", err);
        }
    }
}

/// The path must point at a regular file this process can read.
pub fn validate_file(path: &Path) -> Result<(), UploadError> {
    if !path.exists() {
        return Err(UploadError::FileNotFound(path.to_path_buf()));
    }
    let unreadable = |err| UploadError::FileUnreadable(path.to_path_buf(), err);
    let metadata = File::open(path)
        .and_then(|file| file.metadata())
        .map_err(unreadable)?;
    if metadata.is_file() {
        Ok(())
    } else {
        Err(UploadError::FileNotFound(path.to_path_buf()))
    }
}

/// Turn the raw environment value into a token. Absent and blank are
/// the same failure.
pub fn load_token(raw: Option<String>) -> Result<AccessToken, UploadError> {
    match raw.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => Ok(AccessToken::new(token)),
        _ => Err(UploadError::MissingCredential),
    }
}

/// Run every step in order and stop at the first failure. Local checks
/// come first so a bad path or missing token never reaches the network.
pub fn run_upload<P, W>(
    platform: &P,
    request: &UploadRequest,
    raw_token: Option<String>,
    reporter: &mut Reporter<W>,
) -> Result<UploadedVideo, UploadError>
where
    P: VideoPlatform + ?Sized,
    W: Write,
{
    validate_file(&request.file)?;
    let token = load_token(raw_token)?;

    reporter.start("Starting upload...");
    let session = platform.authenticate(&token)?;

    reporter.progress(&format!("Uploading file: {}...", request.file.display()));
    let spinner = reporter.spinner("Uploading...");
    let uploaded = session.upload_video(&request.file, &request.title, &request.description);
    spinner.finish_and_clear();
    let video = uploaded?;

    reporter.success("Video uploaded successfully!");
    reporter.detail(&format!("URL: {}", video.url()));

    if request.wallpost {
        reporter.progress("Posting video to wall...");
        let post_id = session.post_to_wall(&request.wall_message(), &video.attachment())?;
        debug!("wall post {} created", post_id);
        reporter.success("Posted to wall!");
    }

    Ok(video)
}

/// Run the upload and report any failure. Returns whether it succeeded.
pub fn upload<P, W>(
    platform: &P,
    request: &UploadRequest,
    raw_token: Option<String>,
    reporter: &mut Reporter<W>,
) -> bool
where
    P: VideoPlatform + ?Sized,
    W: Write,
{
    match run_upload(platform, request, raw_token, reporter) {
        Ok(_) => true,
        Err(err) => {
            debug!("upload stopped: {:?}", err);
            reporter.failure(&err);
            false
        }
    }
}
