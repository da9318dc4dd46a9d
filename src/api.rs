// API client module: contains a small blocking HTTP client that talks to
// the VK API. Only the calls this tool needs are covered: a token check
// (`users.get`), the two-step video upload (`video.save` followed by a
// multipart POST to the returned upload server) and `wall.post`.
//
// The upload flow in `ui` never sees this client directly; it works
// against the `VideoPlatform` and `Session` traits below.

use anyhow::{anyhow, Context};
use log::{debug, info};
use reqwest::blocking::{multipart, Client};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// VK error codes that mean the token itself is unusable: authorization
/// failed (5), permission denied (7), validation required (17).
const AUTH_ERROR_CODES: [i64; 3] = [5, 7, 17];

/// Where the VK API lives and which version of it to speak.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiSettings {
    pub base_url: String,
    pub api_version: String,
}

/// Bearer credential for VK API calls. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        AccessToken(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Identifies a video after the upload server accepted it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadedVideo {
    pub owner_id: i64,
    pub video_id: i64,
}

impl UploadedVideo {
    /// Public page of the video on vk.com.
    pub fn url(&self) -> String {
        format!("https://vk.com/{}", self.attachment())
    }

    /// Reference used to attach the video to a wall post.
    pub fn attachment(&self) -> String {
        format!("video{}_{}", self.owner_id, self.video_id)
    }
}

/// Error reported by VK, either from an API method or the upload server.
/// Upload servers do not always send a numeric code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiFailure {
    pub code: Option<i64>,
    pub message: String,
}

impl ApiFailure {
    pub fn new(code: Option<i64>, message: impl Into<String>) -> Self {
        ApiFailure {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PlatformError {
    /// The token was rejected or lacks the scopes the call needs.
    #[error("{0}")]
    Auth(ApiFailure),
    #[error("{0}")]
    Api(ApiFailure),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlatformError {
    fn classify(failure: ApiFailure) -> Self {
        match failure.code {
            Some(code) if AUTH_ERROR_CODES.contains(&code) => PlatformError::Auth(failure),
            _ => PlatformError::Api(failure),
        }
    }
}

/// Entry point to a video platform: turns a token into a session.
#[cfg_attr(test, mockall::automock)]
pub trait VideoPlatform {
    fn authenticate(&self, token: &AccessToken) -> Result<Box<dyn Session>, PlatformError>;
}

/// Operations available once a token has been accepted.
#[cfg_attr(test, mockall::automock)]
pub trait Session {
    fn upload_video(
        &self,
        file: &Path,
        title: &str,
        description: &str,
    ) -> Result<UploadedVideo, PlatformError>;

    /// Publish `message` on the token owner's wall with `attachment`
    /// attached. Returns the id of the new post.
    fn post_to_wall(&self, message: &str, attachment: &str) -> Result<i64, PlatformError>;
}

/// `VideoPlatform` backed by the real VK HTTP API.
#[derive(Clone, Debug)]
pub struct VkClient {
    settings: ApiSettings,
}

impl VkClient {
    /// The HTTP client itself is only built in `authenticate`, so nothing
    /// network related happens before the local checks pass.
    pub fn new(settings: ApiSettings) -> Self {
        VkClient { settings }
    }
}

impl VideoPlatform for VkClient {
    fn authenticate(&self, token: &AccessToken) -> Result<Box<dyn Session>, PlatformError> {
        // Uploads can take arbitrarily long, so only connecting is bounded.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(None)
            .build()
            .context("Failed to build HTTP client")?;
        let session = VkSession {
            client,
            settings: self.settings.clone(),
            token: token.clone(),
        };

        let users: Vec<UserInfo> = session.call("users.get", &[])?;
        match users.first() {
            Some(user) => info!(
                "authenticated as {} {} (id {})",
                user.first_name, user.last_name, user.id
            ),
            None => info!("authenticated with a non-user token"),
        }
        Ok(Box::new(session))
    }
}

/// An authenticated connection to the VK API.
pub struct VkSession {
    client: Client,
    settings: ApiSettings,
    token: AccessToken,
}

/// Every VK method answers with either `response` or `error`.
#[derive(Deserialize, Debug)]
struct Envelope<T> {
    response: Option<T>,
    error: Option<ErrorBody>,
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    error_code: i64,
    error_msg: String,
}

#[derive(Deserialize, Debug)]
struct UserInfo {
    id: i64,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

#[derive(Deserialize, Debug)]
struct SaveResponse {
    upload_url: String,
    owner_id: i64,
    video_id: i64,
}

/// What the upload server returns after receiving the file. On failure
/// it sends an `error` that may be a plain string or an object.
#[derive(Deserialize, Debug, Default)]
struct UploadServerResponse {
    owner_id: Option<i64>,
    video_id: Option<i64>,
    error: Option<serde_json::Value>,
    error_code: Option<serde_json::Value>,
}

impl UploadServerResponse {
    /// Numeric code from `error_code`, which some servers send as a string.
    fn code(&self) -> Option<i64> {
        match self.error_code.as_ref()? {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Deserialize, Debug)]
struct WallPostResponse {
    post_id: i64,
}

impl VkSession {
    /// POST a VK API method with form parameters and unwrap the envelope.
    fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<T, PlatformError> {
        let url = format!("{}/{}", self.settings.base_url.trim_end_matches('/'), method);
        let mut form = params.to_vec();
        form.push(("access_token", self.token.expose()));
        form.push(("v", self.settings.api_version.as_str()));

        debug!("calling {}", method);
        let res = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .with_context(|| format!("Failed to send {} request", method))?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            return Err(anyhow!("{} failed: {} - {}", method, status, txt).into());
        }
        let envelope: Envelope<T> = res
            .json()
            .with_context(|| format!("Parsing {} response json", method))?;
        match envelope {
            Envelope {
                error: Some(err), ..
            } => Err(PlatformError::classify(ApiFailure::new(
                Some(err.error_code),
                err.error_msg,
            ))),
            Envelope {
                response: Some(response),
                ..
            } => Ok(response),
            _ => Err(anyhow!("{} response had neither `response` nor `error`", method).into()),
        }
    }

    /// Send the already opened file as multipart/form-data to the server
    /// `video.save` handed out.
    fn transfer(
        &self,
        upload_url: &str,
        part: multipart::Part,
    ) -> Result<UploadServerResponse, PlatformError> {
        let form = multipart::Form::new().part("video_file", part);

        debug!("sending file to upload server");
        let res = self
            .client
            .post(upload_url)
            .multipart(form)
            .send()
            .context("Failed to send upload request")?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            return Err(anyhow!("Upload failed: {} - {}", status, txt).into());
        }
        let body: UploadServerResponse = res.json().context("Parsing upload response json")?;
        if let Some(error) = &body.error {
            let message = match error {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(PlatformError::Api(ApiFailure::new(body.code(), message)));
        }
        Ok(body)
    }
}

impl Session for VkSession {
    fn upload_video(
        &self,
        file: &Path,
        title: &str,
        description: &str,
    ) -> Result<UploadedVideo, PlatformError> {
        // Open the file before video.save so an unreadable file never
        // leaves an empty video reserved on the account.
        let part = multipart::Part::file(file)
            .with_context(|| format!("Failed to open video file {}", file.display()))?;
        let saved: SaveResponse = self.call(
            "video.save",
            &[("name", title), ("description", description), ("wallpost", "0")],
        )?;
        debug!(
            "video.save reserved video{}_{}",
            saved.owner_id, saved.video_id
        );

        let uploaded = self.transfer(&saved.upload_url, part)?;
        Ok(UploadedVideo {
            owner_id: uploaded.owner_id.unwrap_or(saved.owner_id),
            video_id: uploaded.video_id.unwrap_or(saved.video_id),
        })
    }

    fn post_to_wall(&self, message: &str, attachment: &str) -> Result<i64, PlatformError> {
        let posted: WallPostResponse = self.call(
            "wall.post",
            &[("message", message), ("attachments", attachment)],
        )?;
        Ok(posted.post_id)
    }
}
