use crate::api::ApiSettings;
use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_TITLE: &str = "New Video";
pub const DEFAULT_API_URL: &str = "https://api.vk.com/method";
pub const DEFAULT_API_VERSION: &str = "5.199";

#[derive(Parser, Debug)]
#[command(
    name = "vk-upload",
    version = env!("CARGO_PKG_VERSION"),
    about = "Upload a video to VK.com from the terminal.",
    after_help = "The access token is read from the VK_ACCESS_TOKEN environment variable."
)]
pub struct Cli {
    /// Full path to the video file (e.g. /home/user/video.mp4).
    #[arg(long, value_name = "PATH")]
    pub file: PathBuf,

    /// Video title.
    #[arg(long, default_value = DEFAULT_TITLE)]
    pub title: String,

    /// Video description.
    #[arg(long, default_value = "")]
    pub description: String,

    /// Also post the uploaded video to your wall.
    #[arg(long)]
    pub wallpost: bool,

    /// Base URL of the VK API methods endpoint.
    #[arg(long, env = "VK_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// VK API version sent with every call.
    #[arg(long, env = "VK_API_VERSION", default_value = DEFAULT_API_VERSION)]
    pub api_version: String,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// The upload the operator asked for.
    pub fn upload_request(&self) -> UploadRequest {
        UploadRequest {
            file: self.file.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            wallpost: self.wallpost,
        }
    }

    /// VK endpoint and API version to talk to.
    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.api_url.clone(),
            api_version: self.api_version.clone(),
        }
    }
}

/// What the operator asked for in a single invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub file: PathBuf,
    pub title: String,
    pub description: String,
    pub wallpost: bool,
}

impl UploadRequest {
    /// Wall post text: the title, a blank line, then the description.
    pub fn wall_message(&self) -> String {
        format!("{}\n\n{}", self.title, self.description)
    }
}

/// Logs go to stderr so stdout only carries status lines.
pub fn init_logging(verbosity: u8) {
    let default_filter = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}
