// Library root
// -----------
// This crate exposes a small library surface for the `vk-upload` binary.
// The binary (`main.rs`) parses flags, reads the token from the
// environment and hands everything to `ui::upload`.
//
// Module responsibilities:
// - `api`: Encapsulates HTTP interactions with VK (token check, video
//   upload, wall post) behind the `VideoPlatform`/`Session` traits.
// - `cli`: Command-line flags and the `UploadRequest` built from them.
// - `error`: The ordered failure classes reported to the operator.
// - `ui`: Runs the upload flow and prints status lines.
//
// Keeping the remote calls behind traits means the flow in `ui` can be
// exercised with mocks and never needs a network.
pub mod api;
pub mod cli;
pub mod error;
pub mod ui;

pub use error::UploadError;

/// Environment variable holding the VK access token.
pub const TOKEN_ENV: &str = "VK_ACCESS_TOKEN";
