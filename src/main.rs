// Entrypoint for the CLI application.
// - Keeps `main` small: parse flags, read the token, run one upload.
// - Every failure is printed by the reporter; the exit status only says
//   whether the upload went through.

use clap::Parser;
use std::process::ExitCode;
use vk_video_upload::{
    api::VkClient,
    cli::{init_logging, Cli},
    ui::{upload, Reporter},
    TOKEN_ENV,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // The token is read once here and passed down explicitly so the
    // upload flow never touches process-wide state.
    let token = std::env::var(TOKEN_ENV).ok();
    let client = VkClient::new(cli.api_settings());
    let mut reporter = Reporter::stdout();

    if upload(&client, &cli.upload_request(), token, &mut reporter) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
