//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default API base URL
pub const DEFAULT_URL_BASE: &str = "https://app.testlab.io";

/// Simple and useful wrapper for the TestLab Web API
#[derive(Parser, Debug)]
#[command(name = "testlab-api-client")]
#[command(version)]
#[command(about = "Simple and useful wrapper for the TestLab Web API")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// API base URL (only for TestLab developers)
    #[arg(long, global = true, hide = true, default_value = DEFAULT_URL_BASE)]
    pub url_base: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run batch test
    BatchRun(BatchRunArgs),

    /// Upload an app/ipa/apk file to the project
    UploadApp(UploadAppArgs),

    /// Delete an uploaded app file on the server
    DeleteApp(DeleteAppArgs),

    /// Print the number of the latest batch run in the project
    LatestBatchRunNo(LatestBatchRunNoArgs),

    /// Download the screenshots taken during a batch run
    GetScreenshots(GetScreenshotsArgs),
}

/// API credentials shared by every command
#[derive(Parser, Debug)]
pub struct CredentialArgs {
    /// API token. You can get the value from https://app.testlab.io/accounts/api-token/
    #[arg(short, long)]
    pub token: Option<String>,

    /// Organization name. (Not "organization display name", be careful!)
    #[arg(short, long)]
    pub organization: Option<String>,

    /// Project name. (Not "project display name", be careful!)
    #[arg(short, long)]
    pub project: Option<String>,

    /// Additional HTTP headers as a JSON object, e.g. '{"X-Trace":"abc"}'
    #[arg(long)]
    pub http_headers: Option<String>,
}

/// Arguments for the batch-run command
#[derive(Parser, Debug)]
pub struct BatchRunArgs {
    #[command(flatten)]
    pub credentials: CredentialArgs,

    /// Test setting in JSON format
    #[arg(short, long)]
    pub setting: Option<String>,

    /// Number of a test setting stored on the server. 0 means unset
    #[arg(long, default_value = "0")]
    pub test_settings_number: u64,

    /// Return immediately without waiting the batch run to be finished
    #[arg(short, long)]
    pub no_wait: bool,

    /// Wait limit in seconds. If 0 is specified, the value is test count x 10 minutes
    #[arg(short, long, default_value = "0")]
    pub wait_limit: u64,
}

/// Arguments for the upload-app command
#[derive(Parser, Debug)]
pub struct UploadAppArgs {
    #[command(flatten)]
    pub credentials: CredentialArgs,

    /// Path to the app/ipa/apk file (or .app directory bundle)
    #[arg(short, long)]
    pub app_path: PathBuf,
}

/// Arguments for the delete-app command
#[derive(Parser, Debug)]
pub struct DeleteAppArgs {
    #[command(flatten)]
    pub credentials: CredentialArgs,

    /// File number returned by upload-app
    #[arg(short, long)]
    pub app_file_number: u64,
}

/// Arguments for the latest-batch-run-no command
#[derive(Parser, Debug)]
pub struct LatestBatchRunNoArgs {
    #[command(flatten)]
    pub credentials: CredentialArgs,
}

/// Arguments for the get-screenshots command
#[derive(Parser, Debug)]
pub struct GetScreenshotsArgs {
    #[command(flatten)]
    pub credentials: CredentialArgs,

    /// Batch run number to download screenshots for
    #[arg(short, long)]
    pub batch_run_number: u64,

    /// Local path the screenshot archive is saved to
    #[arg(short, long, default_value = "screenshots.zip")]
    pub download_path: PathBuf,

    /// File index type forwarded to the server
    #[arg(long, default_value = "")]
    pub file_index_type: String,

    /// File name body type forwarded to the server
    #[arg(long, default_value = "")]
    pub file_name_body_type: String,

    /// Download type forwarded to the server
    #[arg(long, default_value = "")]
    pub download_type: String,

    /// Mask dynamically changed areas in the screenshots
    #[arg(long)]
    pub mask_dynamically_changed_area: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_run_args() {
        let args = Args::parse_from([
            "testlab-api-client",
            "batch-run",
            "--token",
            "tok",
            "--organization",
            "acme",
            "--project",
            "mobile",
            "--setting",
            r#"{"model":"Pixel 4"}"#,
            "--test-settings-number",
            "3",
            "--wait-limit",
            "600",
        ]);
        match args.command {
            Command::BatchRun(batch_args) => {
                assert_eq!(batch_args.credentials.token.as_deref(), Some("tok"));
                assert_eq!(batch_args.test_settings_number, 3);
                assert_eq!(batch_args.wait_limit, 600);
                assert!(!batch_args.no_wait);
            }
            _ => panic!("Expected BatchRun command"),
        }
        assert_eq!(args.url_base, DEFAULT_URL_BASE);
    }

    #[test]
    fn test_no_wait_short_flag() {
        let args = Args::parse_from(["testlab-api-client", "batch-run", "-n"]);
        match args.command {
            Command::BatchRun(batch_args) => assert!(batch_args.no_wait),
            _ => panic!("Expected BatchRun command"),
        }
    }

    #[test]
    fn test_upload_app_args() {
        let args = Args::parse_from([
            "testlab-api-client",
            "upload-app",
            "--app-path",
            "/tmp/MyApp.ipa",
        ]);
        match args.command {
            Command::UploadApp(upload_args) => {
                assert_eq!(upload_args.app_path, PathBuf::from("/tmp/MyApp.ipa"));
            }
            _ => panic!("Expected UploadApp command"),
        }
    }

    #[test]
    fn test_hidden_url_base_override() {
        let args = Args::parse_from([
            "testlab-api-client",
            "latest-batch-run-no",
            "--url-base",
            "http://localhost:8000",
        ]);
        assert_eq!(args.url_base, "http://localhost:8000");
        assert!(matches!(args.command, Command::LatestBatchRunNo(_)));
    }
}
