//! TestLab API client - command-line wrapper for the TestLab Web API
//!
//! Starts server-side batch test runs (single or cross batch run groups),
//! waits for them to finish with readable progress output, and maps the
//! aggregate result to the process exit code. Also covers the sibling
//! file-management endpoints (upload/delete app files, screenshots).
//!
//! ## Usage
//!
//! ```bash
//! # Start a batch run and wait for the result
//! testlab-api-client batch-run -t <token> -o <org> -p <project>
//!
//! # Run a stored cross batch run setting
//! testlab-api-client batch-run --test-settings-number 3
//!
//! # Upload an app build, then run against it
//! testlab-api-client upload-app -a build/MyApp.ipa
//! testlab-api-client batch-run -s '{"app_file_number": 123}'
//! ```
//!
//! Exit code: 0 on success, 1 on any error, 2 when tests finished with
//! unresolved cases needing manual triage.

use anyhow::Result;
use clap::Parser;

use testlab_api_client::api::{ApiClient, ScreenshotOptions};
use testlab_api_client::cli::{self, Args, CredentialArgs};
use testlab_api_client::config::{ApiConfig, EnvConfig};
use testlab_api_client::executor::{BatchRunExecutor, PollPolicy};
use testlab_api_client::output::ConsoleSink;
use testlab_api_client::{upload, utils};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    utils::init_logger(args.verbose);

    let code = match run(args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            1
        }
    };
    std::process::exit(code);
}

async fn run(args: Args) -> Result<i32> {
    let env = EnvConfig::load();

    match args.command {
        cli::Command::BatchRun(ref cmd) => {
            let client = client_for(&args.url_base, &cmd.credentials, &env)?;
            let sink = ConsoleSink::new(true);
            let policy = PollPolicy::default().with_wait_limit_secs(cmd.wait_limit);
            let executor = BatchRunExecutor::new(client, &sink).with_policy(policy);

            let outcome = executor
                .execute(
                    cmd.test_settings_number,
                    cmd.setting.as_deref().unwrap_or(""),
                    !cmd.no_wait,
                )
                .await?;
            Ok(outcome.exit_code())
        }
        cli::Command::UploadApp(ref cmd) => {
            let client = client_for(&args.url_base, &cmd.credentials, &env)?;
            let actual_path = upload::package_app(&cmd.app_path)?;
            let file_no = client.upload_app(&actual_path).await?;
            println!("{file_no}");
            Ok(0)
        }
        cli::Command::DeleteApp(ref cmd) => {
            let client = client_for(&args.url_base, &cmd.credentials, &env)?;
            client.delete_app(cmd.app_file_number).await?;
            Ok(0)
        }
        cli::Command::LatestBatchRunNo(ref cmd) => {
            let client = client_for(&args.url_base, &cmd.credentials, &env)?;
            let number = client.latest_batch_run_number().await?;
            println!("{number}");
            Ok(0)
        }
        cli::Command::GetScreenshots(ref cmd) => {
            let client = client_for(&args.url_base, &cmd.credentials, &env)?;
            let options = ScreenshotOptions {
                file_index_type: cmd.file_index_type.clone(),
                file_name_body_type: cmd.file_name_body_type.clone(),
                download_type: cmd.download_type.clone(),
                mask_dynamically_changed_area: cmd.mask_dynamically_changed_area,
            };
            client
                .download_screenshots(cmd.batch_run_number, &cmd.download_path, &options)
                .await?;
            println!("saved to {}", cmd.download_path.display());
            Ok(0)
        }
    }
}

fn client_for(url_base: &str, credentials: &CredentialArgs, env: &EnvConfig) -> Result<ApiClient> {
    let config = ApiConfig::resolve(
        url_base,
        credentials.token.as_deref(),
        credentials.organization.as_deref(),
        credentials.project.as_deref(),
        credentials.http_headers.as_deref(),
        env,
    )?;
    Ok(ApiClient::new(config)?)
}
