use aws_config::BehaviorVersion;
use aws_sdk_cloudwatchlogs::Client as CwClient;
use lambda_runtime::{Error, run, service_fn};

mod config;
mod diagnostics;
mod envelope;
mod error;
mod event_handler;
mod log_level;
mod sink;

use event_handler::function_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    diagnostics::init_global();
    let shared_config = aws_config::load_defaults(BehaviorVersion::v2025_01_17()).await;
    let logs_client = CwClient::new(&shared_config);
    run(service_fn(|event| function_handler(event, &logs_client))).await
}
