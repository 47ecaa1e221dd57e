use anyhow::{Context as _, Result};
use reconcile::{HandlerResponse, Status};

use crate::Context;
use crate::handlers;

/// Run a single invocation and print the response envelope
pub fn run(ctx: &Context, input: &str) -> Result<()> {
    let request = super::read_request(input)?;
    let backend = super::backend(ctx);
    let response = handlers::dispatch(&backend, request, &ctx.config.policy());
    report(&response);
    println!("{}", render(&response)?);
    Ok(())
}

pub fn render(response: &HandlerResponse) -> Result<String> {
    serde_json::to_string_pretty(response).context("Could not encode response")
}

fn report(response: &HandlerResponse) {
    match (response.status, response.error_code) {
        (Status::Failed, Some(kind)) => log::warn!(
            "{kind}: {}",
            response.message.as_deref().unwrap_or_default()
        ),
        (Status::InProgress, _) => log::info!(
            "not ready, call again in {}s with the returned callbackContext",
            response.callback_delay_seconds.unwrap_or_default()
        ),
        _ => log::debug!("{:?}", response.status),
    }
}
