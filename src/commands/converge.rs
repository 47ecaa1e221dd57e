//! Drive a request to a terminal state
//!
//! Stands in for the orchestration framework: every `IN_PROGRESS` response
//! is fed back with its callback context after the requested delay.

use anyhow::{Result, bail};
use colored::Colorize;
use reconcile::{HandlerRequest, HandlerResponse, StabilizationPolicy, Status};
use std::time::Duration;
use wafkit::Backend;

use crate::Context;
use crate::handlers;
use crate::ui;

/// Final response plus how many invocations it took
#[derive(Debug)]
pub struct Convergence {
    pub response: HandlerResponse,
    pub invocations: usize,
}

/// Invoke until the response is terminal or `max_invocations` is reached
///
/// `wait` is called with the requested delay between invocations.
pub fn converge<F>(
    backend: &dyn Backend,
    mut request: HandlerRequest,
    policy: &StabilizationPolicy,
    max_invocations: usize,
    mut wait: F,
) -> Convergence
where
    F: FnMut(usize, &HandlerResponse),
{
    let mut invocations = 0;
    loop {
        invocations += 1;
        let response = handlers::dispatch(backend, request.clone(), policy);
        if response.is_terminal() || invocations >= max_invocations {
            return Convergence {
                response,
                invocations,
            };
        }

        wait(invocations, &response);
        request.callback_context = response.callback_context;
    }
}

pub fn run(ctx: &Context, input: &str, max_invocations: usize) -> Result<()> {
    let request = super::read_request(input)?;
    let backend = super::backend(ctx);
    let policy = ctx.config.policy();
    let label = format!("{} {}", request.operation, request.resource_type);

    if !ctx.quiet {
        ui::header(&label);
    }
    let outcome = converge(&backend, request, &policy, max_invocations, |n, response| {
        let delay = response.callback_delay_seconds.unwrap_or_default();
        if !ctx.quiet {
            let left = response
                .callback_context
                .as_ref()
                .map_or(0, |c| c.retries_remaining);
            ui::step(
                n,
                max_invocations,
                &format!("not ready, retrying in {delay}s ({left} attempts left)"),
            );
        }
        std::thread::sleep(Duration::from_secs(delay));
    });

    let response = &outcome.response;
    println!("{}", super::handle::render(response)?);

    match response.status {
        Status::Success => {
            if !ctx.quiet {
                ui::success(&format!(
                    "{label} finished after {} invocation(s)",
                    outcome.invocations
                ));
            }
            Ok(())
        }
        Status::InProgress => {
            ui::warn(&format!(
                "Stopped after {} invocations, resource still in progress",
                outcome.invocations
            ));
            bail!("{label} did not finish");
        }
        Status::Failed => {
            let message = response.message.as_deref().unwrap_or_default();
            match response.error_code {
                Some(kind) => {
                    ui::error(&format!("{}: {message}", kind.description()));
                    ui::dim(&format!("{} {}", "hint:".bold(), kind.advice()));
                    if kind.is_retryable() {
                        ui::dim("the same request may succeed if run again later");
                    }
                    bail!("{label} failed with {kind}");
                }
                None => {
                    ui::error(message);
                    bail!("{label} failed");
                }
            }
        }
    }
}
