pub mod config;
pub mod converge;
pub mod handle;

use anyhow::{Context as _, Result};
use reconcile::HandlerRequest;
use std::io::{self, Read};
use wafkit::HttpBackend;

use crate::Context;
use crate::paths;

/// Read a request envelope from a file, or from stdin when `input` is `-`
pub fn read_request(input: &str) -> Result<HandlerRequest> {
    let (source, content) = if input == "-" {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("Could not read request from stdin")?;
        ("stdin".to_string(), content)
    } else {
        let path = paths::expand(input);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        (path.display().to_string(), content)
    };
    parse_request(&content).with_context(|| format!("Invalid request in {source}"))
}

fn parse_request(content: &str) -> Result<HandlerRequest> {
    Ok(serde_json::from_str(content)?)
}

/// Backend for the configured endpoint
pub fn backend(ctx: &Context) -> HttpBackend {
    let endpoint = ctx.config.endpoint();
    log::info!("Using endpoint {endpoint}");
    HttpBackend::new(endpoint, ctx.config.timeout())
}
