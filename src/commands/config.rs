use anyhow::Result;

use crate::Context;
use crate::cli::ConfigCommand;
use crate::paths;
use crate::ui;

pub fn run(ctx: &Context, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(ctx),
        ConfigCommand::Path => path(),
    }
}

fn show(ctx: &Context) -> Result<()> {
    let config = &ctx.config;
    let policy = config.policy();

    ui::header("Configuration");
    let file = paths::config_file()?;
    ui::kv("Config file", &file.display().to_string());
    if !file.exists() {
        ui::dim("Not found, using defaults");
    }

    println!();
    ui::info("api");
    ui::kv("endpoint", &config.endpoint());
    ui::kv("region", &config.api.region);
    ui::kv("timeout", &format!("{}s", config.api.timeout_seconds));

    println!();
    ui::info("stabilization");
    ui::kv("delay", &format!("{}s", policy.delay_seconds()));
    ui::kv(
        "max wait",
        &format!("{}m", config.stabilization.max_wait_minutes),
    );
    ui::kv("attempts", &policy.budget().to_string());

    if ctx.verbose > 0 {
        println!();
        println!("{}", config.to_toml()?);
    }
    Ok(())
}

fn path() -> Result<()> {
    println!("{}", paths::config_file()?.display());
    Ok(())
}
