//! Config subcommand handlers.

use std::fmt::Write;

use neoblue_config::{Config, Device};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::commands::{config_file, load};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

fn format_config(cfg: &Config) -> Result<String, CliError> {
    toml::to_string_pretty(cfg).map_err(|e| CliError::Render {
        format: "TOML",
        message: e.to_string(),
    })
}

fn save(cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    neoblue_config::save_config_to(cfg, &config_file(global))?;
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = load(global)?;
            let toml = format_config(&cfg)?;
            let out = output::render_single(
                global.output,
                &cfg,
                |_| toml.trim_end().to_owned(),
                |c| {
                    let mut s = String::new();
                    for (name, d) in &c.devices {
                        let _ = writeln!(s, "{name} {}", d.address);
                    }
                    s.trim_end().to_owned()
                },
            )?;
            output::print_output(&out, global.quiet);
        }

        ConfigCommand::Path => {
            output::print_output(&config_file(global).display().to_string(), global.quiet);
        }

        ConfigCommand::AddDevice {
            name,
            address,
            label,
            connect_timeout,
            command_timeout,
        } => {
            let mut cfg = load(global)?;
            let device = Device {
                label,
                connect_timeout,
                command_timeout,
                ..Device::new(address)
            };
            let replaced = cfg.add_device(&name, device)?;
            cfg.device_config(&name)?;
            save(&cfg, global)?;
            if !global.quiet {
                let verb = if replaced.is_some() { "updated" } else { "added" };
                eprintln!("   ✓ Device '{name}' {verb}");
            }
        }

        ConfigCommand::RemoveDevice { name } => {
            let mut cfg = load(global)?;
            cfg.remove_device(&name)?;
            save(&cfg, global)?;
            if !global.quiet {
                eprintln!("   ✓ Device '{name}' removed");
            }
        }
    }

    Ok(())
}
