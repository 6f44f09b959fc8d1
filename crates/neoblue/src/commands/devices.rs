//! `neoblue devices`: the configured blinds.

use serde::Serialize;
use tabled::Tabled;

use neoblue_config::Config;

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::commands::load;
use crate::error::CliError;
use crate::output;

/// One configured blind with its effective tuning.
#[derive(Debug, Serialize)]
struct DeviceView {
    name: String,
    address: String,
    label: Option<String>,
    connect_timeout_secs: u64,
    command_timeout_secs: u64,
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Connect")]
    connect: String,
    #[tabled(rename = "Command")]
    command: String,
}

fn to_row(d: &DeviceView) -> DeviceRow {
    DeviceRow {
        name: d.name.clone(),
        address: d.address.clone(),
        label: d.label.clone().unwrap_or_default(),
        connect: format!("{}s", d.connect_timeout_secs),
        command: format!("{}s", d.command_timeout_secs),
    }
}

fn view(cfg: &Config, name: &str) -> Result<DeviceView, CliError> {
    let (address, tuning) = cfg.device_config(name)?;
    let label = cfg.devices.get(name).and_then(|d| d.label.clone());
    Ok(DeviceView {
        name: name.to_owned(),
        address: address.to_string(),
        label,
        connect_timeout_secs: tuning.connect_timeout.as_secs(),
        command_timeout_secs: tuning.command_timeout.as_secs(),
    })
}

pub fn handle(args: &DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = load(global)?;

    let out = match &args.command {
        DevicesCommand::List => {
            let views = cfg
                .devices
                .keys()
                .map(|name| view(&cfg, name))
                .collect::<Result<Vec<_>, _>>()?;
            output::render_list(global.output, &views, to_row, |d| d.name.clone())?
        }
        DevicesCommand::Get { name } => {
            let d = view(&cfg, name)?;
            let color = output::should_color(global.color);
            output::render_single(
                global.output,
                &d,
                |d| {
                    output::detail(
                        &[
                            ("Name", d.name.clone()),
                            ("Address", d.address.clone()),
                            ("Label", d.label.clone().unwrap_or_else(|| "-".into())),
                            ("Connect timeout", format!("{}s", d.connect_timeout_secs)),
                            ("Command timeout", format!("{}s", d.command_timeout_secs)),
                        ],
                        color,
                    )
                },
                |d| d.address.clone(),
            )?
        }
    };

    output::print_output(&out, global.quiet);
    Ok(())
}
