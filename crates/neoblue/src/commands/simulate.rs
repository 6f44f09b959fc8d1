//! `neoblue simulate`: run a cover command through the real coordinator
//! against the in-memory radio and print what went over the link.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;

use neoblue_api::sim::{SimRadio, SimTransport, TransportEvent, Visibility};
use neoblue_api::{DeviceAddress, RawAdvertisement};
use neoblue_core::{CoordinatorConfig, CoreError, DeviceRegistry};

use crate::cli::{CoverAction, GlobalOpts, SimulateArgs};
use crate::commands::{load, parse_hex};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Clone, Serialize, Tabled)]
struct EventRow {
    #[tabled(rename = "#")]
    step: usize,
    #[tabled(rename = "Event")]
    event: &'static str,
    #[tabled(rename = "Link")]
    link: u64,
    #[tabled(rename = "Detail")]
    detail: String,
}

fn to_row(step: usize, event: &TransportEvent) -> EventRow {
    let (name, link, detail) = match event {
        TransportEvent::Connect {
            link_id,
            connectable,
            ..
        } => (
            "connect",
            *link_id,
            if *connectable {
                "connectable".to_owned()
            } else {
                "non-connectable".to_owned()
            },
        ),
        TransportEvent::Write {
            link_id, command, ..
        } => ("write", *link_id, command.to_string()),
        TransportEvent::Disconnect { link_id, .. } => ("disconnect", *link_id, String::new()),
    };
    EventRow {
        step: step + 1,
        event: name,
        link,
        detail,
    }
}

/// Device name from the config, or a literal address with default tuning.
fn resolve(
    args: &SimulateArgs,
    global: &GlobalOpts,
) -> Result<(DeviceAddress, CoordinatorConfig), CliError> {
    let cfg = load(global)?;
    if cfg.devices.contains_key(&args.device) {
        return Ok(cfg.device_config(&args.device)?);
    }
    // A bare word is a device name; only separated hex is taken as an address.
    let not_found = || CliError::DeviceNotFound {
        name: args.device.clone(),
    };
    let address = neoblue_config::validate_address(&args.device).map_err(|_| not_found())?;
    if !address.as_str().contains(':') {
        return Err(not_found());
    }
    Ok((address, cfg.coordinator_config()?))
}

async fn run_action(
    registry: &DeviceRegistry,
    address: &DeviceAddress,
    action: CoverAction,
) -> Result<(), CoreError> {
    let coordinator = registry.register(address.clone());
    match action {
        CoverAction::Open => coordinator.open().await,
        CoverAction::Close => coordinator.close().await,
        CoverAction::Stop => coordinator.stop().await,
        CoverAction::Position { value } => {
            let position =
                u8::try_from(value).map_err(|_| CoreError::InvalidPosition { value })?;
            coordinator.set_cover_position(position).await
        }
    }
}

pub async fn handle(args: &SimulateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (address, config) = resolve(args, global)?;

    let radio = Arc::new(SimRadio::new());
    let transport = Arc::new(SimTransport::new());
    transport.set_write_failure(args.fail_write.as_deref());

    if let Some(hex) = &args.payload {
        let mut adv = RawAdvertisement::new(address.clone())
            .with_rssi(config.fallback_rssi)
            .with_manufacturer_data(config.manufacturer_id, parse_hex(hex)?);
        if args.non_connectable {
            adv = adv.non_connectable();
        }
        if args.absent {
            radio.store_advertisement(adv);
        } else {
            radio.advertise(&adv);
        }
    } else if !args.absent {
        let visibility = if args.non_connectable {
            Visibility::NonConnectable
        } else {
            Visibility::Connectable
        };
        radio.set_visibility(&address, visibility);
    }

    let registry = DeviceRegistry::new(radio, transport.clone(), config);
    let result = run_action(&registry, &address, args.action).await;
    registry.shutdown_all();

    let rows: Vec<EventRow> = transport
        .events()
        .iter()
        .enumerate()
        .map(|(i, e)| to_row(i, e))
        .collect();
    let out = output::render_list(
        global.output,
        &rows,
        EventRow::clone,
        |r| format!("{} {}", r.event, r.detail).trim_end().to_owned(),
    )?;
    output::print_output(&out, global.quiet);

    result.map_err(CliError::from)
}
