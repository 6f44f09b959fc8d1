//! `neoblue decode`: payload bytes to the coordinator's status record.

use neoblue_core::store::merge;
use neoblue_core::{DEFAULT_FALLBACK_RSSI, StatusRecord, StatusUpdate};

use crate::cli::{GlobalOpts, PayloadArgs};
use crate::commands::parse_payload;
use crate::error::CliError;
use crate::output;

/// The record a freshly seeded coordinator holds after this payload.
pub fn decoded_record(args: &PayloadArgs) -> Result<StatusRecord, CliError> {
    let payload = parse_payload(&args.payload)?;
    let seed = StatusRecord::seed(args.rssi.unwrap_or(DEFAULT_FALLBACK_RSSI));
    Ok(merge(&seed, &StatusUpdate::from(payload), args.rssi))
}

fn yes_no(v: bool) -> String {
    String::from(if v { "yes" } else { "no" })
}

fn record_detail(r: &StatusRecord, color: bool) -> String {
    output::detail(
        &[
            ("Battery", output::battery(r.battery_level, color)),
            ("Position", format!("{}%", r.current_position)),
            ("Target", format!("{}%", r.target_position)),
            ("Signal", format!("{} dBm", r.signal_strength)),
            ("Motor running", yes_no(r.motor_running)),
            (
                "Direction",
                if r.motor_direction_down { "down" } else { "up" }.to_owned(),
            ),
            ("Up limit set", yes_no(r.up_limit_set)),
            ("Down limit set", yes_no(r.down_limit_set)),
            ("Touch control", yes_no(r.touch_control)),
            ("Charging", yes_no(r.charging)),
            ("Channel setting", yes_no(r.channel_setting_mode)),
            ("Reverse rotation", yes_no(r.reverse_rotation)),
            ("Limit range", r.limit_range_size.to_string()),
        ],
        color,
    )
}

pub fn handle(args: &PayloadArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let record = decoded_record(args)?;
    tracing::debug!(?record, "decoded payload");

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &record,
        |r| record_detail(r, color),
        |r| {
            format!(
                "{} {} {}",
                r.battery_level, r.current_position, r.target_position
            )
        },
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
