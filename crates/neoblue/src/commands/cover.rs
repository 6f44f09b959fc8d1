//! `neoblue cover`: the user-facing reading for a payload.

use neoblue_core::CoverState;

use crate::cli::{GlobalOpts, PayloadArgs};
use crate::commands::decode::decoded_record;
use crate::error::CliError;
use crate::output;

fn cover_detail(c: &CoverState, color: bool) -> String {
    output::detail(
        &[
            ("Position", format!("{}%", c.position)),
            ("Target", format!("{}%", c.target_position)),
            ("Motion", c.motion.to_string()),
            ("Closed", if c.is_closed() { "yes" } else { "no" }.to_owned()),
            ("Battery", output::battery(c.battery_level, color)),
        ],
        color,
    )
}

pub fn handle(args: &PayloadArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cover = CoverState::from(&decoded_record(args)?);

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &cover,
        |c| cover_detail(c, color),
        |c| c.position.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
