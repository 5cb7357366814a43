//! `keymuxctl list`

use anyhow::Result;

use crate::commands::GlobalOptions;
use crate::error::CliError;
use crate::output;

pub async fn execute(opts: &GlobalOptions, all: bool) -> Result<()> {
    let service = opts.service().await?;

    let devices = if all {
        service.list_all_devices().await?
    } else {
        service.list_keyboards().await?
    };

    if devices.is_empty() && !all {
        return Err(CliError::NoKeyboards.into());
    }

    output::print_device_list(&devices, opts.json, all);
    Ok(())
}
