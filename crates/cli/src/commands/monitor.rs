//! `keymuxctl monitor`

use anyhow::Result;
use tracing::info;

use crate::commands::GlobalOptions;
use crate::output;

/// Print lifecycle events until Ctrl-C.
pub async fn execute(opts: &GlobalOptions) -> Result<()> {
    let service = opts.service().await?;
    let mut events = service.subscribe();

    service.start_monitoring().await?;
    info!("Monitoring keyboards, press Ctrl-C to stop");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => output::print_event(&event, opts.json),
                None => break,
            },
            result = tokio::signal::ctrl_c() => {
                result?;
                break;
            }
        }
    }

    service.dispose().await;
    Ok(())
}
