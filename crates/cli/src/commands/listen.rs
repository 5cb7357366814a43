//! `keymuxctl listen`

use std::time::Duration;

use anyhow::Result;
use tracing::info;

use keymux_engine::{KeyboardEvent, KeyboardId};

use crate::commands::GlobalOptions;
use crate::error::CliError;
use crate::output;

/// One scan, then print key presses from the selected keyboards until the
/// duration elapses or Ctrl-C.
pub async fn execute(
    opts: &GlobalOptions,
    duration: Option<Duration>,
    requested: &[KeyboardId],
) -> Result<()> {
    let service = opts.service().await?;
    service.scan_now().await?;

    let connected: Vec<KeyboardId> = service
        .registry()
        .find_connected()
        .iter()
        .map(|k| k.id().clone())
        .collect();

    let selected = if requested.is_empty() {
        connected
    } else {
        if let Some(missing) = requested.iter().find(|id| !connected.contains(id)) {
            return Err(CliError::KeyboardNotConnected(missing.to_string()).into());
        }
        requested.to_vec()
    };
    if selected.is_empty() {
        return Err(CliError::NoKeyboards.into());
    }

    let mut events = service.subscribe();
    let session = service
        .start_listening(&selected, |fault| output::print_fault(&fault))
        .await?;
    info!(
        session_id = %session.id,
        keyboards = session.keyboards.len(),
        "Listening, press Ctrl-C to stop"
    );

    let deadline = async {
        match duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event @ KeyboardEvent::KeyInput(_)) => output::print_event(&event, opts.json),
                Some(_) => {}
                None => break,
            },
            () = &mut deadline => break,
            result = tokio::signal::ctrl_c() => {
                result?;
                break;
            }
        }
    }

    service.dispose().await;
    output::print_stats(&service.stats(), opts.json);
    Ok(())
}
