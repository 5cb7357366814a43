//! Human and JSON output for keymuxctl
//!
//! JSON output goes to stdout one document per line so it can be piped;
//! logs always go to stderr.

use std::error::Error as _;

use anyhow::Error;
use colored::Colorize;
use serde_json::json;

use keymux_engine::{KeyboardEvent, ListenerFault, RegistryStats};
use keymux_hid::HidDeviceDescriptor;

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": { "message": error.to_string() }
    });
    println!("{error_json}");
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

pub fn print_device_list(devices: &[HidDeviceDescriptor], json: bool, all: bool) {
    if json {
        let output = json!({ "success": true, "devices": devices });
        println!("{output}");
        return;
    }

    if devices.is_empty() {
        println!("{}", "No keyboards found".yellow());
        return;
    }

    let heading = if all { "HID Devices:" } else { "Keyboards:" };
    println!("{}", heading.bold());
    for device in devices {
        println!(
            "  {} {} ({:04x}:{:04x})",
            "●".green(),
            device.display_name().bold(),
            device.vendor_id,
            device.product_id,
        );
        println!("    Path: {}", device.path);
        if all {
            println!("    Usage: {:#06x}/{:#06x}", device.usage_page, device.usage);
        }
    }
}

pub fn format_event(event: &KeyboardEvent) -> String {
    match event {
        KeyboardEvent::KeyboardConnected(info) => {
            let name = info.product.as_deref().unwrap_or("keyboard");
            format!(
                "{} {} {} ({})",
                "+".green().bold(),
                info.id,
                name,
                info.device_path.dimmed()
            )
        }
        KeyboardEvent::KeyboardDisconnected { id } => {
            format!("{} {}", "-".red().bold(), id)
        }
        KeyboardEvent::KeyInput(input) => {
            let time = input.timestamp.format("%H:%M:%S%.3f");
            if input.modifiers.is_empty() {
                format!("{} {} {}", time.to_string().dimmed(), input.keyboard_id, input.key.bold())
            } else {
                format!(
                    "{} {} {}+{}",
                    time.to_string().dimmed(),
                    input.keyboard_id,
                    input.modifiers,
                    input.key.bold()
                )
            }
        }
    }
}

pub fn print_event(event: &KeyboardEvent, json: bool) {
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => eprintln!("Failed to format event as JSON: {e}"),
        }
    } else {
        println!("{}", format_event(event));
    }
}

pub fn print_fault(fault: &ListenerFault) {
    eprintln!(
        "{} {}: {}",
        "Warning:".yellow().bold(),
        fault.keyboard_id,
        fault.error
    );
}

pub fn print_stats(stats: &RegistryStats, json: bool) {
    if json {
        let output = json!({ "success": true, "stats": stats });
        println!("{output}");
        return;
    }

    println!(
        "{} {} inputs from {} keyboards",
        "Done:".bold(),
        stats.total_inputs,
        stats.connected_keyboards
    );
    if let Some(id) = &stats.most_active {
        println!("  Most active: {id}");
    }
}
