use crate::audio::{AudioDevice, DeviceRole};
use crate::error::Result;
use dialoguer::{theme::ColorfulTheme, Select};

/// Ask the user to pick a device for `role`.
///
/// Returns `None` when there is nothing to pick from or the prompt was
/// cancelled, meaning the current selection stays as it is.
pub fn prompt_device(
    role: DeviceRole,
    devices: &[AudioDevice],
    current: Option<&str>,
) -> Result<Option<String>> {
    if devices.is_empty() {
        println!("No {} devices found", role);
        return Ok(None);
    }

    let items: Vec<String> = devices.iter().map(describe).collect();

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Select audio {} device", role))
        .items(&items)
        .default(default_index(devices, current))
        .interact_opt()?;

    Ok(selection.map(|index| devices[index].name.clone()))
}

/// Preselect the current device, else the host default, else the first one
fn default_index(devices: &[AudioDevice], current: Option<&str>) -> usize {
    current
        .and_then(|name| devices.iter().position(|d| d.name == name))
        .or_else(|| devices.iter().position(|d| d.is_default))
        .unwrap_or(0)
}

fn describe(device: &AudioDevice) -> String {
    let marker = if device.is_default { " [default]" } else { "" };
    format!(
        "{} ({}Hz, {} ch){}",
        device.name, device.sample_rate, device.channels, marker
    )
}
