use crate::Target;
use anyhow::{bail, Context, Result};
use raumfeld_core::{DeviceDescriptor, DiscoveryConfig, MediaRenderer, SeekUnit, TrackPositionInfo};
use raumfeld_device::{discover_with, RaumfeldDevice};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default)]
pub struct Output {
    pub json: bool,
}

impl Output {
    fn print<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct Status {
    name: String,
    transport_state: String,
    volume: u16,
    muted: bool,
    position: TrackPositionInfo,
}

/// Device whose friendly name contains `wanted` (ignoring case), else the first one
pub fn pick_device(devices: Vec<RaumfeldDevice>, wanted: Option<&str>) -> Option<RaumfeldDevice> {
    match wanted {
        Some(wanted) => {
            let wanted = wanted.to_lowercase();
            devices
                .into_iter()
                .find(|d| d.friendly_name().to_lowercase().contains(&wanted))
        }
        None => devices.into_iter().next(),
    }
}

async fn resolve(config: &DiscoveryConfig, target: &Target) -> Result<RaumfeldDevice> {
    if let Some(location) = &target.location {
        return RaumfeldDevice::connect_with(location, &config.device)
            .await
            .with_context(|| format!("Failed to connect to {}", location));
    }

    let devices = discover_with(config).await;
    if devices.is_empty() {
        bail!("No Raumfeld devices found");
    }

    match pick_device(devices, target.device.as_deref()) {
        Some(device) => {
            tracing::debug!("Using device '{}' at {}", device, device.location());
            Ok(device)
        }
        None => bail!(
            "No device matching '{}'",
            target.device.as_deref().unwrap_or_default()
        ),
    }
}

pub async fn discover(config: &DiscoveryConfig, out: Output) -> Result<()> {
    let devices = discover_with(config).await;
    let descriptors: Vec<&DeviceDescriptor> = devices.iter().map(|d| d.descriptor()).collect();

    out.print(&descriptors, || {
        if descriptors.is_empty() {
            return "No Raumfeld devices found".to_string();
        }
        descriptors
            .iter()
            .map(|d| {
                format!(
                    "{}\n  model: {} ({})\n  location: {}",
                    d.friendly_name, d.model_name, d.model_description, d.location
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

pub async fn status(config: &DiscoveryConfig, target: &Target, out: Output) -> Result<()> {
    let device = resolve(config, target).await?;
    let renderer: &dyn MediaRenderer = &device;

    let status = Status {
        name: renderer.name().to_string(),
        transport_state: renderer.transport_state().await?,
        volume: renderer.volume().await?,
        muted: renderer.mute().await?,
        position: renderer.position_info().await?,
    };

    out.print(&status, || {
        format!(
            "{}: {}\n  volume: {}{}\n  track {}: {}\n  position: {} / {}",
            status.name,
            status.transport_state,
            status.volume,
            if status.muted { " (muted)" } else { "" },
            status.position.track,
            status.position.track_metadata,
            status.position.rel_time,
            status.position.track_duration
        )
    })
}

pub async fn volume(config: &DiscoveryConfig, target: &Target, level: Option<u16>, out: Output) -> Result<()> {
    let device = resolve(config, target).await?;

    if let Some(level) = level {
        device.set_volume(level).await?;
    }

    let volume = device.volume().await?;
    out.print(&volume, || format!("{}: volume {}", device, volume))
}

pub async fn mute(config: &DiscoveryConfig, target: &Target, muted: Option<bool>, out: Output) -> Result<()> {
    let device = resolve(config, target).await?;

    if let Some(muted) = muted {
        device.set_mute(muted).await?;
    }

    let muted = device.mute().await?;
    out.print(&muted, || {
        format!("{}: {}", device, if muted { "muted" } else { "not muted" })
    })
}

pub async fn play(config: &DiscoveryConfig, target: &Target, uri: Option<&str>, metadata: Option<&str>) -> Result<()> {
    let device = resolve(config, target).await?;

    match uri {
        Some(uri) => device.play_uri(uri, metadata).await?,
        None => device.play().await?,
    }
    Ok(())
}

pub async fn pause(config: &DiscoveryConfig, target: &Target) -> Result<()> {
    resolve(config, target).await?.pause().await?;
    Ok(())
}

pub async fn stop(config: &DiscoveryConfig, target: &Target) -> Result<()> {
    resolve(config, target).await?.stop().await?;
    Ok(())
}

pub async fn next(config: &DiscoveryConfig, target: &Target) -> Result<()> {
    resolve(config, target).await?.next().await?;
    Ok(())
}

pub async fn previous(config: &DiscoveryConfig, target: &Target) -> Result<()> {
    resolve(config, target).await?.previous().await?;
    Ok(())
}

pub async fn seek(config: &DiscoveryConfig, target: &Target, position: &str, unit: SeekUnit) -> Result<()> {
    let device = resolve(config, target).await?;
    device
        .seek(position, unit)
        .await
        .with_context(|| format!("Failed to seek {} to {}", device, position))?;
    Ok(())
}
