use crate::descriptor::fetch_descriptor_with;
use crate::didl::{media_metadata_field, parse_didl};
use crate::responses::*;
use crate::soap::ControlEndpoint;
use async_trait::async_trait;
use raumfeld_core::{
    DeviceDescriptor, DeviceOptions, DidlMetadata, MediaRenderer, RaumfeldError, Result, SeekUnit,
    TrackPositionInfo,
};
use reqwest::Client;
use std::fmt;
use tracing::{debug, info};

/// Playback instance addressed by every action (one per device)
pub const INSTANCE_ID: &str = "1";

const MASTER_CHANNEL: &str = "Master";

pub const RENDERING_CONTROL_PATH: &str = "/RenderingService/Control";
pub const RENDERING_CONTROL_SERVICE: &str = "urn:upnp-org:serviceId:RenderingControl";
pub const AV_TRANSPORT_PATH: &str = "/TransportService/Control";
pub const AV_TRANSPORT_SERVICE: &str = "urn:schemas-upnp-org:service:AVTransport:1";

/// A Raumfeld renderer: its descriptor plus the two control endpoints
///
/// The handle is a stateless proxy. Playback state lives on the device and
/// every operation is a fresh SOAP call; nothing is cached.
#[derive(Clone, Debug)]
pub struct RaumfeldDevice {
    descriptor: DeviceDescriptor,
    rendering_control: ControlEndpoint,
    av_transport: ControlEndpoint,
}

impl RaumfeldDevice {
    /// Fetch the description at `location` and build a handle with default timeouts
    pub async fn connect(location: &str) -> Result<Self> {
        Self::connect_with(location, &DeviceOptions::default()).await
    }

    pub async fn connect_with(location: &str, options: &DeviceOptions) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| RaumfeldError::unavailable(location, e))?;

        let descriptor = fetch_descriptor_with(&client, location, options.descriptor_timeout).await?;
        debug!(
            "Resolved {} ({}, {}) at {}",
            descriptor.friendly_name, descriptor.model_name, descriptor.model_description, location
        );

        Ok(Self::with_client(client, descriptor, options))
    }

    /// Build a handle from an already known descriptor, without network access
    pub fn from_descriptor(descriptor: DeviceDescriptor, options: &DeviceOptions) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| RaumfeldError::control("connect", e))?;

        Ok(Self::with_client(client, descriptor, options))
    }

    fn with_client(client: Client, descriptor: DeviceDescriptor, options: &DeviceOptions) -> Self {
        let rendering_control = ControlEndpoint::new(
            client.clone(),
            &descriptor.base_address,
            RENDERING_CONTROL_PATH,
            RENDERING_CONTROL_SERVICE,
            options.control_timeout,
        );
        let av_transport = ControlEndpoint::new(
            client,
            &descriptor.base_address,
            AV_TRANSPORT_PATH,
            AV_TRANSPORT_SERVICE,
            options.control_timeout,
        );

        Self {
            descriptor,
            rendering_control,
            av_transport,
        }
    }

    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    pub fn location(&self) -> &str {
        &self.descriptor.location
    }

    pub fn friendly_name(&self) -> &str {
        &self.descriptor.friendly_name
    }

    pub fn model_description(&self) -> &str {
        &self.descriptor.model_description
    }

    pub fn model_name(&self) -> &str {
        &self.descriptor.model_name
    }

    pub fn base_address(&self) -> &str {
        &self.descriptor.base_address
    }

    pub fn is_zone(&self) -> bool {
        self.descriptor.is_zone()
    }

    pub fn rendering_control(&self) -> &ControlEndpoint {
        &self.rendering_control
    }

    pub fn av_transport(&self) -> &ControlEndpoint {
        &self.av_transport
    }

    /// Start or resume playback
    pub async fn play(&self) -> Result<()> {
        info!("Starting playback on {}", self);
        self.av_transport
            .call::<EmptyResponse>("Play", &[("InstanceID", INSTANCE_ID), ("Speed", "1")])
            .await?;
        Ok(())
    }

    /// Set the active media source; the device starts playing it
    pub async fn play_uri(&self, uri: &str, metadata: Option<&str>) -> Result<()> {
        info!("Setting AVTransport URI on {}: {}", self, uri);
        self.av_transport
            .call::<EmptyResponse>(
                "SetAVTransportURI",
                &[
                    ("InstanceID", INSTANCE_ID),
                    ("CurrentURI", uri),
                    ("CurrentURIMetaData", metadata.unwrap_or("")),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn next(&self) -> Result<()> {
        info!("Skipping to next track on {}", self);
        self.av_transport
            .call::<EmptyResponse>("Next", &[("InstanceID", INSTANCE_ID)])
            .await?;
        Ok(())
    }

    pub async fn previous(&self) -> Result<()> {
        info!("Skipping to previous track on {}", self);
        self.av_transport
            .call::<EmptyResponse>("Previous", &[("InstanceID", INSTANCE_ID)])
            .await?;
        Ok(())
    }

    pub async fn pause(&self) -> Result<()> {
        info!("Pausing playback on {}", self);
        self.av_transport
            .call::<EmptyResponse>("Pause", &[("InstanceID", INSTANCE_ID)])
            .await?;
        Ok(())
    }

    pub async fn stop(&self) -> Result<()> {
        info!("Stopping playback on {}", self);
        self.av_transport
            .call::<EmptyResponse>("Stop", &[("InstanceID", INSTANCE_ID)])
            .await?;
        Ok(())
    }

    /// Seek to `target`, interpreted according to `unit` (H:MM:SS for times, a number for tracks)
    pub async fn seek(&self, target: &str, unit: SeekUnit) -> Result<SeekResponse> {
        info!("Seeking on {} to {} ({})", self, target, unit.as_str());
        self.av_transport
            .call(
                "Seek",
                &[("InstanceID", INSTANCE_ID), ("Unit", unit.as_str()), ("Target", target)],
            )
            .await
    }

    pub async fn volume(&self) -> Result<u16> {
        let response: VolumeResponse = self
            .rendering_control
            .call("GetVolume", &[("InstanceID", INSTANCE_ID), ("Channel", MASTER_CHANNEL)])
            .await?;
        Ok(response.current_volume)
    }

    pub async fn set_volume(&self, volume: u16) -> Result<()> {
        info!("Setting volume on {} to {}", self, volume);
        let volume = volume.to_string();
        self.rendering_control
            .call::<EmptyResponse>(
                "SetVolume",
                &[
                    ("InstanceID", INSTANCE_ID),
                    ("Channel", MASTER_CHANNEL),
                    ("DesiredVolume", volume.as_str()),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn mute(&self) -> Result<bool> {
        let response: MuteResponse = self
            .rendering_control
            .call("GetMute", &[("InstanceID", INSTANCE_ID), ("Channel", MASTER_CHANNEL)])
            .await?;
        Ok(response.current_mute)
    }

    pub async fn set_mute(&self, muted: bool) -> Result<()> {
        info!("{} {}", if muted { "Muting" } else { "Unmuting" }, self);
        self.rendering_control
            .call::<EmptyResponse>(
                "SetMute",
                &[
                    ("InstanceID", INSTANCE_ID),
                    ("Channel", MASTER_CHANNEL),
                    ("DesiredMute", if muted { "1" } else { "0" }),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn transport_info(&self) -> Result<TransportInfoResponse> {
        self.av_transport
            .call("GetTransportInfo", &[("InstanceID", INSTANCE_ID)])
            .await
    }

    /// Transport state label exactly as the device reports it
    pub async fn transport_state(&self) -> Result<String> {
        Ok(self.transport_info().await?.current_transport_state)
    }

    pub async fn media_info(&self) -> Result<MediaInfoResponse> {
        self.av_transport
            .call("GetMediaInfo", &[("InstanceID", INSTANCE_ID)])
            .await
    }

    pub async fn current_uri(&self) -> Result<String> {
        Ok(self.media_info().await?.current_uri)
    }

    /// Descriptive field (title, else description) of the current media's metadata
    pub async fn current_uri_metadata(&self) -> Result<String> {
        let info = self.media_info().await?;
        Ok(media_metadata_field(&info.current_uri_metadata))
    }

    pub async fn current_uri_details(&self) -> Result<DidlMetadata> {
        let info = self.media_info().await?;
        Ok(parse_didl(&info.current_uri_metadata))
    }

    async fn position_info_response(&self) -> Result<PositionInfoResponse> {
        self.av_transport
            .call("GetPositionInfo", &[("InstanceID", INSTANCE_ID)])
            .await
    }

    /// Track, duration, metadata field, URI and times from a single `GetPositionInfo` call
    pub async fn position_info(&self) -> Result<TrackPositionInfo> {
        Ok(self.position_info_response().await?.into())
    }

    pub async fn track_uri(&self) -> Result<String> {
        Ok(self.position_info_response().await?.track_uri)
    }

    /// Descriptive field (title, else album) of the current track's metadata
    pub async fn track_metadata(&self) -> Result<String> {
        Ok(self.position_info().await?.track_metadata)
    }

    pub async fn track_details(&self) -> Result<DidlMetadata> {
        let response = self.position_info_response().await?;
        Ok(parse_didl(&response.track_metadata))
    }

    pub async fn track_duration(&self) -> Result<String> {
        Ok(self.position_info_response().await?.track_duration)
    }

    pub async fn track_rel_time(&self) -> Result<String> {
        Ok(self.position_info_response().await?.rel_time)
    }

    pub async fn track_abs_time(&self) -> Result<String> {
        Ok(self.position_info_response().await?.abs_time)
    }

    /// Check if the device answers control calls
    pub async fn is_online(&self) -> bool {
        match self.transport_info().await {
            Ok(_) => {
                debug!("Device '{}' at {} is online", self, self.base_address());
                true
            }
            Err(e) => {
                debug!("Device '{}' at {} is offline: {}", self, self.base_address(), e);
                false
            }
        }
    }
}

impl fmt::Display for RaumfeldDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor.friendly_name)
    }
}

#[async_trait]
impl MediaRenderer for RaumfeldDevice {
    fn name(&self) -> &str {
        self.friendly_name()
    }

    async fn play(&self) -> Result<()> {
        RaumfeldDevice::play(self).await
    }

    async fn play_uri(&self, uri: &str, metadata: Option<&str>) -> Result<()> {
        RaumfeldDevice::play_uri(self, uri, metadata).await
    }

    async fn pause(&self) -> Result<()> {
        RaumfeldDevice::pause(self).await
    }

    async fn stop(&self) -> Result<()> {
        RaumfeldDevice::stop(self).await
    }

    async fn next(&self) -> Result<()> {
        RaumfeldDevice::next(self).await
    }

    async fn previous(&self) -> Result<()> {
        RaumfeldDevice::previous(self).await
    }

    async fn seek(&self, target: &str, unit: SeekUnit) -> Result<()> {
        RaumfeldDevice::seek(self, target, unit).await.map(|_| ())
    }

    async fn volume(&self) -> Result<u16> {
        RaumfeldDevice::volume(self).await
    }

    async fn set_volume(&self, volume: u16) -> Result<()> {
        RaumfeldDevice::set_volume(self, volume).await
    }

    async fn mute(&self) -> Result<bool> {
        RaumfeldDevice::mute(self).await
    }

    async fn set_mute(&self, muted: bool) -> Result<()> {
        RaumfeldDevice::set_mute(self, muted).await
    }

    async fn transport_state(&self) -> Result<String> {
        RaumfeldDevice::transport_state(self).await
    }

    async fn position_info(&self) -> Result<TrackPositionInfo> {
        RaumfeldDevice::position_info(self).await
    }

    async fn is_online(&self) -> bool {
        RaumfeldDevice::is_online(self).await
    }
}
