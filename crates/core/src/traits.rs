use crate::error::Result;
use crate::models::{SeekUnit, TrackPositionInfo};
use async_trait::async_trait;

/// Control surface shared by renderers (Raumfeld zones, plain UPnP renderers, ...)
#[async_trait]
pub trait MediaRenderer: Send + Sync {
    /// Human readable name of the renderer
    fn name(&self) -> &str;

    async fn play(&self) -> Result<()>;

    /// Point the transport at `uri` with optional DIDL-Lite metadata
    async fn play_uri(&self, uri: &str, metadata: Option<&str>) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    async fn next(&self) -> Result<()>;

    async fn previous(&self) -> Result<()>;

    async fn seek(&self, target: &str, unit: SeekUnit) -> Result<()>;

    async fn volume(&self) -> Result<u16>;

    async fn set_volume(&self, volume: u16) -> Result<()>;

    async fn mute(&self) -> Result<bool>;

    async fn set_mute(&self, muted: bool) -> Result<()>;

    /// Transport state label as reported by the device (PLAYING, STOPPED, ...)
    async fn transport_state(&self) -> Result<String>;

    async fn position_info(&self) -> Result<TrackPositionInfo>;

    /// Check if the renderer answers control calls
    async fn is_online(&self) -> bool;
}
