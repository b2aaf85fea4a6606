//! Typed response records, one per control action

use crate::didl::track_metadata_field;
use crate::soap::{ActionResponse, FromActionResponse};
use raumfeld_core::{RaumfeldError, Result, TrackPositionInfo};
use std::collections::HashMap;

/// Actions with no output arguments (Play, Pause, SetVolume, ...)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmptyResponse;

impl FromActionResponse for EmptyResponse {
    fn from_response(_response: &ActionResponse) -> Result<Self> {
        Ok(EmptyResponse)
    }
}

/// RenderingControl `GetVolume`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VolumeResponse {
    pub current_volume: u16,
}

impl FromActionResponse for VolumeResponse {
    fn from_response(response: &ActionResponse) -> Result<Self> {
        Ok(Self {
            current_volume: response.parse("CurrentVolume")?,
        })
    }
}

/// RenderingControl `GetMute`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MuteResponse {
    pub current_mute: bool,
}

impl FromActionResponse for MuteResponse {
    fn from_response(response: &ActionResponse) -> Result<Self> {
        let value = response.require("CurrentMute")?.trim();

        // Wire format is 0/1, any other nonzero number also means muted
        let current_mute = match value {
            "true" | "True" | "yes" => true,
            "false" | "False" | "no" => false,
            other => other.parse::<i64>().map(|n| n != 0).map_err(|_| {
                RaumfeldError::control(&response.action, format!("invalid CurrentMute value: {}", other))
            })?,
        };

        Ok(Self { current_mute })
    }
}

/// AVTransport `GetTransportInfo`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportInfoResponse {
    /// PLAYING, PAUSED_PLAYBACK, STOPPED, TRANSITIONING, NO_MEDIA_PRESENT, ...
    pub current_transport_state: String,
    pub current_transport_status: String,
    pub current_speed: String,
}

impl FromActionResponse for TransportInfoResponse {
    fn from_response(response: &ActionResponse) -> Result<Self> {
        Ok(Self {
            current_transport_state: response.require("CurrentTransportState")?.to_string(),
            current_transport_status: response.text("CurrentTransportStatus"),
            current_speed: response.text("CurrentSpeed"),
        })
    }
}

/// AVTransport `GetMediaInfo`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaInfoResponse {
    pub nr_tracks: String,
    pub media_duration: String,
    pub current_uri: String,
    /// Raw DIDL-Lite document
    pub current_uri_metadata: String,
    pub next_uri: String,
    pub play_medium: String,
}

impl FromActionResponse for MediaInfoResponse {
    fn from_response(response: &ActionResponse) -> Result<Self> {
        Ok(Self {
            nr_tracks: response.text("NrTracks"),
            media_duration: response.text("MediaDuration"),
            current_uri: response.require("CurrentURI")?.to_string(),
            current_uri_metadata: response.text("CurrentURIMetaData"),
            next_uri: response.text("NextURI"),
            play_medium: response.text("PlayMedium"),
        })
    }
}

/// AVTransport `GetPositionInfo`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PositionInfoResponse {
    pub track: String,
    pub track_duration: String,
    /// Raw DIDL-Lite document
    pub track_metadata: String,
    pub track_uri: String,
    pub rel_time: String,
    pub abs_time: String,
}

impl FromActionResponse for PositionInfoResponse {
    fn from_response(response: &ActionResponse) -> Result<Self> {
        Ok(Self {
            track: response.require("Track")?.to_string(),
            track_duration: response.text("TrackDuration"),
            track_metadata: response.text("TrackMetaData"),
            track_uri: response.text("TrackURI"),
            rel_time: response.text("RelTime"),
            abs_time: response.text("AbsTime"),
        })
    }
}

impl From<PositionInfoResponse> for TrackPositionInfo {
    fn from(response: PositionInfoResponse) -> Self {
        TrackPositionInfo {
            track_metadata: track_metadata_field(&response.track_metadata),
            track: response.track,
            track_duration: response.track_duration,
            track_uri: response.track_uri,
            rel_time: response.rel_time,
            abs_time: response.abs_time,
        }
    }
}

/// AVTransport `Seek`; output arguments are passed through uninterpreted
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeekResponse {
    pub fields: HashMap<String, String>,
}

impl FromActionResponse for SeekResponse {
    fn from_response(response: &ActionResponse) -> Result<Self> {
        Ok(Self {
            fields: response.fields.clone(),
        })
    }
}
