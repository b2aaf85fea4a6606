use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// `modelDescription` advertised by Raumfeld zone (virtual) renderers
pub const ZONE_MODEL_DESCRIPTION: &str = "Virtual Media Player";

/// Identity of a device, read from its description document at discovery time
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub friendly_name: String,
    pub model_description: String,
    pub model_name: String,
    /// `scheme://host[:port]` of the location URL, root of both control endpoints
    pub base_address: String,
    /// URL the description document was fetched from
    pub location: String,
}

impl DeviceDescriptor {
    /// Whether this device is a zone rather than a physical unit
    pub fn is_zone(&self) -> bool {
        self.model_description == ZONE_MODEL_DESCRIPTION
    }
}

/// Everything `GetPositionInfo` reports about the current track
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackPositionInfo {
    pub track: String,
    pub track_duration: String, // H:MM:SS
    /// Descriptive field pulled out of the nested DIDL-Lite track metadata
    pub track_metadata: String,
    pub track_uri: String,
    pub rel_time: String,
    pub abs_time: String,
}

/// Addressing mode of a `Seek` target
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeekUnit {
    #[default]
    AbsTime,
    RelTime,
    TrackNr,
}

impl SeekUnit {
    /// Value sent in the `Unit` argument
    pub fn as_str(&self) -> &'static str {
        match self {
            SeekUnit::AbsTime => "ABS_TIME",
            SeekUnit::RelTime => "REL_TIME",
            SeekUnit::TrackNr => "TRACK_NR",
        }
    }
}

/// Error type for invalid seek unit strings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseSeekUnitError(pub String);

impl std::fmt::Display for ParseSeekUnitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid seek unit '{}'", self.0)
    }
}

impl std::error::Error for ParseSeekUnitError {}

impl FromStr for SeekUnit {
    type Err = ParseSeekUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "ABS_TIME" => Ok(SeekUnit::AbsTime),
            "REL_TIME" => Ok(SeekUnit::RelTime),
            "TRACK_NR" => Ok(SeekUnit::TrackNr),
            _ => Err(ParseSeekUnitError(s.to_string())),
        }
    }
}

/// Fields of a DIDL-Lite item or container; anything the device left out is `None`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidlMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub creator: Option<String>,
    pub description: Option<String>,
    pub album_art_uri: Option<String>,
    pub upnp_class: Option<String>,
}

impl DidlMetadata {
    pub fn is_empty(&self) -> bool {
        *self == DidlMetadata::default()
    }
}
