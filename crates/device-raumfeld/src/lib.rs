//! Discovery and control of Raumfeld renderers
//!
//! This crate provides:
//! - SSDP discovery of MediaRenderer devices, narrowed down to Raumfeld zones
//! - Device description fetching and parsing
//! - SOAP control of the AVTransport and RenderingControl services
//! - DIDL-Lite metadata extraction
pub mod descriptor;
pub mod device;
pub mod didl;
pub mod discovery;
pub mod responses;
pub mod soap;
mod xml;

pub use descriptor::{base_address, fetch_descriptor, parse_descriptor_xml};
pub use device::{
    RaumfeldDevice, AV_TRANSPORT_PATH, AV_TRANSPORT_SERVICE, INSTANCE_ID, RENDERING_CONTROL_PATH,
    RENDERING_CONTROL_SERVICE,
};
pub use didl::{media_metadata_field, parse_didl, track_metadata_field, MEDIA_METADATA_TAGS, TRACK_METADATA_TAGS};
pub use discovery::{
    build_msearch, discover, discover_with, parse_location, resolve_locations, search_locations,
    select_devices, LocationSet,
};
pub use responses::*;
pub use soap::{build_envelope, ActionResponse, ControlEndpoint, FromActionResponse};

pub use raumfeld_core::*;
