/// Device description fetching and parsing
///
/// Only `friendlyName`, `modelDescription` and `modelName` are read. Elements
/// are matched by local name, so namespace prefixes and attributes do not
/// matter, and everything else in the document is ignored.

use crate::xml::decode_text;
use quick_xml::events::Event;
use quick_xml::Reader;
use raumfeld_core::{DeviceDescriptor, RaumfeldError, Result};
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

/// Fetch and parse the description document at `location`
pub async fn fetch_descriptor(location: &str, timeout: Duration) -> Result<DeviceDescriptor> {
    let client = Client::builder()
        .build()
        .map_err(|e| RaumfeldError::unavailable(location, e))?;

    fetch_descriptor_with(&client, location, timeout).await
}

pub(crate) async fn fetch_descriptor_with(
    client: &Client,
    location: &str,
    timeout: Duration,
) -> Result<DeviceDescriptor> {
    // Reject unusable locations before touching the network
    base_address(location)?;

    debug!("Fetching device description from: {}", location);

    let response = client
        .get(location)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| fetch_error(location, timeout, e))?;

    if !response.status().is_success() {
        return Err(RaumfeldError::unavailable(
            location,
            format!("HTTP status {}", response.status()),
        ));
    }

    let xml = response
        .text()
        .await
        .map_err(|e| fetch_error(location, timeout, e))?;
    parse_descriptor_xml(&xml, location)
}

/// Every fetch failure, timeouts included, means the descriptor is unavailable
fn fetch_error(location: &str, timeout: Duration, e: reqwest::Error) -> RaumfeldError {
    if e.is_timeout() {
        RaumfeldError::unavailable(location, format!("timed out after {:?}", timeout))
    } else {
        RaumfeldError::unavailable(location, e)
    }
}

/// `scheme://host[:port]` of a location URL
pub fn base_address(location: &str) -> Result<String> {
    let url = Url::parse(location)
        .map_err(|e| RaumfeldError::unavailable(location, format!("invalid location URL: {}", e)))?;

    let origin = url.origin();
    if !origin.is_tuple() {
        return Err(RaumfeldError::unavailable(
            location,
            "location URL has no network address",
        ));
    }

    Ok(origin.ascii_serialization())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    FriendlyName,
    ModelDescription,
    ModelName,
}

impl Field {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"friendlyName" => Some(Field::FriendlyName),
            b"modelDescription" => Some(Field::ModelDescription),
            b"modelName" => Some(Field::ModelName),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct DescriptorFields {
    friendly_name: Option<String>,
    model_description: Option<String>,
    model_name: Option<String>,
}

impl DescriptorFields {
    /// First occurrence wins: the root device comes before embedded devices
    fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::FriendlyName => &mut self.friendly_name,
            Field::ModelDescription => &mut self.model_description,
            Field::ModelName => &mut self.model_name,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }
}

/// Parse a device description document fetched from `location`
pub fn parse_descriptor_xml(xml: &str, location: &str) -> Result<DeviceDescriptor> {
    let base_address = base_address(location)?;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut fields = DescriptorFields::default();
    let mut current: Option<Field> = None;
    let mut current_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                current = Field::from_local_name(e.local_name().as_ref());
                current_text.clear();
            }
            Ok(Event::Empty(e)) => {
                if let Some(field) = Field::from_local_name(e.local_name().as_ref()) {
                    fields.set(field, String::new());
                }
            }
            Ok(Event::Text(e)) => {
                if current.is_some() {
                    current_text.push_str(&decode_text(&e));
                }
            }
            Ok(Event::CData(e)) => {
                if current.is_some() {
                    current_text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(_)) => {
                if let Some(field) = current.take() {
                    fields.set(field, current_text.trim().to_string());
                }
                current_text.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(RaumfeldError::malformed(
                    location,
                    format!("XML parsing error at position {}: {}", reader.buffer_position(), e),
                ));
            }
            _ => {}
        }
    }

    match fields {
        DescriptorFields {
            friendly_name: Some(friendly_name),
            model_description: Some(model_description),
            model_name: Some(model_name),
        } => Ok(DeviceDescriptor {
            friendly_name,
            model_description,
            model_name,
            base_address,
            location: location.to_string(),
        }),
        fields => {
            let missing: Vec<&str> = [
                ("friendlyName", fields.friendly_name.is_none()),
                ("modelDescription", fields.model_description.is_none()),
                ("modelName", fields.model_name.is_none()),
            ]
            .into_iter()
            .filter(|(_, absent)| *absent)
            .map(|(name, _)| name)
            .collect();

            Err(RaumfeldError::malformed(
                location,
                format!("missing {}", missing.join(", ")),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCATION: &str = "http://192.168.1.20:47365/3f1a0c9e-description.xml";

    const ZONE_XML: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0" xmlns:dlna="urn:schemas-dlna-org:device-1-0">
  <specVersion><major>1</major><minor>0</minor></specVersion>
  <device>
    <deviceType>urn:schemas-upnp-org:device:MediaRenderer:1</deviceType>
    <friendlyName>Living Room</friendlyName>
    <manufacturer>Raumfeld GmbH</manufacturer>
    <modelDescription>Virtual Media Player</modelDescription>
    <modelName>Raumfeld Virtual Media Player</modelName>
    <dlna:X_DLNADOC>DMR-1.50</dlna:X_DLNADOC>
    <deviceList>
      <device>
        <friendlyName>Embedded</friendlyName>
        <modelDescription>Something else</modelDescription>
        <modelName>Other</modelName>
      </device>
    </deviceList>
  </device>
</root>"#;

    #[test]
    fn test_parse_descriptor_xml() {
        let descriptor = parse_descriptor_xml(ZONE_XML, LOCATION).unwrap();
        assert_eq!(descriptor.friendly_name, "Living Room");
        assert_eq!(descriptor.model_description, "Virtual Media Player");
        assert_eq!(descriptor.model_name, "Raumfeld Virtual Media Player");
        assert_eq!(descriptor.base_address, "http://192.168.1.20:47365");
        assert_eq!(descriptor.location, LOCATION);
        assert!(descriptor.is_zone());
    }

    #[test]
    fn test_parse_prefixed_and_escaped_elements() {
        let xml = r#"<r:root xmlns:r="urn:schemas-upnp-org:device-1-0">
  <r:device>
    <r:friendlyName lang="de">Bad &amp; Flur</r:friendlyName>
    <r:modelDescription><![CDATA[Virtual Media Player]]></r:modelDescription>
    <r:modelName>Raumfeld</r:modelName>
  </r:device>
</r:root>"#;

        let descriptor = parse_descriptor_xml(xml, LOCATION).unwrap();
        assert_eq!(descriptor.friendly_name, "Bad & Flur");
        assert_eq!(descriptor.model_description, "Virtual Media Player");
        assert_eq!(descriptor.model_name, "Raumfeld");
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let xml = r#"<root><device>
    <friendlyName>Living Room</friendlyName>
    <modelName>Raumfeld</modelName>
</device></root>"#;

        let err = parse_descriptor_xml(xml, LOCATION).unwrap_err();
        match err {
            RaumfeldError::DescriptorMalformed { reason, .. } => {
                assert_eq!(reason, "missing modelDescription");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_not_xml_is_malformed() {
        let err = parse_descriptor_xml("<html><body>Not found</body></html>", LOCATION).unwrap_err();
        assert!(matches!(err, RaumfeldError::DescriptorMalformed { .. }));

        let err = parse_descriptor_xml("<root><friendlyName>x</root>", LOCATION).unwrap_err();
        assert!(matches!(err, RaumfeldError::DescriptorMalformed { .. }));
    }

    #[test]
    fn test_empty_element_counts_as_present() {
        let xml = "<root><friendlyName>A</friendlyName><modelDescription/><modelName>B</modelName></root>";
        let descriptor = parse_descriptor_xml(xml, LOCATION).unwrap();
        assert_eq!(descriptor.model_description, "");
    }

    #[test]
    fn test_unknown_entity_keeps_raw_text() {
        let xml = "<root><friendlyName>Caf&eacute; Zone</friendlyName><modelDescription>Virtual Media Player</modelDescription><modelName>Raumfeld</modelName></root>";
        let descriptor = parse_descriptor_xml(xml, LOCATION).unwrap();
        assert_eq!(descriptor.friendly_name, "Caf&eacute; Zone");
    }

    #[test]
    fn test_base_address() {
        assert_eq!(
            base_address("http://10.0.0.5:49152/desc.xml?x=1").unwrap(),
            "http://10.0.0.5:49152"
        );
        assert_eq!(base_address("http://host/desc.xml").unwrap(), "http://host");
        assert!(matches!(
            base_address("not a url"),
            Err(RaumfeldError::DescriptorUnavailable { .. })
        ));
        assert!(base_address("file:///tmp/desc.xml").is_err());
    }
}
