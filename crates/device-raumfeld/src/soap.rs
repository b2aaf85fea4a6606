/// SOAP control of a single UPnP service endpoint
///
/// Every action goes through [`ControlEndpoint::call`]: the request envelope is
/// built from the action name and its arguments, posted to the control URL, and
/// the `<ActionResponse>` children are decoded into the record type asked for.

use crate::xml::{decode_text, leaf_texts, local_name};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use raumfeld_core::{RaumfeldError, Result, UpnpFault};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// A decodable response record for one action
pub trait FromActionResponse: Sized {
    fn from_response(response: &ActionResponse) -> Result<Self>;
}

/// Output arguments of an action, keyed by element local name
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionResponse {
    pub action: String,
    pub fields: HashMap<String, String>,
}

impl ActionResponse {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Value of `name`, or an empty string when the device left it out
    pub fn text(&self, name: &str) -> String {
        self.get(name).unwrap_or_default().to_string()
    }

    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name).ok_or_else(|| {
            RaumfeldError::control(
                &self.action,
                format!("missing {} in {}Response", name, self.action),
            )
        })
    }

    pub fn parse<T: FromStr>(&self, name: &str) -> Result<T> {
        let value = self.require(name)?;
        value.trim().parse().map_err(|_| {
            RaumfeldError::control(&self.action, format!("invalid {} value: {}", name, value))
        })
    }

    /// Decode the `<{action}Response>` element of a SOAP response body
    pub fn from_xml(action: &str, xml: &str) -> Result<Self> {
        let expected = format!("{}Response", action);

        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut fields = HashMap::new();
        let mut depth = 0usize;
        let mut response_depth: Option<usize> = None;
        let mut current_field: Option<String> = None;
        let mut current_text = String::new();
        let mut complete = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    depth += 1;
                    let name = local_name(&e);
                    match response_depth {
                        None if name == expected => response_depth = Some(depth),
                        Some(d) if depth == d + 1 => {
                            current_field = Some(name);
                            current_text.clear();
                        }
                        _ => {}
                    }
                }
                Ok(Event::Empty(e)) => {
                    if response_depth == Some(depth) {
                        fields.insert(local_name(&e), String::new());
                    } else if response_depth.is_none() && local_name(&e) == expected {
                        complete = true;
                        break;
                    }
                }
                Ok(Event::Text(e)) => {
                    if current_field.is_some() {
                        current_text.push_str(&decode_text(&e));
                    }
                }
                Ok(Event::CData(e)) => {
                    if current_field.is_some() {
                        current_text.push_str(&String::from_utf8_lossy(&e));
                    }
                }
                Ok(Event::End(_)) => {
                    if let Some(d) = response_depth {
                        if depth == d + 1 {
                            if let Some(name) = current_field.take() {
                                fields.insert(name, std::mem::take(&mut current_text));
                            }
                        } else if depth == d {
                            complete = true;
                            break;
                        }
                    }
                    depth = depth.saturating_sub(1);
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(RaumfeldError::control(
                        action,
                        format!("malformed SOAP response at position {}: {}", reader.buffer_position(), e),
                    ));
                }
                _ => {}
            }
        }

        if !complete {
            if let Some(fault) = SoapFault::parse(xml) {
                return Err(fault.into_error(action));
            }
            return Err(RaumfeldError::control(
                action,
                format!("missing {} element in SOAP body", expected),
            ));
        }

        Ok(Self {
            action: action.to_string(),
            fields,
        })
    }
}

impl FromActionResponse for ActionResponse {
    fn from_response(response: &ActionResponse) -> Result<Self> {
        Ok(response.clone())
    }
}

/// `s:Fault` body, with the `UPnPError` detail when the device sent one
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SoapFault {
    pub fault_string: Option<String>,
    pub upnp: Option<UpnpFault>,
}

impl SoapFault {
    pub fn parse(xml: &str) -> Option<Self> {
        let texts = leaf_texts(xml);

        let upnp = texts.get("errorCode").map(|code| UpnpFault {
            code: code.trim().parse().unwrap_or_default(),
            description: texts.get("errorDescription").cloned().unwrap_or_default(),
        });
        let fault_string = texts.get("faultstring").cloned();

        if upnp.is_none() && fault_string.is_none() {
            return None;
        }

        Some(Self { fault_string, upnp })
    }

    pub fn into_error(self, action: &str) -> RaumfeldError {
        match self.upnp {
            Some(fault) => RaumfeldError::fault(action, fault),
            None => RaumfeldError::control(
                action,
                format!("SOAP fault: {}", self.fault_string.unwrap_or_default()),
            ),
        }
    }
}

/// Build the SOAP envelope for `action` with its input arguments
pub fn build_envelope(service_type: &str, action: &str, args: &[(&str, &str)]) -> String {
    let arguments: String = args
        .iter()
        .map(|(name, value)| format!("      <{name}>{}</{name}>\n", escape(*value)))
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"
            s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
  <s:Body>
    <u:{action} xmlns:u="{service_type}">
{arguments}    </u:{action}>
  </s:Body>
</s:Envelope>"#
    )
}

/// Client for one control service of a device
#[derive(Clone, Debug)]
pub struct ControlEndpoint {
    control_url: String,
    service_type: String,
    client: Client,
    timeout: Duration,
}

impl ControlEndpoint {
    /// Endpoint at `base_address` + `path`, calling actions in the `service_type` namespace
    pub fn new(client: Client, base_address: &str, path: &str, service_type: &str, timeout: Duration) -> Self {
        Self {
            control_url: format!("{}{}", base_address.trim_end_matches('/'), path),
            service_type: service_type.to_string(),
            client,
            timeout,
        }
    }

    pub fn control_url(&self) -> &str {
        &self.control_url
    }

    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    /// Invoke `action` and decode its response into `R`
    pub async fn call<R: FromActionResponse>(&self, action: &str, args: &[(&str, &str)]) -> Result<R> {
        let response = self.invoke(action, args).await?;
        R::from_response(&response)
    }

    /// Invoke `action` and return its raw output arguments
    pub async fn invoke(&self, action: &str, args: &[(&str, &str)]) -> Result<ActionResponse> {
        let body = build_envelope(&self.service_type, action, args);
        let soap_action = format!("\"{}#{}\"", self.service_type, action);

        debug!("Sending SOAP action {} to {}", soap_action, self.control_url);
        debug!("Body: {}", body);

        let response = self
            .client
            .post(&self.control_url)
            .timeout(self.timeout)
            .header(CONTENT_TYPE, "text/xml; charset=\"utf-8\"")
            .header("SOAPAction", soap_action)
            .body(body)
            .send()
            .await
            .map_err(|e| self.transport_error(action, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(action, e))?;

        debug!("SOAP response ({}): {}", status, text);

        if !status.is_success() {
            if let Some(fault) = SoapFault::parse(&text) {
                return Err(fault.into_error(action));
            }
            return Err(RaumfeldError::control(
                action,
                format!("HTTP status {}: {}", status, text.trim()),
            ));
        }

        ActionResponse::from_xml(action, &text)
    }

    fn transport_error(&self, action: &str, e: reqwest::Error) -> RaumfeldError {
        if e.is_timeout() {
            RaumfeldError::timeout(format!("{} response from {}", action, self.control_url))
        } else {
            RaumfeldError::control(action, e)
        }
    }
}
