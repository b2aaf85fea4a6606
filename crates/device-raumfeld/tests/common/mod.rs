//! In-process stand-ins for Raumfeld hardware: an HTTP renderer that answers
//! description and SOAP requests, a UDP responder that answers M-SEARCH, and a
//! TCP listener that never replies.

#![allow(dead_code)]

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::{TcpListener, UdpSocket};
use tokio::task::JoinHandle;

pub const TRACK_DIDL: &str = r#"<DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/"><item id="0/Tracks/7" parentID="0/Tracks" restricted="1"><upnp:class>object.item.audioItem.musicTrack</upnp:class><dc:title>Naima</dc:title><upnp:album>Giant Steps</upnp:album><upnp:artist>John Coltrane</upnp:artist></item></DIDL-Lite>"#;

#[derive(Debug)]
pub struct RendererState {
    pub friendly_name: String,
    pub model_description: String,
    pub volume: u16,
    pub mute: String,
    pub transport_state: String,
    /// Stored exactly as received, still XML-escaped
    pub uri: String,
    pub uri_metadata: String,
    pub actions: Vec<String>,
}

/// Fake renderer serving `/description.xml` and both control endpoints
pub struct FakeRenderer {
    pub addr: SocketAddr,
    pub state: Arc<Mutex<RendererState>>,
    handle: JoinHandle<()>,
}

impl FakeRenderer {
    pub async fn spawn(friendly_name: &str, model_description: &str) -> Self {
        let state = Arc::new(Mutex::new(RendererState {
            friendly_name: friendly_name.to_string(),
            model_description: model_description.to_string(),
            volume: 30,
            mute: "0".to_string(),
            transport_state: "STOPPED".to_string(),
            uri: String::new(),
            uri_metadata: String::new(),
            actions: Vec::new(),
        }));

        let app = Router::new()
            .route("/description.xml", get(description))
            .route("/broken.xml", get(broken_description))
            .route("/RenderingService/Control", post(control))
            .route("/TransportService/Control", post(control))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state, handle }
    }

    pub fn location(&self) -> String {
        format!("http://{}/description.xml", self.addr)
    }

    /// Description document missing `modelDescription`
    pub fn broken_location(&self) -> String {
        format!("http://{}/broken.xml", self.addr)
    }

    pub fn base_address(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn actions(&self) -> Vec<String> {
        self.state.lock().unwrap().actions.clone()
    }

    pub fn set_mute_wire_value(&self, value: &str) {
        self.state.lock().unwrap().mute = value.to_string();
    }
}

impl Drop for FakeRenderer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn description(State(state): State<Arc<Mutex<RendererState>>>) -> String {
    let state = state.lock().unwrap();
    format!(
        r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <specVersion><major>1</major><minor>0</minor></specVersion>
  <device>
    <deviceType>urn:schemas-upnp-org:device:MediaRenderer:1</deviceType>
    <friendlyName>{}</friendlyName>
    <manufacturer>Raumfeld GmbH</manufacturer>
    <modelDescription>{}</modelDescription>
    <modelName>Raumfeld Test Renderer</modelName>
  </device>
</root>"#,
        state.friendly_name, state.model_description
    )
}

async fn broken_description() -> &'static str {
    r#"<?xml version="1.0"?><root><device><friendlyName>Broken</friendlyName><modelName>X</modelName></device></root>"#
}

fn arg(body: &str, name: &str) -> Option<String> {
    let start_tag = format!("<{}>", name);
    let end_tag = format!("</{}>", name);
    let start = body.find(&start_tag)? + start_tag.len();
    let end = body[start..].find(&end_tag)?;
    Some(body[start..start + end].to_string())
}

fn ok(action: &str, fields: &str) -> (StatusCode, String) {
    (
        StatusCode::OK,
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
  <s:Body>
    <u:{action}Response xmlns:u="urn:schemas-upnp-org:service:AVTransport:1">{fields}</u:{action}Response>
  </s:Body>
</s:Envelope>"#
        ),
    )
}

fn fault(code: u32, description: &str) -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <s:Fault>
      <faultcode>s:Client</faultcode>
      <faultstring>UPnPError</faultstring>
      <detail>
        <UPnPError xmlns="urn:schemas-upnp-org:control-1-0">
          <errorCode>{code}</errorCode>
          <errorDescription>{description}</errorDescription>
        </UPnPError>
      </detail>
    </s:Fault>
  </s:Body>
</s:Envelope>"#
        ),
    )
}

async fn control(
    State(state): State<Arc<Mutex<RendererState>>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let soap_action = headers
        .get("SOAPAction")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .trim_matches('"')
        .to_string();
    let action = soap_action.rsplit('#').next().unwrap_or_default().to_string();

    let mut state = state.lock().unwrap();
    state.actions.push(action.clone());

    if arg(&body, "InstanceID").as_deref() != Some("1") {
        return fault(718, "Invalid InstanceID");
    }

    match action.as_str() {
        "GetVolume" => ok(&action, &format!("<CurrentVolume>{}</CurrentVolume>", state.volume)),
        "SetVolume" => match arg(&body, "DesiredVolume").and_then(|v| v.parse().ok()) {
            Some(volume) => {
                state.volume = volume;
                ok(&action, "")
            }
            None => fault(402, "Invalid Args"),
        },
        "GetMute" => ok(&action, &format!("<CurrentMute>{}</CurrentMute>", state.mute)),
        "SetMute" => {
            state.mute = arg(&body, "DesiredMute").unwrap_or_default();
            ok(&action, "")
        }
        "SetAVTransportURI" => {
            state.uri = arg(&body, "CurrentURI").unwrap_or_default();
            state.uri_metadata = arg(&body, "CurrentURIMetaData").unwrap_or_default();
            state.transport_state = "PLAYING".to_string();
            ok(&action, "")
        }
        "GetMediaInfo" => ok(
            &action,
            &format!(
                "<NrTracks>1</NrTracks><MediaDuration>0:00:00</MediaDuration><CurrentURI>{}</CurrentURI><CurrentURIMetaData>{}</CurrentURIMetaData><NextURI></NextURI><PlayMedium>NETWORK</PlayMedium>",
                state.uri, state.uri_metadata
            ),
        ),
        "GetPositionInfo" => ok(
            &action,
            &format!(
                "<Track>7</Track><TrackDuration>0:04:21</TrackDuration><TrackMetaData>{}</TrackMetaData><TrackURI>http://10.0.0.2:47366/7.flac</TrackURI><RelTime>0:01:05</RelTime><AbsTime>0:25:40</AbsTime><RelCount>2147483647</RelCount><AbsCount>2147483647</AbsCount>",
                TRACK_DIDL.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
            ),
        ),
        "GetTransportInfo" => ok(
            &action,
            &format!(
                "<CurrentTransportState>{}</CurrentTransportState><CurrentTransportStatus>OK</CurrentTransportStatus><CurrentSpeed>1</CurrentSpeed>",
                state.transport_state
            ),
        ),
        "Play" => {
            state.transport_state = "PLAYING".to_string();
            ok(&action, "")
        }
        "Pause" => {
            state.transport_state = "PAUSED_PLAYBACK".to_string();
            ok(&action, "")
        }
        "Stop" => {
            state.transport_state = "STOPPED".to_string();
            ok(&action, "")
        }
        "Next" | "Previous" => ok(&action, ""),
        "Seek" => match (arg(&body, "Unit").as_deref(), arg(&body, "Target")) {
            (Some("ABS_TIME" | "REL_TIME"), Some(_)) => ok(&action, ""),
            (Some("TRACK_NR"), Some(target)) if target == "1" => ok(&action, ""),
            (Some("TRACK_NR"), Some(_)) => fault(711, "Illegal seek target"),
            _ => fault(710, "Seek mode not supported"),
        },
        _ => fault(401, "Invalid Action"),
    }
}

/// UDP responder answering every M-SEARCH with each location, twice
pub struct SsdpResponder {
    pub addr: SocketAddr,
    pub requests: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl SsdpResponder {
    pub async fn spawn(locations: Vec<String>) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let requests = Arc::new(AtomicUsize::new(0));

        let counter = requests.clone();
        let handle = tokio::spawn(async move {
            let mut buf = [0u8; 2048];
            loop {
                let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                    break;
                };
                let request = String::from_utf8_lossy(&buf[..len]);
                if !request.starts_with("M-SEARCH") {
                    continue;
                }
                counter.fetch_add(1, Ordering::SeqCst);

                for location in locations.iter().chain(locations.iter()) {
                    let response = format!(
                        "HTTP/1.1 200 OK\r\n\
                         CACHE-CONTROL: max-age=1800\r\n\
                         EXT:\r\n\
                         Location: {}\r\n\
                         SERVER: Linux/2.6 UPnP/1.0 Raumfeld/1.0\r\n\
                         ST: urn:schemas-upnp-org:device:MediaRenderer:1\r\n\
                         USN: uuid:test::urn:schemas-upnp-org:device:MediaRenderer:1\r\n\
                         \r\n",
                        location
                    );
                    let _ = socket.send_to(response.as_bytes(), peer).await;
                }
            }
        });

        Self {
            addr,
            requests,
            handle,
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Drop for SsdpResponder {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// TCP listener that accepts connections and never answers
pub struct SilentServer {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl SilentServer {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        Self { addr, handle }
    }

    pub fn base_address(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for SilentServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
