//! Fetch and parse UPnP device descriptions (description.xml).

use std::io::{BufRead, BufReader};
use std::time::Duration;

use quick_xml::{Error as XmlError, Reader, events::Event};
use thiserror::Error;
use tracing::debug;
use ureq::Agent;
use url::Url;

#[derive(Debug, Error)]
pub enum DescriptionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("Failed to read HTTP body: {0}")]
    HttpIo(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Metadata extracted from the `<device>` section of a description.
///
/// Sonos zones carry the room name in `roomName`; `friendlyName` is
/// usually "<ip> - Sonos <model>" and only used for display.
#[derive(Debug, Default, Clone)]
pub struct DeviceDescription {
    pub udn: Option<String>,
    pub device_type: Option<String>,
    pub friendly_name: Option<String>,
    pub room_name: Option<String>,
    pub model_name: Option<String>,
}

/// Where device descriptions come from. The resolver only depends on
/// this trait so tests can substitute canned descriptions.
pub trait DescriptionSource {
    fn fetch(&self, location: &Url) -> Result<DeviceDescription, DescriptionError>;
}

/// HTTP-based description source (GET on the SSDP LOCATION URL).
pub struct HttpDescriptionSource {
    timeout: Duration,
}

impl HttpDescriptionSource {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl DescriptionSource for HttpDescriptionSource {
    fn fetch(&self, location: &Url) -> Result<DeviceDescription, DescriptionError> {
        debug!("Fetching device description at {}", location);

        let config = Agent::config_builder()
            .timeout_global(Some(self.timeout))
            .build();

        let agent: Agent = config.into();

        let response = agent.get(location.as_str()).call()?;

        let (_parts, body) = response.into_parts();
        let body_reader = body.into_reader();

        parse_description(BufReader::new(body_reader))
    }
}

/// Streaming parse of a description document.
///
/// Only the device-section tags we care about are extracted; everything
/// else (service lists, icon lists, vendor extensions) is skipped.
pub fn parse_description<R: BufRead>(input: R) -> Result<DeviceDescription, DescriptionError> {
    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut parsed = DeviceDescription::default();

    let mut in_device = false;
    let mut current_tag: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match name.as_str() {
                    "device" => {
                        in_device = true;
                        current_tag = None;
                    }
                    _ => {
                        if in_device {
                            current_tag = Some(name);
                        }
                    }
                }
            }
            Event::End(e) => {
                if e.name().as_ref() == b"device" {
                    in_device = false;
                }
                current_tag = None;
            }
            Event::Text(e) => {
                if in_device {
                    if let Some(tag) = &current_tag {
                        let text = e.decode().map_err(XmlError::Encoding)?.into_owned();

                        match tag.as_str() {
                            "UDN" => parsed.udn = Some(text),
                            "deviceType" => parsed.device_type = Some(text),
                            "friendlyName" => parsed.friendly_name = Some(text),
                            "roomName" => parsed.room_name = Some(text),
                            "modelName" => parsed.model_name = Some(text),
                            _ => {}
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }

        buf.clear();
    }

    Ok(parsed)
}
