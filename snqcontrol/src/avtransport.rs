//! AVTransport queue commands against a resolved renderer.

use tracing::debug;
use url::Url;

use crate::errors::ControlError;
use crate::soap_client::invoke_upnp_action;

pub const AVTRANSPORT_SERVICE: &str = "urn:schemas-upnp-org:service:AVTransport:1";

/// Fixed control path Sonos renderers expose for AVTransport.
pub const AVTRANSPORT_CONTROL_PATH: &str = "/MediaRenderer/AVTransport/Control";

/// Renderers expose a single AVTransport instance.
const INSTANCE_ID: &str = "0";

/// AVTransport client bound to a device base URL (the SSDP LOCATION).
#[derive(Debug, Clone)]
pub struct AvTransportClient {
    base: Url,
}

impl AvTransportClient {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    /// Base URL with the path overridden to the control endpoint.
    fn control_url(&self) -> Url {
        let mut url = self.base.clone();
        url.set_path(AVTRANSPORT_CONTROL_PATH);
        url.set_query(None);
        url
    }

    fn invoke(&self, action: &str, args: &[(&str, &str)]) -> Result<(), ControlError> {
        let url = self.control_url();
        let result = invoke_upnp_action(&url, AVTRANSPORT_SERVICE, action, args)?;

        if result.status != 200 {
            return Err(ControlError::CommandFailed {
                path: url.path().to_string(),
                status: result.status,
            });
        }

        debug!("{} OK on {}", action, url);
        Ok(())
    }

    pub fn remove_all_tracks_from_queue(&self) -> Result<(), ControlError> {
        self.invoke("RemoveAllTracksFromQueue", &[("InstanceID", INSTANCE_ID)])
    }

    /// Enqueue at the end of the queue (never "as next").
    pub fn add_uri_to_queue(&self, uri: &str) -> Result<(), ControlError> {
        self.invoke("AddURIToQueue", &[
            ("InstanceID", INSTANCE_ID),
            ("EnqueuedURI", uri),
            ("EnqueuedURIMetaData", ""),
            ("DesiredFirstTrackNumberEnqueued", "0"),
            ("EnqueueAsNext", "0"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn control_url_overrides_path_of_the_base() {
        let base =
            Url::parse("http://192.168.1.42:1400/xml/device_description.xml?foo=1").unwrap();
        let client = AvTransportClient::new(base);

        assert_eq!(
            client.control_url().as_str(),
            "http://192.168.1.42:1400/MediaRenderer/AVTransport/Control"
        );
    }

    #[test]
    fn non_200_becomes_command_failed_with_path_and_status() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut data = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                data.extend_from_slice(&buf[..n]);
                if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&data[..pos]).to_string();
                    let content_length = head
                        .lines()
                        .find_map(|line| {
                            line.to_ascii_lowercase()
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if data.len() >= pos + 4 + content_length {
                        break;
                    }
                }
            }
            stream
                .write_all(b"HTTP/1.1 500 Internal Server Error\r\nCONNECTION: close\r\n\r\n")
                .unwrap();
        });

        let base = Url::parse(&format!("http://127.0.0.1:{port}/desc.xml")).unwrap();
        let client = AvTransportClient::new(base);

        let err = client.remove_all_tracks_from_queue().unwrap_err();
        server.join().unwrap();

        match err {
            ControlError::CommandFailed { path, status } => {
                assert_eq!(path, AVTRANSPORT_CONTROL_PATH);
                assert_eq!(status, 500);
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }
}
