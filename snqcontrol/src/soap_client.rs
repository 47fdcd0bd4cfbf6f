//! SOAP-over-HTTP client for UPnP control endpoints.
//!
//! The request is written by hand over a `TcpStream` instead of going
//! through an HTTP client: the SOAPACTION header must reach the wire
//! with this exact capitalization, and the `http` header types
//! underneath the usual clients lowercase every header name. Some
//! renderer firmwares reject the action when the name is normalized.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use snqupnp::soap::build_soap_request;
use tracing::debug;
use url::Url;

use crate::errors::ControlError;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a SOAP call: HTTP status plus the raw body, returned even
/// for non-2xx statuses so SOAP Faults stay inspectable.
#[derive(Debug)]
pub struct SoapCallResult {
    pub status: u16,
    pub body: String,
}

/// Invoke a UPnP SOAP action on a control URL.
///
/// - `control_url`: full HTTP URL of the service control endpoint
/// - `service_type`: service URN, e.g. "urn:schemas-upnp-org:service:AVTransport:1"
/// - `action`: action name, e.g. "AddURIToQueue"
/// - `args`: (name, value) pairs, e.g. &[("InstanceID", "0")]
pub fn invoke_upnp_action(
    control_url: &Url,
    service_type: &str,
    action: &str,
    args: &[(&str, &str)],
) -> Result<SoapCallResult, ControlError> {
    let body = build_soap_request(service_type, action, args)?;

    let host = control_url.host_str().ok_or_else(|| {
        ControlError::InvalidControlUrl(control_url.to_string(), "missing host".to_string())
    })?;
    let port = control_url.port_or_known_default().unwrap_or(80);

    let head = build_request_head(
        control_url.path(),
        host,
        port,
        service_type,
        action,
        body.len(),
    );

    debug!("POST {} ({}#{})", control_url, service_type, action);

    let peer = format!("{}:{}", host, port);
    let io_err = |e| ControlError::Io(peer.clone(), e);

    let addr = (host, port)
        .to_socket_addrs()
        .map_err(io_err)?
        .next()
        .ok_or_else(|| {
            ControlError::InvalidControlUrl(
                control_url.to_string(),
                "host resolves to no address".to_string(),
            )
        })?;

    let mut stream = TcpStream::connect_timeout(&addr, HTTP_TIMEOUT).map_err(io_err)?;
    stream.set_read_timeout(Some(HTTP_TIMEOUT)).map_err(io_err)?;
    stream.set_write_timeout(Some(HTTP_TIMEOUT)).map_err(io_err)?;

    stream.write_all(head.as_bytes()).map_err(io_err)?;
    stream.write_all(body.as_bytes()).map_err(io_err)?;

    // Connection: close was requested, so EOF delimits the response.
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).map_err(io_err)?;

    parse_http_response(&raw, &peer)
}

fn build_request_head(
    path: &str,
    host: &str,
    port: u16,
    service_type: &str,
    action: &str,
    content_length: usize,
) -> String {
    format!(
        "POST {path} HTTP/1.1\r\n\
         HOST: {host}:{port}\r\n\
         CONTENT-TYPE: text/xml; charset=\"utf-8\"\r\n\
         SOAPACTION: \"{service_type}#{action}\"\r\n\
         CONTENT-LENGTH: {content_length}\r\n\
         CONNECTION: close\r\n\
         \r\n"
    )
}

fn parse_http_response(raw: &[u8], peer: &str) -> Result<SoapCallResult, ControlError> {
    let text = String::from_utf8_lossy(raw);
    let (head, body) = match text.split_once("\r\n\r\n") {
        Some((head, body)) => (head, body),
        None => (text.as_ref(), ""),
    };

    let status_line = head.lines().next().unwrap_or("");
    let status = parse_status_line(status_line).ok_or_else(|| {
        ControlError::MalformedResponse(
            peer.to_string(),
            format!("bad status line: {:?}", status_line),
        )
    })?;

    Ok(SoapCallResult {
        status,
        body: body.to_string(),
    })
}

fn parse_status_line(line: &str) -> Option<u16> {
    let mut parts = line.split_whitespace();
    let version = parts.next()?;
    if !version.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}
