/*!
The snq SSDP client is a *control point*. It must **not** bind to UDP
port 1900.

* An SSDP *device* listens on 0.0.0.0:1900 for M-SEARCH discovery.
* An SSDP *client* only needs to send M-SEARCH and receive the unicast
  HTTP/200 replies, so it binds an ephemeral port.
* Binding 1900 alongside a device stack (even with SO_REUSEPORT) makes
  the kernel load-balance incoming datagrams between the sockets and
  replies get lost randomly.

The client still joins the multicast group on every interface so that
replies routed through the group are not dropped.
*/

use super::{SSDP_MULTICAST_ADDR, SSDP_PORT};
use socket2::{Domain, Protocol, Socket, Type};
use std::collections::HashMap;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// One SSDP search response, in arrival order.
///
/// The full header map is kept (keys case-insensitive, values
/// multi-valued) because the caller needs LOCATION afterwards.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    headers: HashMap<String, Vec<String>>,
    from: SocketAddr,
}

impl SearchResponse {
    /// Parse a datagram as an HTTP-style search response.
    ///
    /// NOTIFY announcements and M-SEARCH queries from other control
    /// points are recognized and ignored; anything else that is not a
    /// status line followed by headers is logged and dropped.
    pub fn parse(data: &str, from: SocketAddr) -> Option<Self> {
        let mut lines = data.lines();
        let status_line = lines.next()?.trim();
        let upper = status_line.to_ascii_uppercase();

        if upper.starts_with("NOTIFY ") || upper.starts_with("M-SEARCH ") {
            trace!("Ignoring SSDP announcement from {}: {}", from, status_line);
            return None;
        }

        if !(upper.starts_with("HTTP/") && upper.contains(" 200 ")) {
            warn!(
                "Unparseable SSDP datagram from {}: {:?}",
                from, status_line
            );
            return None;
        }

        Some(Self {
            headers: parse_headers(lines),
            from,
        })
    }

    /// First value of a header, looked up case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_uppercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values of a header, in the order they appeared.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.headers
            .get(&name.to_ascii_uppercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The LOCATION header, pointing at the device description.
    pub fn location(&self) -> Option<&str> {
        self.get("LOCATION")
    }

    pub fn usn(&self) -> Option<&str> {
        self.get("USN")
    }

    pub fn from(&self) -> SocketAddr {
        self.from
    }
}

/// True if any ST value of the response equals the search target.
///
/// The comparison is exact (case-sensitive) and stops at the first hit,
/// so duplicated ST headers within one response still yield a single
/// candidate. Responses from several interfaces of one device are *not*
/// merged here.
pub fn matches_search_target(response: &SearchResponse, st: &str) -> bool {
    response.get_all("ST").iter().any(|value| value == st)
}

/// SSDP client sending M-SEARCH queries and collecting the replies.
pub struct SsdpClient {
    socket: UdpSocket,
}

impl SsdpClient {
    pub fn new() -> io::Result<Self> {
        let socket2 = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket2.set_reuse_address(true)?;

        let bind_addr: SocketAddr = "0.0.0.0:0".parse().unwrap();
        socket2.bind(&bind_addr.into())?;

        let socket: UdpSocket = socket2.into();
        socket.set_multicast_loop_v4(true)?;

        for iface in get_if_addrs::get_if_addrs()? {
            if let std::net::IpAddr::V4(ipv4) = iface.ip() {
                if !ipv4.is_loopback() {
                    match socket.join_multicast_v4(&SSDP_MULTICAST_ADDR.parse().unwrap(), &ipv4) {
                        Ok(()) => {
                            debug!("SSDP: joined {} on {}", SSDP_MULTICAST_ADDR, ipv4);
                        }
                        Err(e) => {
                            warn!(
                                "SSDP: failed to join {} on {}: {}",
                                SSDP_MULTICAST_ADDR, ipv4, e
                            );
                        }
                    }
                }
            }
        }

        info!("✅ SSDP client ready on ephemeral port");

        Ok(Self { socket })
    }

    /// Send one M-SEARCH for `st` and collect matching responses until
    /// the deadline.
    ///
    /// Socket setup and send failures are fatal. Once the query is out,
    /// the receive loop is best-effort: the deadline tripping is the
    /// normal termination, any other receive error is logged and ends
    /// the collection early with whatever arrived so far.
    pub fn search(&self, st: &str, timeout: Duration) -> io::Result<Vec<SearchResponse>> {
        self.send_msearch(st)?;

        let deadline = Instant::now() + timeout;
        let mut found = Vec::new();
        let mut buf = [0u8; 65536];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            self.socket.set_read_timeout(Some(remaining))?;

            match self.socket.recv_from(&mut buf) {
                Ok((n, from)) => {
                    let data = String::from_utf8_lossy(&buf[..n]);
                    match SearchResponse::parse(&data, from) {
                        Some(response) if matches_search_target(&response, st) => {
                            debug!(
                                "📥 SSDP hit from {}: usn={}",
                                from,
                                response.usn().unwrap_or("?")
                            );
                            found.push(response);
                        }
                        Some(response) => {
                            trace!(
                                "SSDP response from {} with non-matching ST {:?}",
                                from,
                                response.get_all("ST")
                            );
                        }
                        None => {}
                    }
                }
                Err(e)
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::TimedOut =>
                {
                    break;
                }
                Err(e) => {
                    warn!("SSDP receive error: {}", e);
                    break;
                }
            }
        }

        Ok(found)
    }

    fn send_msearch(&self, st: &str) -> io::Result<()> {
        let msg = build_msearch(st);

        let addr: SocketAddr = format!("{}:{}", SSDP_MULTICAST_ADDR, SSDP_PORT)
            .parse()
            .unwrap();

        match self.socket.send_to(msg.as_bytes(), addr) {
            Ok(_) => {
                info!("📤 M-SEARCH sent (ST={})", st);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to send M-SEARCH: {}", e);
                Err(e)
            }
        }
    }
}

/// The fixed five-line search query. MX stays at 1: devices answer within
/// a second, the local collect window is what bounds the wait.
fn build_msearch(st: &str) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {}:{}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         ST: {}\r\n\
         MX: 1\r\n\
         \r\n",
        SSDP_MULTICAST_ADDR, SSDP_PORT, st
    )
}

fn parse_headers<'a, I>(lines: I) -> HashMap<String, Vec<String>>
where
    I: Iterator<Item = &'a str>,
{
    let mut headers: HashMap<String, Vec<String>> = HashMap::new();
    for line in lines {
        let line = line.trim();

        // Empty line marks end of headers
        if line.is_empty() {
            break;
        }

        // Split on first ':' only (values may contain ':')
        if let Some(colon_pos) = line.find(':') {
            let (name, value_with_colon) = line.split_at(colon_pos);
            let value = &value_with_colon[1..];

            let name = name.trim().to_ascii_uppercase();
            let value = value.trim().to_string();

            if !name.is_empty() && !value.is_empty() {
                headers.entry(name).or_default().push(value);
            } else {
                trace!("Skipping malformed header: '{}'", line);
            }
        } else {
            trace!("Skipping line without colon: '{}'", line);
        }
    }
    headers
}
