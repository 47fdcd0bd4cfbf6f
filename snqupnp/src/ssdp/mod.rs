//! # SSDP - Simple Service Discovery Protocol (control-point side)
//!
//! M-SEARCH multicast queries and collection of the unicast responses
//! devices send back.
//!
//! ## Architecture
//!
//! - [`SsdpClient`] : socket setup and the search/collect loop
//! - [`SearchResponse`] : one parsed search response, full header map kept
//!
//! ## Constants
//!
//! - **Multicast Address**: 239.255.255.250:1900
//! - **Collect window**: wall-clock deadline supplied by the caller

mod client;

pub use client::{SearchResponse, SsdpClient, matches_search_target};

/// SSDP multicast address
pub const SSDP_MULTICAST_ADDR: &str = "239.255.255.250";

/// SSDP port
pub const SSDP_PORT: u16 = 1900;
