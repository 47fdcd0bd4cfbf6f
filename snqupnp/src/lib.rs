//! Client-side UPnP plumbing for the snq control point: SSDP discovery
//! and SOAP action envelopes. No device/server role, no eventing.

pub mod soap;
pub mod ssdp;
