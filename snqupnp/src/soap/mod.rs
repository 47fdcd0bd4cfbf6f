//! # SOAP - UPnP action envelopes (control-point side)
//!
//! Only request construction lives here; the transport and response
//! handling belong to the control crate.

mod builder;

pub use builder::build_soap_request;
