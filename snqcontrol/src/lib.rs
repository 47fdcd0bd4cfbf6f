//! Control-point layer for Sonos renderers: device description
//! retrieval, room-name resolution and AVTransport queue commands.

pub mod avtransport;
pub mod description;
pub mod errors;
pub mod loader;
pub mod resolver;
pub mod soap_client;

pub use avtransport::{AVTRANSPORT_CONTROL_PATH, AVTRANSPORT_SERVICE, AvTransportClient};
pub use description::{
    DescriptionError, DescriptionSource, DeviceDescription, HttpDescriptionSource,
};
pub use errors::ControlError;
pub use loader::{LoadReport, QueueControl, load_queue};
pub use resolver::resolve_device;
pub use soap_client::{SoapCallResult, invoke_upnp_action};
