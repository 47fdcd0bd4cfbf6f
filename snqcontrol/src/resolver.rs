//! Resolve a room name to a device base URL.

use snqupnp::ssdp::SearchResponse;
use tracing::{debug, warn};
use url::Url;

use crate::description::DescriptionSource;
use crate::errors::ControlError;

/// Scan the discovered candidates and return the base URL of the one
/// whose room name equals `room`.
///
/// Candidates are scanned in arrival order; per-candidate failures
/// (missing or unparseable LOCATION, description fetch or parse errors)
/// are logged and skipped. The scan never stops early, so when several
/// candidates report the same room name the *last* one wins.
pub fn resolve_device<S: DescriptionSource>(
    source: &S,
    candidates: &[SearchResponse],
    room: &str,
) -> Result<Url, ControlError> {
    if candidates.is_empty() {
        return Err(ControlError::NoDevicesFound);
    }

    let mut resolved: Option<Url> = None;

    for candidate in candidates {
        let Some(location) = candidate.location() else {
            warn!(
                "Candidate from {} carries no LOCATION header, skipping",
                candidate.from()
            );
            continue;
        };

        let url = match Url::parse(location) {
            Ok(url) => url,
            Err(err) => {
                warn!("Parsing {}: {}", location, err);
                continue;
            }
        };

        let description = match source.fetch(&url) {
            Ok(description) => description,
            Err(err) => {
                warn!("Fetching {}: {}", url, err);
                continue;
            }
        };

        if description.room_name.as_deref() == Some(room) {
            debug!("Room '{}' matched at {}", room, url);
            // No early break: a later match replaces an earlier one.
            resolved = Some(url);
        }
    }

    resolved.ok_or_else(|| ControlError::DeviceNotFound(room.to_string()))
}
