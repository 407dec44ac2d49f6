use std::future::Future;

use anyhow::Result;
use tracing::{debug, warn};

use crate::models::CatalogItem;

/// Outcome of checking whether a URL serves something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    /// 2xx response.
    Found,
    /// 404 response.
    NotFound,
    /// Any other status code.
    Other(u16),
}

/// Checks image URLs. Implemented over HTTP by [`super::CatalogClient`].
pub trait ImageProbe {
    /// Request `url` and classify the response.
    fn probe(&self, url: &str) -> impl Future<Output = Result<ProbeStatus>> + Send;
}

/// Find a working image URL for `item`.
///
/// The item's own image path is tried first. When that is missing or empty, the
/// conventional `assets/images/{id}{ext}` locations are probed in the order
/// of `extensions` and the first one found wins. Returns `None` when nothing
/// could be found or the network failed.
pub async fn resolve_image<P>(
    probe: &P,
    base_url: &str,
    extensions: &[String],
    item: &CatalogItem,
) -> Option<String>
where
    P: ImageProbe + Sync,
{
    let base_url = base_url.trim_end_matches('/');
    let image_path = item.image.trim().trim_start_matches('/');
    if image_path.is_empty() {
        debug!(id = item.id, "Item has no image path, trying fallbacks");
    } else {
        let primary = format!("{base_url}/{image_path}");
        match probe.probe(&primary).await {
            Ok(ProbeStatus::Found) => return Some(primary),
            Ok(ProbeStatus::NotFound) => {
                debug!(id = item.id, url = %primary, "Image not found, trying fallbacks");
            }
            Ok(ProbeStatus::Other(status)) => {
                warn!(id = item.id, url = %primary, status, "Unexpected image response");
                return Some(primary);
            }
            Err(err) => {
                warn!(id = item.id, url = %primary, ?err, "Something went wrong with fetching the image");
                return None;
            }
        }
    }

    for ext in extensions {
        let candidate = format!("{}/assets/images/{}{}", base_url, item.id, ext);
        match probe.probe(&candidate).await {
            Ok(ProbeStatus::Found) => {
                debug!(id = item.id, url = %candidate, "Using fallback image");
                return Some(candidate);
            }
            Ok(_) => continue,
            Err(err) => {
                warn!(id = item.id, url = %candidate, ?err, "Image probe failed");
            }
        }
    }

    warn!(id = item.id, title = %item.title, "No image available");
    None
}
