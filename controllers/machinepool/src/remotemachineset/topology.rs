//! Zone and boot image lookups against Compute Engine.

use crate::error::ControllerError;
use gcp_client::{GcpClientTrait, ListComputeImagesOptions, ListComputeZonesOptions};
use tracing::{debug, warn};

/// Filter selecting the zones of `region` that are up
pub fn zone_filter(region: &str) -> String {
    format!("(region eq '.*{}.*') (status eq UP)", region)
}

/// Filter selecting images named `<infra_id>-...`
pub fn image_filter(infra_id: &str) -> String {
    format!("name eq \"{}-.*\"", infra_id)
}

/// List every zone of `region` that is up, following page tokens until the
/// last page. A failed page fails the whole lookup.
pub async fn resolve_zones(gcp: &dyn GcpClientTrait, region: &str) -> Result<Vec<String>, ControllerError> {
    let filter = zone_filter(region);
    let mut zones = Vec::new();
    let mut page_token = String::new();

    loop {
        let page = gcp
            .list_compute_zones(ListComputeZonesOptions {
                filter: filter.clone(),
                page_token,
            })
            .await
            .inspect_err(|e| warn!("Failed to list zones for region {}: {}", region, e))?;

        zones.extend(page.items.into_iter().map(|z| z.name));

        if page.next_page_token.is_empty() {
            break;
        }
        page_token = page.next_page_token;
    }

    debug!("Found {} zones in region {}", zones.len(), region);
    Ok(zones)
}

/// Find the boot image the installer uploaded for `infra_id`. Exactly one
/// match is expected.
pub async fn resolve_image(gcp: &dyn GcpClientTrait, infra_id: &str) -> Result<String, ControllerError> {
    let result = gcp
        .list_compute_images(ListComputeImagesOptions {
            filter: image_filter(infra_id),
        })
        .await
        .inspect_err(|e| warn!("Failed to find a GCP image starting with name: {}: {}", infra_id, e))?;

    let mut items = result.items;
    match items.len() {
        0 => {
            let msg = format!("found 0 results searching for GCP image starting with name: {}", infra_id);
            warn!("{}", msg);
            Err(ControllerError::ImageNotFound(msg))
        }
        1 => {
            let image = items.remove(0);
            debug!("Using image with name {} for machine sets", image.name);
            Ok(image.name)
        }
        _ => {
            let msg = format!(
                "unexpected number of results when looking for GCP image with name starting with {}",
                infra_id
            );
            warn!("{}", msg);
            Err(ControllerError::AmbiguousImage(msg))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcp_client::MockGcpClient;
    use gcp_client::mock::zone;

    #[tokio::test]
    async fn test_zones_accumulate_across_pages() {
        let gcp = MockGcpClient::new("test-project");
        gcp.set_zone_pages(vec![
            vec![zone("us-east1-b"), zone("us-east1-c")],
            vec![zone("us-east1-d")],
        ]);

        let zones = resolve_zones(&gcp, "us-east1").await.unwrap();

        assert_eq!(zones, vec!["us-east1-b", "us-east1-c", "us-east1-d"]);
        let requests = gcp.zone_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].filter, "(region eq '.*us-east1.*') (status eq UP)");
        assert_eq!(requests[0].page_token, "");
        assert_eq!(requests[1].page_token, "page-1");
    }

    #[tokio::test]
    async fn test_zone_page_failure_returns_no_partial_result() {
        let gcp = MockGcpClient::new("test-project");
        gcp.set_zone_pages(vec![vec![zone("us-east1-b")], vec![zone("us-east1-c")]]);
        gcp.fail_zone_page(1);

        let result = resolve_zones(&gcp, "us-east1").await;

        assert!(matches!(result, Err(ControllerError::Gcp(_))));
    }

    #[tokio::test]
    async fn test_zones_empty_region() {
        let gcp = MockGcpClient::new("test-project");

        let zones = resolve_zones(&gcp, "nowhere1").await.unwrap();

        assert!(zones.is_empty());
    }

    #[tokio::test]
    async fn test_single_image_resolves() {
        let gcp = MockGcpClient::new("test-project");
        gcp.set_images(&["abc123-rhcos-image"]);

        let image = resolve_image(&gcp, "abc123").await.unwrap();

        assert_eq!(image, "abc123-rhcos-image");
        assert_eq!(gcp.image_requests()[0].filter, "name eq \"abc123-.*\"");
    }

    #[tokio::test]
    async fn test_missing_and_ambiguous_images_are_distinct_errors() {
        let gcp = MockGcpClient::new("test-project");
        let missing = resolve_image(&gcp, "abc123").await.unwrap_err();

        gcp.set_images(&["abc123-rhcos-a", "abc123-rhcos-b"]);
        let ambiguous = resolve_image(&gcp, "abc123").await.unwrap_err();

        match (&missing, &ambiguous) {
            (ControllerError::ImageNotFound(a), ControllerError::AmbiguousImage(b)) => {
                assert!(a.contains("found 0 results"));
                assert!(b.contains("unexpected number of results"));
                assert_ne!(a, b);
            }
            other => panic!("unexpected errors: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_image_query_failure_propagates() {
        let gcp = MockGcpClient::new("test-project");
        gcp.fail_images("backend unavailable");

        let result = resolve_image(&gcp, "abc123").await;

        assert!(matches!(result, Err(ControllerError::Gcp(_))));
    }
}
