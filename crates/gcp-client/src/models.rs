//! Compute Engine API models
//!
//! Only the fields read by the controller are modelled; everything else in
//! the API responses is ignored on deserialization.

use serde::{Deserialize, Serialize};

/// Options for listing zones
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListComputeZonesOptions {
    /// Compute API filter expression
    pub filter: String,
    /// Opaque token from a previous page; empty for the first page
    pub page_token: String,
}

/// Options for listing images
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListComputeImagesOptions {
    /// Compute API filter expression
    pub filter: String,
}

/// A compute zone
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub name: String,
    /// URL of the region the zone belongs to
    #[serde(default)]
    pub region: String,
    /// "UP" or "DOWN"
    #[serde(default)]
    pub status: String,
}

/// One page of zones
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ZoneList {
    #[serde(default)]
    pub items: Vec<Zone>,
    /// Empty (or absent) on the last page
    #[serde(default)]
    pub next_page_token: String,
}

/// A boot image
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub name: String,
    #[serde(default)]
    pub self_link: String,
    #[serde(default)]
    pub status: String,
}

/// Result of an image listing
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageList {
    #[serde(default)]
    pub items: Vec<Image>,
    #[serde(default)]
    pub next_page_token: String,
}
