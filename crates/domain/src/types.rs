//! Common data types used throughout the application

use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Read-only projection of the provider's currently-playing item.
///
/// Recomputed on every poll and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub name: String,
    /// Artist names joined with `", "`.
    pub artist: String,
    pub album: String,
    /// First album image, when the provider sent any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_art: Option<String>,
    pub is_playing: bool,
}

/// Client-side token lifecycle states.
///
/// ```text
/// Unauthenticated ──exchange──► Valid ──expiry──► Expired ──refresh ok──► Valid
///                                 │                   │
///                                 └──401──► Invalid ◄─┘ refresh failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// No token set in durable storage and no code pending.
    #[default]
    Unauthenticated,
    /// A token set is held and was valid at the last check.
    Valid,
    /// The held access token passed its expiry and a refresh is underway.
    Expired,
    /// The token set was torn down; the user must log in again.
    Invalid,
}

impl_domain_status_conversions!(LifecycleState {
    Unauthenticated => "unauthenticated",
    Valid => "valid",
    Expired => "expired",
    Invalid => "invalid",
});

impl LifecycleState {
    /// Whether protected calls may be attempted in this state.
    #[must_use]
    pub fn is_usable(self) -> bool {
        matches!(self, Self::Valid | Self::Expired)
    }
}
