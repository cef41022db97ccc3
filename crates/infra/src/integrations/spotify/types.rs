//! Spotify currently-playing payload
//!
//! Only the fields the `Track` projection needs are modelled; everything else
//! in the provider's response is ignored.

use nowplaying_domain::Track;
use serde::Deserialize;

/// Body of `GET /v1/me/player/currently-playing`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentlyPlayingResponse {
    #[serde(default)]
    pub is_playing: bool,
    /// Absent or `null` during ads, podcasts in some markets, or between
    /// tracks.
    #[serde(default)]
    pub item: Option<PlayingItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayingItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub album: Option<Album>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Artist {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Album {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub url: String,
}

impl CurrentlyPlayingResponse {
    /// Project onto [`Track`]; `None` when there is no item.
    pub fn into_track(self) -> Option<Track> {
        let is_playing = self.is_playing;
        let PlayingItem { name, artists, album } = self.item?;

        let artist = artists.into_iter().map(|a| a.name).collect::<Vec<_>>().join(", ");
        let (album, album_art) = match album {
            Some(Album { name, images }) => (name, images.into_iter().next().map(|i| i.url)),
            None => (String::new(), None),
        };

        Some(Track { name, artist, album, album_art, is_playing })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(value: serde_json::Value) -> Option<Track> {
        serde_json::from_value::<CurrentlyPlayingResponse>(value).unwrap().into_track()
    }

    #[test]
    fn maps_full_payload() {
        let track = parse(json!({
            "is_playing": true,
            "progress_ms": 1234,
            "item": {
                "name": "Song",
                "artists": [{"name": "A"}, {"name": "B"}],
                "album": {
                    "name": "Album",
                    "images": [
                        {"url": "https://i.scdn.co/image/large", "height": 640, "width": 640},
                        {"url": "https://i.scdn.co/image/small", "height": 64, "width": 64}
                    ]
                }
            }
        }))
        .unwrap();

        assert_eq!(track.name, "Song");
        assert_eq!(track.artist, "A, B");
        assert_eq!(track.album, "Album");
        assert_eq!(track.album_art.as_deref(), Some("https://i.scdn.co/image/large"));
        assert!(track.is_playing);
    }

    #[test]
    fn missing_item_is_none() {
        assert!(parse(json!({"is_playing": false})).is_none());
        assert!(parse(json!({"is_playing": true, "item": null})).is_none());
    }

    #[test]
    fn empty_images_and_artists_degrade() {
        let track = parse(json!({
            "is_playing": false,
            "item": {"name": "Song", "artists": [], "album": {"name": "Album", "images": []}}
        }))
        .unwrap();

        assert_eq!(track.artist, "");
        assert!(track.album_art.is_none());
        assert!(!track.is_playing);
    }
}
