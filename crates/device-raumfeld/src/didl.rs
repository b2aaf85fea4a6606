/// DIDL-Lite metadata carried inside AVTransport responses
///
/// `CurrentURIMetaData` and `TrackMetaData` hold a whole DIDL-Lite document as
/// an escaped string. Fields are looked up by element name, never by position.

use crate::xml::leaf_texts;
use raumfeld_core::DidlMetadata;

/// Preference order for the descriptive field of `GetMediaInfo` metadata
pub const MEDIA_METADATA_TAGS: &[&str] = &["title", "description"];

/// Preference order for the descriptive field of `GetPositionInfo` track metadata
pub const TRACK_METADATA_TAGS: &[&str] = &["title", "album"];

/// First non-empty element among `tags` (local names), if any
pub fn find_field(didl: &str, tags: &[&str]) -> Option<String> {
    if didl.trim().is_empty() {
        return None;
    }

    let texts = leaf_texts(didl);
    tags.iter().find_map(|tag| texts.get(*tag).cloned())
}

/// Descriptive field of the current media (`GetMediaInfo`), empty if there is none
pub fn media_metadata_field(didl: &str) -> String {
    find_field(didl, MEDIA_METADATA_TAGS).unwrap_or_default()
}

/// Descriptive field of the current track (`GetPositionInfo`), empty if there is none
pub fn track_metadata_field(didl: &str) -> String {
    find_field(didl, TRACK_METADATA_TAGS).unwrap_or_default()
}

/// Tolerant parse of a DIDL-Lite document; unknown or broken input yields empty metadata
pub fn parse_didl(didl: &str) -> DidlMetadata {
    if didl.trim().is_empty() {
        return DidlMetadata::default();
    }

    let mut texts = leaf_texts(didl);
    DidlMetadata {
        title: texts.remove("title"),
        artist: texts.remove("artist"),
        album: texts.remove("album"),
        creator: texts.remove("creator"),
        description: texts.remove("description"),
        album_art_uri: texts.remove("albumArtURI"),
        upnp_class: texts.remove("class"),
    }
}
