use thiserror::Error;
use url::Url;

const EMBED_PREFIX: &str = "https://www.youtube.com/embed/";
const VIDEO_ID_LEN: usize = 11;

/// Hosts accepted as YouTube links.
const YOUTUBE_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "youtu.be",
    "www.youtu.be",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmbedError {
    #[error("Invalid YouTube URL")]
    UnsupportedUrl,

    #[error("Could not extract YouTube video ID")]
    MissingVideoId,
}

/// Turn a submitted YouTube link into `https://www.youtube.com/embed/<id>`.
///
/// Accepts watch links (`/watch?v=`), short links (`youtu.be/<id>`), and
/// `/embed/`, `/v/`, `/shorts/` and legacy `/u/<x>/<id>` paths, with or
/// without a scheme.
pub fn to_embed_url(raw: &str) -> Result<String, EmbedError> {
    let url = parse_youtube_url(raw)?;
    let id = extract_video_id(&url).ok_or(EmbedError::MissingVideoId)?;
    Ok(format!("{EMBED_PREFIX}{id}"))
}

/// Whether `url` is already in canonical embed form.
pub fn is_embed_url(url: &str) -> bool {
    url.strip_prefix(EMBED_PREFIX).is_some_and(is_video_id)
}

fn parse_youtube_url(raw: &str) -> Result<Url, EmbedError> {
    let raw = raw.trim();
    let candidate = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else if raw.contains("://") {
        return Err(EmbedError::UnsupportedUrl);
    } else {
        format!("https://{raw}")
    };

    let url = Url::parse(&candidate).map_err(|_| EmbedError::UnsupportedUrl)?;
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    if !YOUTUBE_HOSTS.contains(&host.as_str()) || url.path().trim_matches('/').is_empty() {
        return Err(EmbedError::UnsupportedUrl);
    }
    Ok(url)
}

fn extract_video_id(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let candidate = if host.ends_with("youtu.be") {
        segments.first().map(|s| s.to_string())
    } else {
        match segments.as_slice() {
            ["watch", ..] => url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            ["embed" | "v" | "shorts", id, ..] => Some(id.to_string()),
            ["u", _, id, ..] => Some(id.to_string()),
            _ => None,
        }
    }?;

    is_video_id(&candidate).then_some(candidate)
}

fn is_video_id(s: &str) -> bool {
    s.len() == VIDEO_ID_LEN
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "https://www.youtube.com/embed/dQw4w9WgXcQ";

    #[test]
    fn test_watch_url() {
        assert_eq!(
            to_embed_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap(),
            CANONICAL
        );
    }

    #[test]
    fn test_watch_url_with_extra_params() {
        assert_eq!(
            to_embed_url("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=42s")
                .unwrap(),
            CANONICAL
        );
    }

    #[test]
    fn test_short_link() {
        assert_eq!(to_embed_url("https://youtu.be/dQw4w9WgXcQ?si=abc").unwrap(), CANONICAL);
    }

    #[test]
    fn test_without_scheme() {
        assert_eq!(to_embed_url("youtube.com/watch?v=dQw4w9WgXcQ").unwrap(), CANONICAL);
        assert_eq!(to_embed_url("www.youtu.be/dQw4w9WgXcQ").unwrap(), CANONICAL);
    }

    #[test]
    fn test_path_forms() {
        for url in [
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/v/dQw4w9WgXcQ",
            "https://m.youtube.com/shorts/dQw4w9WgXcQ",
            "http://youtube.com/u/1/dQw4w9WgXcQ",
        ] {
            assert_eq!(to_embed_url(url).unwrap(), CANONICAL, "for {url}");
        }
    }

    #[test]
    fn test_non_youtube_host_rejected() {
        assert_eq!(
            to_embed_url("https://example.com/x"),
            Err(EmbedError::UnsupportedUrl)
        );
        assert_eq!(
            to_embed_url("https://notyoutube.com/watch?v=dQw4w9WgXcQ"),
            Err(EmbedError::UnsupportedUrl)
        );
        assert_eq!(
            to_embed_url("ftp://youtube.com/watch?v=dQw4w9WgXcQ"),
            Err(EmbedError::UnsupportedUrl)
        );
        assert_eq!(to_embed_url("https://www.youtube.com/"), Err(EmbedError::UnsupportedUrl));
        assert_eq!(to_embed_url(""), Err(EmbedError::UnsupportedUrl));
    }

    #[test]
    fn test_bad_video_id_rejected() {
        assert_eq!(
            to_embed_url("https://www.youtube.com/watch?v=short"),
            Err(EmbedError::MissingVideoId)
        );
        assert_eq!(
            to_embed_url("https://www.youtube.com/channel/UC1234567890"),
            Err(EmbedError::MissingVideoId)
        );
        assert_eq!(
            to_embed_url("https://youtu.be/dQw4w9WgXcQextra"),
            Err(EmbedError::MissingVideoId)
        );
    }

    #[test]
    fn test_is_embed_url() {
        assert!(is_embed_url(CANONICAL));
        assert!(!is_embed_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(!is_embed_url("https://www.youtube.com/embed/"));
    }
}
