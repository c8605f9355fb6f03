use url::Url;

/// Permissive URI constructor used for every link-like field.
///
/// Absolute values parse directly. Relative values resolve against `base`
/// when one is known. Anything else yields `None` instead of an error, so a
/// broken link in a document only drops that one field.
///
/// # Examples
///
/// ```
/// use feedloom::util::to_uri;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/blog/").unwrap();
/// assert_eq!(
///     to_uri("post/1", Some(&base)).unwrap().as_str(),
///     "https://example.com/blog/post/1"
/// );
/// assert!(to_uri("not a uri", None).is_none());
/// ```
pub fn to_uri(text: &str, base: Option<&Url>) -> Option<Url> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let encoded = text.replace(' ', "%20");

    match Url::parse(&encoded) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => match base {
            Some(base) => base.join(&encoded).ok(),
            None => {
                tracing::trace!(uri = text, "Relative URI without base");
                None
            }
        },
        Err(e) => {
            tracing::trace!(uri = text, error = %e, "Malformed URI");
            None
        }
    }
}

/// Parses a feed address, assuming `http://` when no scheme is given.
pub fn with_default_scheme(text: &str) -> Option<Url> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if has_scheme(text) {
        to_uri(text, None)
    } else {
        to_uri(&format!("http://{text}"), None)
    }
}

fn has_scheme(text: &str) -> bool {
    match text.split_once("://") {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => text.starts_with("feed:") || text.starts_with("file:"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_uri_parses() {
        let url = to_uri(" https://example.com/feed.xml ", None).unwrap();
        assert_eq!(url.as_str(), "https://example.com/feed.xml");
    }

    #[test]
    fn test_relative_uri_needs_base() {
        assert!(to_uri("/item/1", None).is_none());

        let base = Url::parse("https://example.com/a/b").unwrap();
        assert_eq!(
            to_uri("/item/1", Some(&base)).unwrap().as_str(),
            "https://example.com/item/1"
        );
    }

    #[test]
    fn test_spaces_are_encoded() {
        let url = to_uri("https://example.com/a b.mp3", None).unwrap();
        assert_eq!(url.path(), "/a%20b.mp3");
    }

    #[test]
    fn test_malformed_uri_is_none() {
        assert!(to_uri("http://[bad", None).is_none());
        assert!(to_uri("", None).is_none());
    }

    #[test]
    fn test_default_scheme() {
        assert_eq!(
            with_default_scheme("example.com/rss").unwrap().as_str(),
            "http://example.com/rss"
        );
        assert_eq!(
            with_default_scheme("https://example.com/rss").unwrap().as_str(),
            "https://example.com/rss"
        );
    }
}
