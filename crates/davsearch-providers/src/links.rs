//! Links to result thumbnails and objects.

use url::Url;

use crate::error::{ProviderError, ProviderResult};

/// Builds the URLs placed in result entries.
pub trait UrlGenerator: Send + Sync {
    /// URL of an image shipped with `app`.
    fn image_path(&self, app: &str, file: &str) -> String;

    /// Deep link opening `object_uri` of `container_uri` in `app`.
    fn link_to_object(&self, app: &str, container_uri: &str, object_uri: &str) -> String;
}

/// Resolves links against a fixed base URL.
///
/// Images live at `<base>/apps/<app>/img/<file>`, objects at
/// `<base>/apps/<app>/<container>/<object>`. Segments are percent-encoded.
#[derive(Debug, Clone)]
pub struct BaseUrlGenerator {
    base: Url,
}

impl BaseUrlGenerator {
    /// Creates a generator for `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Config`] if `base` is not an absolute
    /// hierarchical URL (e.g. `mailto:` or a relative path).
    pub fn new(base: &str) -> ProviderResult<Self> {
        let mut base = Url::parse(base)
            .map_err(|e| ProviderError::config(format!("invalid base URL {base:?}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ProviderError::config(format!(
                "base URL {base} cannot hold a path"
            )));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self { base })
    }

    /// Returns the base URL.
    pub fn base(&self) -> &Url {
        &self.base
    }

    fn resolve(&self, segments: &[&str]) -> String {
        let relative = segments
            .iter()
            .map(|s| urlencoding::encode(s))
            .collect::<Vec<_>>()
            .join("/");
        match self.base.join(&relative) {
            Ok(url) => url.to_string(),
            // Encoded segments always join; keep the relative form otherwise.
            Err(_) => format!("{}{relative}", self.base),
        }
    }
}

impl UrlGenerator for BaseUrlGenerator {
    fn image_path(&self, app: &str, file: &str) -> String {
        self.resolve(&["apps", app, "img", file])
    }

    fn link_to_object(&self, app: &str, container_uri: &str, object_uri: &str) -> String {
        self.resolve(&["apps", app, container_uri, object_uri])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_image_and_object_links() {
        let urls = BaseUrlGenerator::new("https://cloud.example.com/nc").unwrap();
        assert_eq!(
            urls.image_path("calendar", "calendar.svg"),
            "https://cloud.example.com/nc/apps/calendar/img/calendar.svg"
        );
        assert_eq!(
            urls.link_to_object("calendar", "my work", "a/b?.ics"),
            "https://cloud.example.com/nc/apps/calendar/my%20work/a%2Fb%3F.ics"
        );
    }

    #[test]
    fn rejects_unusable_bases() {
        assert!(BaseUrlGenerator::new("not a url").is_err());
        assert!(BaseUrlGenerator::new("mailto:admin@example.com").is_err());
    }
}
