use percent_encoding::percent_decode_str;

/// Document served when a request resolves to an empty key
pub const DEFAULT_DOCUMENT: &str = "index.html";

/// Maps request paths to archive keys.
///
/// Keys are matched literally against the archive, so no `.`/`..`
/// collapsing happens here: a traversal string is just a key the index
/// will not find.
#[derive(Debug, Clone)]
pub struct PathResolver {
    /// Mount prefix without a trailing `/`; empty when mounted at the root
    mount: String,
    default_document: String,
}

impl PathResolver {
    pub fn new(default_document: impl Into<String>) -> Self {
        Self {
            mount: String::new(),
            default_document: default_document.into(),
        }
    }

    /// Serve the archive under `prefix` (e.g. `/static`) instead of the root.
    pub fn with_mount(mut self, prefix: &str) -> Self {
        self.mount = prefix.trim_end_matches('/').to_string();
        if !self.mount.is_empty() && !self.mount.starts_with('/') {
            self.mount.insert(0, '/');
        }
        self
    }

    pub fn default_document(&self) -> &str {
        &self.default_document
    }

    /// Archive key for a raw (percent-encoded) request path.
    ///
    /// Returns `None` when the path lies outside the mount prefix.
    pub fn resolve(&self, raw_path: &str) -> Option<String> {
        let path = percent_decode_str(raw_path).decode_utf8_lossy();

        let rest = path.strip_prefix(self.mount.as_str())?;
        if !self.mount.is_empty() && !rest.is_empty() && !rest.starts_with('/') {
            // "/staticfoo" is not under "/static"
            return None;
        }

        let key = rest.strip_prefix('/').unwrap_or(rest);
        if key.is_empty() {
            Some(self.default_document.clone())
        } else {
            Some(key.to_string())
        }
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(DEFAULT_DOCUMENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/app.js", "app.js")]
    #[case("/css/site.css", "css/site.css")]
    #[case("app.js", "app.js")]
    #[case("//double.js", "/double.js")]
    #[case("/../secret", "../secret")]
    #[case("/with%20space.txt", "with space.txt")]
    #[case("/", "index.html")]
    #[case("", "index.html")]
    fn test_resolve_at_root(#[case] raw: &str, #[case] key: &str) {
        let resolver = PathResolver::default();

        assert_eq!(resolver.resolve(raw).as_deref(), Some(key));
    }

    #[rstest]
    fn test_custom_default_document() {
        let resolver = PathResolver::new("home.htm");

        assert_eq!(resolver.resolve("/").as_deref(), Some("home.htm"));
        assert_eq!(resolver.default_document(), "home.htm");
    }

    #[rstest]
    #[case("/static/app.js", Some("app.js"))]
    #[case("/static/", Some("index.html"))]
    #[case("/static", Some("index.html"))]
    #[case("/staticfoo/app.js", None)]
    #[case("/other/app.js", None)]
    fn test_resolve_under_mount(#[case] raw: &str, #[case] key: Option<&str>) {
        let resolver = PathResolver::default().with_mount("static/");

        assert_eq!(resolver.resolve(raw).as_deref(), key);
    }

    #[rstest]
    fn test_root_mount_is_normalized() {
        let resolver = PathResolver::default().with_mount("/");

        assert_eq!(resolver.resolve("/app.js").as_deref(), Some("app.js"));
    }
}
