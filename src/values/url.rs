use std::any::Any;
use std::sync::LazyLock;

use url::Url;

use crate::error::ScanfigError;
use crate::setter::{Setter, SetterCreator};
use crate::slot::Slot;
use crate::types::{Tags, keys};
use crate::validate::check_pattern;

const URL: &str = "url";
const BLANK: &str = "about:blank";

/// Parsed once; `about:blank` is a constant, well-formed URL.
static BLANK_URL: LazyLock<Url> = LazyLock::new(|| Url::parse(BLANK).expect("valid URL"));

/// Placeholder value for an unset URL field.
pub(crate) fn blank() -> Url {
    BLANK_URL.clone()
}

/// Host with its port, when one is given explicitly.
fn authority(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

pub struct UrlCreator;

impl SetterCreator<Url> for UrlCreator {
    fn create(&self, slot: Slot<Url>, tags: &Tags) -> Box<dyn Setter> {
        Box::new(UrlSetter {
            slot,
            tags: tags.clone(),
        })
    }
}

struct UrlSetter {
    slot: Slot<Url>,
    tags: Tags,
}

impl Setter for UrlSetter {
    fn render(&self) -> String {
        match self.slot.get() {
            Some(url) if url.as_str() != BLANK => url.to_string(),
            _ => String::new(),
        }
    }

    fn set_str(&self, value: &str) -> Result<(), ScanfigError> {
        let url = Url::parse(value.trim()).map_err(|_| ScanfigError::conversion(value, URL))?;
        check_pattern(&self.tags, keys::SCHEME, url.scheme(), value)?;
        check_pattern(&self.tags, keys::HOST, &authority(&url), value)?;
        check_pattern(&self.tags, keys::PATH, url.path(), value)?;
        self.slot.store(url)
    }

    fn set_int(&self, value: i64) -> Result<(), ScanfigError> {
        Err(ScanfigError::conversion(value, URL))
    }

    fn set_uint(&self, value: u64) -> Result<(), ScanfigError> {
        Err(ScanfigError::conversion(value, URL))
    }

    fn set_float(&self, value: f64) -> Result<(), ScanfigError> {
        Err(ScanfigError::conversion(value, URL))
    }

    fn set_bool(&self, value: bool) -> Result<(), ScanfigError> {
        Err(ScanfigError::conversion(value, URL))
    }

    fn get(&self) -> Box<dyn Any> {
        Box::new(self.slot.get().unwrap_or_else(blank))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setter(slot: &Slot<Url>, tags: Tags) -> Box<dyn Setter> {
        UrlCreator.create(slot.clone(), &tags)
    }

    #[test]
    fn parses_absolute_urls() {
        let slot = Slot::new(blank());
        let setter = setter(&slot, Tags::new());
        assert_eq!(setter.render(), "");
        setter.set_str("https://example.com:8443/api?x=1").unwrap();
        assert_eq!(setter.render(), "https://example.com:8443/api?x=1");
        assert!(setter.set_str("not a url").is_err());
        assert!(setter.set_str("/relative/path").is_err());
        assert!(setter.set_bool(true).is_err());
        assert_eq!(slot.get().unwrap().host_str(), Some("example.com"));
    }

    #[test]
    fn component_patterns() {
        let slot = Slot::new(blank());
        let tags = Tags::new()
            .with(keys::SCHEME, "^https?$")
            .with(keys::HOST, r"^[a-z.]+:\d+$")
            .with(keys::PATH, "^/api");
        let setter = setter(&slot, tags);
        setter.set_str("http://example.com:80/api/v1").unwrap_err();
        setter.set_str("http://example.com:8080/api/v1").unwrap();

        let err = setter.set_str("ftp://example.com:21/api").unwrap_err();
        assert!(
            err.to_string()
                .contains("'ftp' did not match regular expression '^https?$'"),
            "{err}"
        );
        let err = setter.set_str("https://example.com:8443/web").unwrap_err();
        assert!(err.to_string().contains("'/web' did not match"), "{err}");
        assert_eq!(slot.get().unwrap().as_str(), "http://example.com:8080/api/v1");
    }

    #[test]
    fn bad_pattern_is_invalid_constraint() {
        let slot = Slot::new(blank());
        let err = setter(&slot, Tags::new().with(keys::HOST, "("))
            .set_str("https://example.com")
            .unwrap_err();
        assert!(matches!(err, ScanfigError::InvalidConstraint { .. }));
    }

    #[test]
    fn blank_placeholder_renders_empty() {
        assert_eq!(blank().as_str(), BLANK);
        let slot = Slot::new(<Url as crate::setter::Configurable>::zero());
        let setter = UrlCreator.create(slot.clone(), &Tags::new());
        assert_eq!(setter.render(), "");
        setter.set_str("https://example.com/").unwrap();
        assert_eq!(setter.render(), "https://example.com/");
    }
}
