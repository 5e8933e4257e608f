// Container image reference parsing
//
// Parses references like `registry.example.com:5000/team/app:1.2@sha256:abc`
// into a name and a version (tag and/or digest).

use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::deps::Versioned;
use crate::error::{Error, Result};

/// Prefix every supported content digest starts with
pub const DIGEST_PREFIX: &str = "sha256:";

/// Separator between a tag and a digest in a combined version
const TAG_DIGEST_SEPARATOR: &str = "@sha256:";

lazy_static::lazy_static! {
    static ref IMAGE_REFERENCE: Regex = Regex::new(concat!(
        r"^(((?P<registry>[a-z]+[.][a-z0-9.-]+(:[0-9]+)?)/)?",
        r"((?P<group>[a-zA-Z0-9-]+)/)?",
        r"(?P<image>[a-z0-9]+[a-z0-9-]+))",
        r"((:(?P<tag>[a-z0-9._+-]+))?)",
        r"((@(?P<digest>sha256:[a-f0-9]+))?)$",
    ))
    .expect("image reference pattern is valid");
}

/// A container image reference split into name, tag and digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    name: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl ImageReference {
    /// Parse and validate an image reference
    ///
    /// The whole string is validated against the reference grammar first.
    /// The split points are then located independently: the digest follows
    /// the last `@`, the tag follows the last `:` before it, and the name is
    /// everything in front of both. For `registry.io:5000/app` (port, no tag)
    /// this means the port is read as the tag; formatting still reproduces
    /// the input exactly.
    pub fn parse(reference: &str) -> Result<Self> {
        if !IMAGE_REFERENCE.is_match(reference) {
            return Err(Error::Syntax {
                reference: reference.to_string(),
            });
        }

        let at = reference.rfind('@');
        let version_end = at.unwrap_or(reference.len());
        let digest = at.map(|pos| reference[pos + 1..].to_string());

        let colon = reference[..version_end].rfind(':');
        let tag = colon.map(|pos| reference[pos + 1..version_end].to_string());

        let name_end = colon.unwrap_or(version_end);

        Ok(Self {
            name: reference[..name_end].to_string(),
            tag,
            digest,
        })
    }

    /// Name of the image without tag or digest
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag, if the reference carries one
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Digest (`sha256:...`), if the reference carries one
    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// Replace the version of this image
    ///
    /// - `sha256:...` sets the digest and clears the tag
    /// - `tag@sha256:...` sets both, splitting on the first `@`
    /// - anything else sets the tag and clears the digest
    ///
    /// The version is not validated.
    pub fn set_version(&mut self, version: &str) {
        if version.starts_with(DIGEST_PREFIX) {
            self.digest = non_empty(version);
            self.tag = None;
        } else if let Some((tag, digest)) = version
            .split_once('@')
            .filter(|_| version.contains(TAG_DIGEST_SEPARATOR))
        {
            self.tag = non_empty(tag);
            self.digest = non_empty(digest);
        } else {
            self.tag = non_empty(version);
            self.digest = None;
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.tag, &self.digest) {
            (Some(tag), Some(digest)) => write!(f, "{}:{}@{}", self.name, tag, digest),
            (None, Some(digest)) => write!(f, "{}@{}", self.name, digest),
            (Some(tag), None) => write!(f, "{}:{}", self.name, tag),
            (None, None) => f.write_str(&self.name),
        }
    }
}

impl FromStr for ImageReference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Versioned for ImageReference {
    fn name(&self) -> &str {
        ImageReference::name(self)
    }

    fn set_version(&mut self, version: &str) {
        ImageReference::set_version(self, version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGES: &[(&str, &str)] = &[
        ("alpine:3.5@sha256:59384573945873458347593587", "alpine"),
        ("ubuntu", "ubuntu"),
        ("ubuntu:14.04", "ubuntu"),
        ("library/alpine:3.5", "library/alpine"),
        (
            "library/alpine@sha256:59384573945873458347593587",
            "library/alpine",
        ),
        (
            "dk.tech.example.com:8080/team1/image2:latest",
            "dk.tech.example.com:8080/team1/image2",
        ),
        ("registry.example.com/Team-A/app:1.0_rc+build-7", "registry.example.com/Team-A/app"),
    ];

    #[test]
    fn test_parse_round_trip() {
        for (input, name) in IMAGES {
            let image = ImageReference::parse(input).unwrap();
            assert_eq!(image.to_string(), *input);
            assert_eq!(image.name(), *name, "name of {}", input);
            assert_eq!(ImageReference::parse(&image.to_string()).unwrap(), image);
        }
    }

    #[test]
    fn test_parse_components() {
        let image = ImageReference::parse("ubuntu:14.04").unwrap();
        assert_eq!(image.name(), "ubuntu");
        assert_eq!(image.tag(), Some("14.04"));
        assert_eq!(image.digest(), None);

        let image =
            ImageReference::parse("library/alpine@sha256:59384573945873458347593587").unwrap();
        assert_eq!(image.name(), "library/alpine");
        assert_eq!(image.tag(), None);
        assert_eq!(image.digest(), Some("sha256:59384573945873458347593587"));

        let image = ImageReference::parse("dk.tech.example.com:8080/team1/image2:latest").unwrap();
        assert_eq!(image.tag(), Some("latest"));

        let image = ImageReference::parse("alpine:3.5@sha256:abc123").unwrap();
        assert_eq!(image.name(), "alpine");
        assert_eq!(image.tag(), Some("3.5"));
        assert_eq!(image.digest(), Some("sha256:abc123"));
    }

    #[test]
    fn test_parse_port_without_tag_uses_last_colon() {
        let input = "dk.tech.example.com:8080/team1/image2";
        let image = ImageReference::parse(input).unwrap();
        assert_eq!(image.name(), "dk.tech.example.com");
        assert_eq!(image.tag(), Some("8080/team1/image2"));
        assert_eq!(image.to_string(), input);
    }

    #[test]
    fn test_parse_long_reference() {
        let input = format!("registry.example.com/team/app@sha256:{}", "a".repeat(64));
        let image = ImageReference::parse(&input).unwrap();
        assert_eq!(image.name(), "registry.example.com/team/app");
        assert_eq!(image.tag(), None);
        assert_eq!(image.to_string(), input);
    }

    #[test]
    fn test_parse_rejects_invalid() {
        for input in [
            "invalid.image:bad",
            "Ubuntu",
            "",
            "a",
            "ubuntu:",
            "ubuntu:Latest",
            "alpine:3.5-RC1@sha256:abc",
            "ubuntu@sha256:ABCDEF",
            "ubuntu@md5:abc",
            "ubuntu 14.04",
            "-ubuntu",
        ] {
            match ImageReference::parse(input) {
                Err(Error::Syntax { reference }) => assert_eq!(reference, input),
                other => panic!("expected syntax error for {:?}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_from_str() {
        let image: ImageReference = "nginx:1.25".parse().unwrap();
        assert_eq!(image.name(), "nginx");
        assert!("NGINX".parse::<ImageReference>().is_err());
    }

    #[test]
    fn test_set_version() {
        let cases = [
            ("3.6", "alpine:3.6"),
            (
                "sha256:59384573945873458347593587",
                "alpine@sha256:59384573945873458347593587",
            ),
            (
                "3.6@sha256:59384573945873458347593587",
                "alpine:3.6@sha256:59384573945873458347593587",
            ),
            ("", "alpine"),
        ];

        for (version, expected) in cases {
            let mut image = ImageReference::parse("alpine").unwrap();
            image.set_version(version);
            assert_eq!(image.to_string(), expected, "version {:?}", version);
        }
    }

    #[test]
    fn test_set_version_replaces_previous_version() {
        let mut image = ImageReference::parse("ubuntu:14.04@sha256:abc").unwrap();
        image.set_version("16.04");
        assert_eq!(image.tag(), Some("16.04"));
        assert_eq!(image.digest(), None);

        image.set_version("sha256:deadbeef");
        assert_eq!(image.tag(), None);
        assert_eq!(image.digest(), Some("sha256:deadbeef"));

        image.set_version("16.04@sha256:deadbeef");
        assert_eq!(image.tag(), Some("16.04"));
        assert_eq!(image.digest(), Some("sha256:deadbeef"));
        assert_eq!(image.name(), "ubuntu");
    }

    #[test]
    fn test_set_version_splits_on_first_at() {
        let mut image = ImageReference::parse("alpine").unwrap();
        image.set_version("3.6@extra@sha256:beef");
        assert_eq!(image.tag(), Some("3.6"));
        assert_eq!(image.digest(), Some("extra@sha256:beef"));
    }

    #[test]
    fn test_set_version_at_without_digest_is_a_tag() {
        let mut image = ImageReference::parse("alpine:3.5@sha256:abc").unwrap();
        image.set_version("3.6@md5:beef");
        assert_eq!(image.tag(), Some("3.6@md5:beef"));
        assert_eq!(image.digest(), None);
    }

    #[test]
    fn test_set_version_is_not_validated() {
        let mut image = ImageReference::parse("alpine").unwrap();
        image.set_version("NOT A TAG");
        assert_eq!(image.to_string(), "alpine:NOT A TAG");
    }
}
