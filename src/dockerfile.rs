// Dockerfile image pinning
//
// Indexes the images introduced by `FROM` lines and rewrites their versions
// while leaving every other line of the file byte-for-byte unchanged.

use std::collections::HashMap;
use std::io::{BufRead, Write};

use tracing::{debug, info};

use crate::deps::VersionedPackages;
use crate::error::{Error, Result};
use crate::image::ImageReference;

/// Instruction that introduces a base image
const FROM: &[u8] = b"FROM";

/// A Dockerfile and the images it is built from
#[derive(Debug, Clone, Default)]
pub struct Dockerfile {
    source: String,
    data: Vec<u8>,
    artifacts: HashMap<String, ImageReference>,
}

impl Dockerfile {
    /// Create an empty document labelled with `source` (usually its path)
    pub fn empty(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Read a Dockerfile from `reader` and index its `FROM` images
    pub fn new<R: BufRead>(source: impl Into<String>, reader: R) -> Result<Self> {
        let mut dockerfile = Self::empty(source);
        dockerfile.load(reader)?;
        Ok(dockerfile)
    }

    /// Parse Dockerfile content held in memory
    pub fn parse(source: impl Into<String>, content: &str) -> Result<Self> {
        Self::new(source, content.as_bytes())
    }

    /// Label given when the document was created
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Read lines from `reader`, appending them to the document
    ///
    /// Every line is stored with a trailing `\n`, so content without a final
    /// newline gains one. Loading stops at the first invalid image reference;
    /// the document then holds every line up to and including the failing
    /// one and must be discarded.
    pub fn load<R: BufRead>(&mut self, mut reader: R) -> Result<()> {
        let mut line = Vec::new();
        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            if line.last() == Some(&b'\n') {
                line.pop();
            }

            self.data.extend_from_slice(&line);
            self.data.push(b'\n');

            if let Some(reference) = from_reference(&line) {
                let image = ImageReference::parse(&String::from_utf8_lossy(reference))?;
                debug!(
                    source = %self.source,
                    image = %image,
                    "Found base image"
                );
                self.artifacts.insert(image.name().to_string(), image);
            }
        }

        Ok(())
    }

    /// Images referenced by `FROM` lines, keyed by name
    pub fn artifacts(&self) -> &HashMap<String, ImageReference> {
        &self.artifacts
    }

    /// Image registered under `name`, if any
    pub fn artifact(&self, name: &str) -> Option<&ImageReference> {
        self.artifacts.get(name)
    }

    /// Change the version of image `name` and rewrite its `FROM` lines
    ///
    /// Every line starting with `FROM <old reference>` is replaced by
    /// `FROM <new reference>`. Anything following the old reference on that
    /// line, such as an `AS <stage>` alias, is dropped. Line endings are kept.
    pub fn set_version(&mut self, name: &str, version: &str) -> Result<()> {
        let image = self
            .artifacts
            .get_mut(name)
            .ok_or_else(|| Error::NotFound {
                name: name.to_string(),
            })?;

        let find = from_line(image);
        image.set_version(version);
        let replacement = from_line(image);

        let mut data = Vec::with_capacity(self.data.len());
        let mut rewritten = 0usize;
        for line in self.data.split_inclusive(|b| *b == b'\n') {
            let content = line.strip_suffix(b"\n").unwrap_or(line);
            if content.starts_with(&find) {
                data.extend_from_slice(&replacement);
                if content.ends_with(b"\r") {
                    data.push(b'\r');
                }
                if line.len() != content.len() {
                    data.push(b'\n');
                }
                rewritten += 1;
            } else {
                data.extend_from_slice(line);
            }
        }
        self.data = data;

        info!(
            source = %self.source,
            image = name,
            version = version,
            lines = rewritten,
            "Updated image version"
        );

        Ok(())
    }

    /// Write the document, including any applied version changes
    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.data)?;
        Ok(())
    }

    /// Current content of the document
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Reference field of a `FROM <reference>[ <rest>]` line, if `line` is one
fn from_reference(line: &[u8]) -> Option<&[u8]> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let rest = line.strip_prefix(FROM)?.strip_prefix(b" ")?;
    rest.split(|b| *b == b' ').next()
}

fn from_line(image: &ImageReference) -> Vec<u8> {
    let mut line = FROM.to_vec();
    line.push(b' ');
    line.extend_from_slice(image.to_string().as_bytes());
    line
}

impl VersionedPackages for Dockerfile {
    type Artifact = ImageReference;

    fn load<R: BufRead>(&mut self, reader: R) -> Result<()> {
        Dockerfile::load(self, reader)
    }

    fn write<W: Write>(&self, writer: W) -> Result<()> {
        Dockerfile::write(self, writer)
    }

    fn artifacts(&self) -> &HashMap<String, ImageReference> {
        Dockerfile::artifacts(self)
    }

    fn set_version(&mut self, name: &str, version: &str) -> Result<()> {
        Dockerfile::set_version(self, name, version)
    }
}
