//! Find and bump container image versions pinned in Dockerfiles.
//!
//! ```
//! use bumpversion::Dockerfile;
//!
//! let mut dockerfile = Dockerfile::parse("Dockerfile", "FROM ubuntu:14.04\n").unwrap();
//! dockerfile.set_version("ubuntu", "16.04").unwrap();
//! assert_eq!(dockerfile.as_bytes(), b"FROM ubuntu:16.04\n");
//! ```

pub mod deps;
pub mod dockerfile;
pub mod error;
pub mod image;

pub use deps::{Versioned, VersionedPackages};
pub use dockerfile::Dockerfile;
pub use error::{Error, Result};
pub use image::ImageReference;
