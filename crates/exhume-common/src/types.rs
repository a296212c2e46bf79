//! Core types handed between identification and execution.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Database engine family behind a data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Engine {
    MySql,
    MariaDb,
}

impl Engine {
    /// The image repository name on the registry.
    pub fn repository(&self) -> &'static str {
        match self {
            Engine::MySql => "mysql",
            Engine::MariaDb => "mariadb",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.repository())
    }
}

impl FromStr for Engine {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(Engine::MySql),
            "mariadb" => Ok(Engine::MariaDb),
            other => Err(Error::Config(format!("unknown database engine: {other}"))),
        }
    }
}

/// Canonical `engine:major.minor` image reference.
///
/// The sole handoff value from identification to execution; also the input
/// from which the deterministic container name is derived, so repeated runs
/// against the same tag can find and reconcile a leftover container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageTag(String);

/// Prefix for container names derived from an image tag.
const CONTAINER_NAME_PREFIX: &str = "exhume_";

impl ImageTag {
    /// Build a tag from an identified version signature.
    pub fn new(engine: Engine, major: u32, minor: u32) -> Self {
        ImageTag(format!("{}:{}.{}", engine.repository(), major, minor))
    }

    /// Build a tag from a manually entered `major.minor` version string.
    pub fn from_parts(engine: Engine, version: &str) -> Result<Self> {
        let version = version.trim();
        let (major, minor) = version
            .split_once('.')
            .ok_or_else(|| Error::Config(format!("version must be major.minor, got `{version}`")))?;
        let major: u32 = major
            .parse()
            .map_err(|_| Error::Config(format!("invalid major version in `{version}`")))?;
        let minor: u32 = minor
            .parse()
            .map_err(|_| Error::Config(format!("invalid minor version in `{version}`")))?;
        Ok(ImageTag::new(engine, major, minor))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fully qualified reference used against the registry.
    pub fn registry_qualified(&self) -> String {
        format!("docker.io/library/{}", self.0)
    }

    /// Deterministic container name: fixed prefix plus the tag with the
    /// `:` separator stripped.
    pub fn container_name(&self) -> String {
        format!("{}{}", CONTAINER_NAME_PREFIX, self.0.replacen(':', "", 1))
    }
}

impl fmt::Display for ImageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_tag_format() {
        assert_eq!(ImageTag::new(Engine::MySql, 5, 6).as_str(), "mysql:5.6");
        assert_eq!(
            ImageTag::new(Engine::MariaDb, 10, 11).as_str(),
            "mariadb:10.11"
        );
    }

    #[test]
    fn test_registry_qualified() {
        assert_eq!(
            ImageTag::new(Engine::MySql, 8, 0).registry_qualified(),
            "docker.io/library/mysql:8.0"
        );
    }

    #[test]
    fn test_container_name_is_deterministic() {
        let tag = ImageTag::new(Engine::MariaDb, 10, 6);
        assert_eq!(tag.container_name(), "exhume_mariadb10.6");
        assert_eq!(tag.container_name(), tag.container_name());
    }

    #[test]
    fn test_from_parts() {
        let tag = ImageTag::from_parts(Engine::MySql, " 8.3 ").unwrap();
        assert_eq!(tag.as_str(), "mysql:8.3");
        // extra dotted components beyond minor are rejected for manual entry
        assert!(ImageTag::from_parts(Engine::MySql, "8.0.44").is_err());
        assert!(ImageTag::from_parts(Engine::MySql, "8").is_err());
        assert!(ImageTag::from_parts(Engine::MySql, "latest").is_err());
    }

    #[test]
    fn test_engine_from_str() {
        assert_eq!("mysql".parse::<Engine>().unwrap(), Engine::MySql);
        assert_eq!("MariaDB".parse::<Engine>().unwrap(), Engine::MariaDb);
        assert!("postgres".parse::<Engine>().is_err());
    }
}
