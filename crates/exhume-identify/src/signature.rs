//! Version signature extraction from artifact-file metadata lines.

use exhume_common::{Engine, ImageTag};

/// Packed MySQL version integers never encode a major of 10 or above, so a
/// packed major at or past this floor always identifies MariaDB regardless
/// of the marker found on the line.
pub const MARIADB_PACKED_MAJOR_FLOOR: u32 = 10;

/// An `(engine, major, minor)` tuple recovered from one artifact line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VersionSignature {
    pub engine: Engine,
    pub major: u32,
    pub minor: u32,
}

impl VersionSignature {
    pub fn image_tag(&self) -> ImageTag {
        ImageTag::new(self.engine, self.major, self.minor)
    }
}

/// The two version encodings found in artifact metadata.
///
/// Table-definition files from the packed era carry an integer like `50651`;
/// newer artifacts and binary logs carry a dotted string like `8.0.44`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionToken {
    Dotted { major: u32, minor: u32 },
    Packed(u32),
}

impl VersionToken {
    /// Classify a raw version token. Returns `None` for non-numeric tokens.
    pub fn classify(token: &str) -> Option<VersionToken> {
        if token.contains('.') {
            let mut parts = token.split('.');
            let major = parts.next()?.parse().ok()?;
            let minor = parts.next()?.parse().ok()?;
            Some(VersionToken::Dotted { major, minor })
        } else {
            token.parse().ok().map(VersionToken::Packed)
        }
    }

    /// Resolve the token against the engine marker found on the line.
    pub fn resolve(self, marked: Engine) -> VersionSignature {
        match self {
            VersionToken::Dotted { major, minor } => VersionSignature {
                engine: marked,
                major,
                minor,
            },
            VersionToken::Packed(value) => {
                let major = value / 10_000;
                let minor = (value - major * 10_000) / 100;
                let engine = if major >= MARIADB_PACKED_MAJOR_FLOOR {
                    Engine::MariaDb
                } else {
                    marked
                };
                VersionSignature {
                    engine,
                    major,
                    minor,
                }
            }
        }
    }
}

/// Parse one line of artifact-file metadata into a version signature.
///
/// The line must carry a case-insensitive engine marker; the MariaDB marker
/// wins when both are present. The last whitespace-delimited field is the
/// version token. Lines without a marker or with a non-numeric token yield
/// `None` and must not abort the surrounding scan.
pub fn parse_line(line: &str) -> Option<VersionSignature> {
    let marked = engine_marker(line)?;
    let token = line.split_whitespace().last()?;
    VersionToken::classify(token).map(|t| t.resolve(marked))
}

fn engine_marker(line: &str) -> Option<Engine> {
    let lower = line.to_ascii_lowercase();
    if lower.contains("mariadb") {
        Some(Engine::MariaDb)
    } else if lower.contains("mysql") {
        Some(Engine::MySql)
    } else {
        None
    }
}
