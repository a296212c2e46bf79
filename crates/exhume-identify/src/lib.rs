//! Engine/version identification for unknown database data directories.
//!
//! Artifact files on disk embed the version of the engine that wrote them,
//! in one of two incompatible encodings depending on era: a packed integer
//! (older table-definition files) or a dotted string (newer metadata and
//! binary logs). This crate scans a directory for such artifacts, parses
//! whatever `file(1)` reports about them, tallies the observed signatures,
//! and delegates the final pick to the injected chooser.

pub mod identifier;
pub mod inspector;
pub mod signature;

pub use identifier::{ArtifactPattern, VersionIdentifier};
pub use inspector::{FileInspector, FileTypeCommand};
pub use signature::{parse_line, VersionSignature, VersionToken};
