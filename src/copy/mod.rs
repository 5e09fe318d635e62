//! Invocation of the external image copy tool
//!
//! Copies are never performed in-process: every [`CopyTask`](crate::sync::CopyTask)
//! becomes one `skopeo copy` run, either straight from the local path or inside
//! a throwaway container. [`CopyCommand`] owns the argument grammar and
//! [`SkopeoInvoker`] runs it.

pub mod command;
pub mod invoker;

pub use command::{CopyCommand, CopySettings, EndpointOptions, RuntimeMode};
pub use invoker::{CopyInvoker, SkopeoInvoker};

/// Output fragments meaning the source artifact no longer exists
pub const MISSING_SOURCE_MARKERS: &[&str] = &["manifest unknown"];

/// True when copy tool output reports a missing source manifest
pub fn is_missing_source(output: &str) -> bool {
    let lowered = output.to_ascii_lowercase();
    MISSING_SOURCE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_source_markers() {
        assert!(is_missing_source(
            "FATA[0001] Error reading manifest 1.0 in localhost:5001/demo/app: manifest unknown"
        ));
        assert!(is_missing_source("MANIFEST UNKNOWN"));
        assert!(!is_missing_source("unauthorized: authentication required"));
        assert!(!is_missing_source(""));
    }
}
