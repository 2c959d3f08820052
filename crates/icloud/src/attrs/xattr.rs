//! Attribute store backed by the macOS `xattr` tool.
//!
//! Values are always read with `-px` (hex) so binary plists and other
//! non-text payloads survive the trip intact.

use std::path::Path;
use std::sync::Arc;

use super::AttributeStore;
use crate::error::{Error, Result};
use crate::process::{CommandRunner, SystemRunner, path_arg};

/// Attribute store that shells out to `xattr`.
pub struct XattrCli {
    runner: Arc<dyn CommandRunner>,
}

impl XattrCli {
    /// Create a store that runs the real `xattr` binary.
    pub fn new() -> Self {
        Self::with_runner(Arc::new(SystemRunner))
    }

    /// Create a store on top of a custom runner.
    pub fn with_runner(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn xattr(&self, path: &Path, args: &[&str]) -> Result<String> {
        self.runner
            .run_checked("xattr", args)
            .map_err(|e| map_xattr_error(e, path))
    }
}

impl Default for XattrCli {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeStore for XattrCli {
    fn names(&self, path: &Path) -> Result<Vec<String>> {
        let out = self.xattr(path, &[path_arg(path)?])?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(ToString::to_string)
            .collect())
    }

    fn get(&self, path: &Path, name: &str) -> Result<Vec<u8>> {
        let out = self.xattr(path, &["-px", name, path_arg(path)?])?;
        decode_hex(&out)
    }

    fn set(&self, path: &Path, name: &str, value: &[u8]) -> Result<()> {
        let path_str = path_arg(path)?;
        match std::str::from_utf8(value) {
            Ok(text) if !text.contains('\0') => {
                self.xattr(path, &["-w", name, text, path_str])?;
            }
            _ => {
                let hex = encode_hex(value);
                self.xattr(path, &["-wx", name, hex.as_str(), path_str])?;
            }
        }
        Ok(())
    }

    fn remove(&self, path: &Path, name: &str) -> Result<()> {
        self.xattr(path, &["-d", name, path_arg(path)?])?;
        Ok(())
    }
}

/// Parse common `xattr` error messages into specific error types.
fn map_xattr_error(err: Error, path: &Path) -> Error {
    match err {
        Error::ToolFailed { stderr, .. }
            if stderr.contains("No such file") || stderr.contains("does not exist") =>
        {
            Error::NotFound(path.to_path_buf())
        }
        Error::ToolFailed { stderr, .. }
            if stderr.contains("Permission denied")
                || stderr.contains("Operation not permitted") =>
        {
            Error::PermissionDenied(path.to_path_buf())
        }
        other => other,
    }
}

/// Decode `xattr -px` output: hex byte pairs separated by whitespace.
fn decode_hex(text: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    for token in text.split_whitespace() {
        // Some versions print runs without separators.
        if token.len() % 2 != 0 {
            return Err(Error::Other(format!("unexpected xattr hex output: {token:?}")));
        }
        for pair in token.as_bytes().chunks(2) {
            let byte = std::str::from_utf8(pair)
                .ok()
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| Error::Other(format!("unexpected xattr hex output: {token:?}")))?;
            bytes.push(byte);
        }
    }
    Ok(bytes)
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ScriptedRunner;

    #[test]
    fn test_decode_hex() {
        assert_eq!(decode_hex("31\n").unwrap(), b"1");
        assert_eq!(decode_hex("74 72 75 65").unwrap(), b"true");
        assert_eq!(
            decode_hex("62 70 6C 69\n73 74 30 30\n").unwrap(),
            b"bplist00"
        );
        assert_eq!(decode_hex("6E6576").unwrap(), b"nev");
        assert!(decode_hex("").unwrap().is_empty());
        assert!(decode_hex("ZZ").is_err());
        assert!(decode_hex("6E6").is_err());
        assert!(decode_hex("31 3").is_err());
    }

    #[test]
    fn test_encode_hex() {
        assert_eq!(encode_hex(&[0x00, 0xff, 0x31]), "00FF31");
    }

    #[test]
    fn test_names_parses_lines() {
        let runner = Arc::new(ScriptedRunner::new().printing(
            "xattr",
            "com.apple.file-provider.materialized\n\ncom.apple.quarantine\n",
        ));
        let store = XattrCli::with_runner(runner.clone());

        let names = store.names(Path::new("/tmp/a")).unwrap();
        assert_eq!(
            names,
            vec!["com.apple.file-provider.materialized", "com.apple.quarantine"]
        );
        assert_eq!(runner.calls(), vec![vec!["xattr", "/tmp/a"]]);
    }

    #[test]
    fn test_set_uses_text_or_hex() {
        let runner = Arc::new(ScriptedRunner::new());
        let store = XattrCli::with_runner(runner.clone());
        let path = Path::new("/tmp/a");

        store.set(path, "com.apple.file-provider.evicted", b"1").unwrap();
        store.set(path, "bin", &[0, 1]).unwrap();

        let calls = runner.calls_to("xattr");
        assert_eq!(
            calls[0],
            vec!["xattr", "-w", "com.apple.file-provider.evicted", "1", "/tmp/a"]
        );
        assert_eq!(calls[1], vec!["xattr", "-wx", "bin", "0001", "/tmp/a"]);
    }

    #[test]
    fn test_error_mapping() {
        let runner = Arc::new(
            ScriptedRunner::new().failing("xattr", "xattr: [Errno 1] Operation not permitted"),
        );
        let store = XattrCli::with_runner(runner);
        assert!(matches!(
            store.names(Path::new("/tmp/a")),
            Err(Error::PermissionDenied(_))
        ));

        let runner = Arc::new(ScriptedRunner::new().failing("xattr", "xattr: No such file: /tmp/a"));
        let store = XattrCli::with_runner(runner);
        assert!(store.names(Path::new("/tmp/a")).unwrap_err().is_not_found());

        let runner = Arc::new(ScriptedRunner::new().missing("xattr"));
        let store = XattrCli::with_runner(runner);
        assert!(store.names(Path::new("/tmp/a")).unwrap_err().is_tool_missing());
    }
}
