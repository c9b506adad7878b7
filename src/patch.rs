//! Share-script patcher.
//!
//! Rewrites the quoted value of `var jsapi_ticket = '...';` inside a static
//! script so client-side signing picks up the fresh ticket without a build step.
//!
//! - Textual substitution only; the script is never parsed.
//! - The file is replaced atomically: the new content goes to a temp file in the
//!   same directory, which is then renamed over the target. Symlinks are resolved
//!   first, so a linked script keeps its link. A failed write leaves
//!   the original untouched and the temp file removed.
//! - No backup is kept.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::string::FromUtf8Error;

use regex::{NoExpand, Regex};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Variable name used by the share script
pub const DEFAULT_VARIABLE: &str = "jsapi_ticket";

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{} is not valid UTF-8: {source}", path.display())]
    Encoding {
        path: PathBuf,
        #[source]
        source: FromUtf8Error,
    },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("ticket cannot be embedded in a single-quoted literal: {0:?}")]
    InvalidTicket(String),

    #[error("invalid variable pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result of a patch attempt that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// File rewritten
    Updated { replacements: usize },
    /// Assignment found, value already equal to the ticket; nothing written
    AlreadyCurrent,
    /// No assignment found; nothing written
    NoMatch,
}

impl PatchOutcome {
    /// Whether the assignment line was found
    pub fn matched(&self) -> bool {
        !matches!(self, PatchOutcome::NoMatch)
    }
}

/// Patches one variable assignment in one file
#[derive(Debug, Clone)]
pub struct AssetPatcher {
    path: PathBuf,
    variable: String,
    pattern: Regex,
}

impl AssetPatcher {
    /// Patcher for `var <variable> = '...';` in `path`
    pub fn new(path: impl Into<PathBuf>, variable: &str) -> Result<Self, PatchError> {
        let pattern = Regex::new(&format!(r"var {} = '[^']*';", regex::escape(variable)))?;
        Ok(Self {
            path: path.into(),
            variable: variable.to_string(),
            pattern,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace every matching assignment's value with `ticket`.
    #[instrument(level = "debug", skip(self, ticket), fields(path = %self.path.display()))]
    pub fn patch(&self, ticket: &str) -> Result<PatchOutcome, PatchError> {
        if ticket.contains(['\'', '\\', '\n', '\r']) {
            return Err(PatchError::InvalidTicket(ticket.to_string()));
        }

        let content = self.read()?;
        let replacements = self.pattern.find_iter(&content).count();
        if replacements == 0 {
            warn!(
                "no `var {} = '...';` line found in {}",
                self.variable,
                self.path.display()
            );
            return Ok(PatchOutcome::NoMatch);
        }
        if replacements > 1 {
            warn!(replacements, "assignment appears more than once; replacing all");
        }

        let line = format!("var {} = '{}';", self.variable, ticket);
        let patched = self.pattern.replace_all(&content, NoExpand(&line));
        if patched == content {
            debug!("ticket already current; leaving file untouched");
            return Ok(PatchOutcome::AlreadyCurrent);
        }

        write_atomic(&self.path, patched.as_bytes())?;
        info!("updated {} in {}", self.variable, self.path.display());
        Ok(PatchOutcome::Updated { replacements })
    }

    fn read(&self) -> Result<String, PatchError> {
        let bytes = fs::read(&self.path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                PatchError::NotFound(self.path.clone())
            } else {
                PatchError::Io {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;
        String::from_utf8(bytes).map_err(|source| PatchError::Encoding {
            path: self.path.clone(),
            source,
        })
    }
}

/// Patch `var jsapi_ticket = '...';` in `path`
pub fn patch_ticket_in_file(
    path: impl Into<PathBuf>,
    ticket: &str,
) -> Result<PatchOutcome, PatchError> {
    AssetPatcher::new(path, DEFAULT_VARIABLE)?.patch(ticket)
}

/// Write `contents` to a sibling temp file, then rename it over `path`
fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), PatchError> {
    let io_err = |source: io::Error| PatchError::Io {
        path: path.to_path_buf(),
        source,
    };
    // a symlinked script is updated at its destination; the link stays a link
    let target = fs::canonicalize(path).map_err(io_err)?;
    let dir = target.parent().unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(contents).map_err(io_err)?;
    // keep the original mode; a fresh temp file is 0600
    let meta = fs::metadata(&target).map_err(io_err)?;
    tmp.as_file()
        .set_permissions(meta.permissions())
        .map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(&target).map_err(|e| io_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SCRIPT: &str = "var jsapi_ticket = 'OLD';\nvar share_url = window.location.href.split('#')[0];\n\nwx.config(config_data);\n";

    fn write_script(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("wx-share.js");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn replaces_ticket_and_keeps_everything_else() {
        let dir = TempDir::new().unwrap();
        let path = write_script(&dir, SCRIPT);

        let outcome = patch_ticket_in_file(&path, "NEW123").unwrap();

        assert_eq!(outcome, PatchOutcome::Updated { replacements: 1 });
        assert!(outcome.matched());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            SCRIPT.replace("'OLD'", "'NEW123'")
        );
    }

    #[test]
    fn missing_line_is_non_fatal_and_leaves_file() {
        let dir = TempDir::new().unwrap();
        let content = "let jsapi_ticket = \"OLD\";\n";
        let path = write_script(&dir, content);

        let outcome = patch_ticket_in_file(&path, "NEW123").unwrap();

        assert_eq!(outcome, PatchOutcome::NoMatch);
        assert!(!outcome.matched());
        assert_eq!(fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn second_run_with_same_ticket_is_already_current() {
        let dir = TempDir::new().unwrap();
        let path = write_script(&dir, SCRIPT);

        patch_ticket_in_file(&path, "NEW123").unwrap();
        let after_first = fs::read(&path).unwrap();
        let outcome = patch_ticket_in_file(&path, "NEW123").unwrap();

        assert_eq!(outcome, PatchOutcome::AlreadyCurrent);
        assert!(outcome.matched());
        assert_eq!(fs::read(&path).unwrap(), after_first);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = patch_ticket_in_file(dir.path().join("absent.js"), "NEW123").unwrap_err();
        assert!(matches!(err, PatchError::NotFound(_)));
    }

    #[test]
    fn invalid_utf8_is_encoding_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wx-share.js");
        fs::write(&path, [0x76, 0x61, 0x72, 0xff, 0xfe]).unwrap();

        let err = patch_ticket_in_file(&path, "NEW123").unwrap_err();
        assert!(matches!(err, PatchError::Encoding { .. }));
    }

    #[test]
    fn dollar_signs_are_literal() {
        let dir = TempDir::new().unwrap();
        let path = write_script(&dir, SCRIPT);

        patch_ticket_in_file(&path, "a$1b${0}").unwrap();

        assert!(
            fs::read_to_string(&path)
                .unwrap()
                .starts_with("var jsapi_ticket = 'a$1b${0}';")
        );
    }

    #[test]
    fn quote_in_ticket_is_rejected_before_touching_file() {
        let dir = TempDir::new().unwrap();
        let path = write_script(&dir, SCRIPT);

        let err = patch_ticket_in_file(&path, "x';alert(1);'").unwrap_err();

        assert!(matches!(err, PatchError::InvalidTicket(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), SCRIPT);
    }

    #[test]
    fn custom_variable_name() {
        let dir = TempDir::new().unwrap();
        let path = write_script(&dir, "var card_ticket = 'C0';\nvar jsapi_ticket = 'J0';\n");

        let patcher = AssetPatcher::new(&path, "card_ticket").unwrap();
        let outcome = patcher.patch("C1").unwrap();

        assert_eq!(outcome, PatchOutcome::Updated { replacements: 1 });
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "var card_ticket = 'C1';\nvar jsapi_ticket = 'J0';\n"
        );
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let path = write_script(&dir, SCRIPT);

        patch_ticket_in_file(&path, "NEW123").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn writes_through_symlink() {
        let dir = TempDir::new().unwrap();
        let real = write_script(&dir, SCRIPT);
        let link = dir.path().join("linked.js");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let outcome = patch_ticket_in_file(&link, "NEW123").unwrap();

        assert_eq!(outcome, PatchOutcome::Updated { replacements: 1 });
        assert!(
            fs::symlink_metadata(&link)
                .unwrap()
                .file_type()
                .is_symlink()
        );
        assert_eq!(
            fs::read_to_string(&real).unwrap(),
            SCRIPT.replace("'OLD'", "'NEW123'")
        );
    }

    #[cfg(unix)]
    #[test]
    fn keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = write_script(&dir, SCRIPT);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        patch_ticket_in_file(&path, "NEW123").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }
}
