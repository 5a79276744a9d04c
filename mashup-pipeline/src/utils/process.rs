//! External tool invocation
//!
//! Backends shell out to yt-dlp, ffmpeg and ffprobe. This module owns the
//! spawn / wait / status check so that "binary not installed" is reported
//! the same way everywhere.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{BackendError, CodecError};

/// Longest stderr tail kept in error messages
const STDERR_EXCERPT_CHARS: usize = 600;

/// Tool invocation failure, before it is mapped onto a backend error type
#[derive(Debug)]
pub enum ToolError {
    /// Binary could not be spawned because it does not exist
    Missing { tool: &'static str, path: PathBuf },
    /// Spawn or pipe I/O failed for another reason
    Io(io::Error),
    /// Process ran and exited unsuccessfully
    Failed {
        tool: &'static str,
        status: Option<i32>,
        stderr: String,
    },
}

impl ToolError {
    /// Map onto [`CodecError`] for the file being processed
    pub fn into_codec_error(self, path: &Path) -> CodecError {
        match self {
            ToolError::Missing { tool, path } => CodecError::ToolMissing { tool, path },
            ToolError::Io(e) => CodecError::Io(e),
            ToolError::Failed { tool, status, stderr } => CodecError::Encode {
                path: path.to_path_buf(),
                reason: format!("{} exited with {:?}: {}", tool, status, stderr),
            },
        }
    }
}

impl From<ToolError> for BackendError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::Missing { tool, path } => BackendError::ToolMissing { tool, path },
            ToolError::Io(e) => BackendError::Io(e),
            ToolError::Failed { tool, status, stderr } => {
                BackendError::CommandFailed { tool, status, stderr }
            }
        }
    }
}

/// Run `program` to completion and return its stdout
///
/// `stdin`, when given, is streamed to the child on a separate thread while
/// its output is collected, so large inputs cannot deadlock on full pipes.
pub fn run_tool(
    tool: &'static str,
    program: &Path,
    args: &[OsString],
    stdin: Option<&[u8]>,
) -> Result<Vec<u8>, ToolError> {
    tracing::debug!(tool, program = %program.display(), args = ?args, "Running external tool");

    let mut command = Command::new(program);
    command
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

    let mut child = command.spawn().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            ToolError::Missing {
                tool,
                path: program.to_path_buf(),
            }
        } else {
            ToolError::Io(e)
        }
    })?;

    let output = match (stdin, child.stdin.take()) {
        (Some(input), Some(mut pipe)) => std::thread::scope(|scope| {
            let writer = scope.spawn(move || {
                let result = pipe.write_all(input);
                drop(pipe);
                result
            });
            let output = child.wait_with_output();
            let written = writer.join().unwrap_or_else(|_| {
                Err(io::Error::new(io::ErrorKind::Other, "stdin writer panicked"))
            });
            (output, written)
        }),
        _ => (child.wait_with_output(), Ok(())),
    };

    let (output, written) = output;
    let output = output.map_err(ToolError::Io)?;

    if !output.status.success() {
        return Err(ToolError::Failed {
            tool,
            status: output.status.code(),
            stderr: stderr_excerpt(&output.stderr),
        });
    }

    // A clean exit after a broken stdin pipe means the tool stopped reading early
    if let Err(e) = written {
        if e.kind() != io::ErrorKind::BrokenPipe {
            return Err(ToolError::Io(e));
        }
    }

    Ok(output.stdout)
}

/// Trimmed tail of a tool's stderr
pub fn stderr_excerpt(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let count = text.chars().count();
    if count <= STDERR_EXCERPT_CHARS {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - STDERR_EXCERPT_CHARS).collect();
    format!("...{}", tail)
}

/// Build an argument list from mixed string and path pieces
pub fn args<I, S>(items: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    items.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_reported_as_missing() {
        let program = Path::new("/nonexistent/definitely-not-a-tool");
        let err = run_tool("yt-dlp", program, &[], None).unwrap_err();
        match err {
            ToolError::Missing { tool, path } => {
                assert_eq!(tool, "yt-dlp");
                assert_eq!(path, program);
            }
            other => panic!("expected Missing, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_maps_to_systemic_errors() {
        let backend: BackendError = ToolError::Missing {
            tool: "yt-dlp",
            path: PathBuf::from("yt-dlp"),
        }
        .into();
        assert!(!backend.is_item_failure());

        let codec = ToolError::Missing {
            tool: "ffmpeg",
            path: PathBuf::from("ffmpeg"),
        }
        .into_codec_error(Path::new("a.mp3"));
        assert!(!codec.is_item_failure());
    }

    #[test]
    fn test_failed_maps_to_item_failure() {
        let backend: BackendError = ToolError::Failed {
            tool: "yt-dlp",
            status: Some(1),
            stderr: "ERROR: Video unavailable".to_string(),
        }
        .into();
        assert!(backend.is_item_failure());
        assert!(backend.to_string().contains("Video unavailable"));
    }

    #[test]
    fn test_stderr_excerpt_keeps_tail() {
        let long = format!("{}END", "x".repeat(2000));
        let excerpt = stderr_excerpt(long.as_bytes());
        assert!(excerpt.starts_with("..."));
        assert!(excerpt.ends_with("END"));
        assert_eq!(excerpt.chars().count(), STDERR_EXCERPT_CHARS + 3);

        assert_eq!(stderr_excerpt(b"  short \n"), "short");
    }
}
