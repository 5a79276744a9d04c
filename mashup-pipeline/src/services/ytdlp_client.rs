//! yt-dlp search and download backend
//!
//! Search runs `yt-dlp --dump-json --flat-playlist "ytsearchN:<query>"`,
//! which prints one JSON object per result line. Downloads write
//! `<raw_dir>/<id>.<ext>` using yt-dlp's own output template so the
//! identifier matches the search result id.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use mashup_common::config::{DownloadSettings, ToolPaths};
use serde::Deserialize;

use crate::error::BackendError;
use crate::models::SearchResult;
use crate::types::{DownloadBackend, SearchBackend};
use crate::utils::process::{args, run_tool};

const TOOL: &str = "yt-dlp";

/// One line of `--dump-json --flat-playlist` output
#[derive(Debug, Deserialize)]
struct FlatEntry {
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    webpage_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// yt-dlp subprocess client
#[derive(Debug, Clone)]
pub struct YtDlpClient {
    binary: PathBuf,
    settings: DownloadSettings,
}

impl YtDlpClient {
    pub fn new(tools: &ToolPaths, settings: DownloadSettings) -> Self {
        Self {
            binary: tools.yt_dlp.clone(),
            settings,
        }
    }

    pub fn search_args(query: &str, desired_count: usize) -> Vec<OsString> {
        args([
            "--dump-json".to_string(),
            "--flat-playlist".to_string(),
            "--no-warnings".to_string(),
            format!("ytsearch{}:{}", desired_count, query),
        ])
    }

    fn common_download_args(&self, raw_dir: &Path) -> Vec<OsString> {
        let mut list = args([
            "-f".to_string(),
            self.settings.format.clone(),
            "-o".to_string(),
        ]);
        list.push(raw_dir.join("%(id)s.%(ext)s").into_os_string());
        list.extend(args([
            "--no-playlist".to_string(),
            "--retries".to_string(),
            self.settings.retries.to_string(),
            "--socket-timeout".to_string(),
            self.settings.socket_timeout_secs.to_string(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
        ]));
        list
    }

    pub fn fetch_args(&self, url: &str, raw_dir: &Path) -> Vec<OsString> {
        let mut list = self.common_download_args(raw_dir);
        list.push(url.into());
        list
    }

    pub fn fetch_by_query_args(&self, query: &str, count: usize, raw_dir: &Path) -> Vec<OsString> {
        let mut list = self.common_download_args(raw_dir);
        list.push("--ignore-errors".into());
        list.push(format!("ytsearch{}:{}", count, query).into());
        list
    }
}

/// Parse `--dump-json` output, one JSON object per line
///
/// Lines that are not JSON objects or lack an id are skipped; output with no
/// usable line at all is a parse error.
pub fn parse_search_output(stdout: &str) -> Result<Vec<SearchResult>, BackendError> {
    let mut results = Vec::new();
    let mut bad_lines = 0usize;

    for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let entry: FlatEntry = match serde_json::from_str(line) {
            Ok(entry) => entry,
            Err(e) => {
                bad_lines += 1;
                tracing::debug!(error = %e, "Skipping unparsable search line");
                continue;
            }
        };

        let id = match entry.id.filter(|id| !id.trim().is_empty()) {
            Some(id) => id,
            None => {
                bad_lines += 1;
                continue;
            }
        };

        results.push(SearchResult {
            title: entry.title.unwrap_or_default(),
            duration_secs: entry.duration,
            webpage_url: entry.webpage_url,
            url: entry.url,
            id,
        });
    }

    if results.is_empty() && bad_lines > 0 {
        return Err(BackendError::Parse {
            tool: TOOL,
            reason: format!("{} lines, none usable", bad_lines),
        });
    }

    Ok(results)
}

impl SearchBackend for YtDlpClient {
    fn name(&self) -> &'static str {
        TOOL
    }

    fn search(&self, query: &str, desired_count: usize) -> Result<Vec<SearchResult>, BackendError> {
        tracing::info!(query, desired_count, "Searching");
        let stdout = run_tool(TOOL, &self.binary, &Self::search_args(query, desired_count), None)?;
        let results = parse_search_output(&String::from_utf8_lossy(&stdout))?;
        tracing::info!(query, results = results.len(), "Search complete");
        Ok(results)
    }
}

impl DownloadBackend for YtDlpClient {
    fn name(&self) -> &'static str {
        TOOL
    }

    fn fetch(&self, url: &str, raw_dir: &Path) -> Result<(), BackendError> {
        run_tool(TOOL, &self.binary, &self.fetch_args(url, raw_dir), None)?;
        Ok(())
    }

    fn fetch_by_query(
        &self,
        query: &str,
        count: usize,
        raw_dir: &Path,
    ) -> Result<(), BackendError> {
        run_tool(TOOL, &self.binary, &self.fetch_by_query_args(query, count, raw_dir), None)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> YtDlpClient {
        YtDlpClient::new(&ToolPaths::default(), DownloadSettings::default())
    }

    fn strings(list: &[OsString]) -> Vec<String> {
        list.iter().map(|s| s.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_parse_flat_playlist_lines() {
        let stdout = concat!(
            r#"{"id": "abc123", "title": "Live at X", "duration": 245.0, "#,
            r#""url": "https://www.youtube.com/watch?v=abc123"}"#,
            "\n",
            r#"{"id": "def456", "title": "Full concert", "duration": null, "#,
            r#""webpage_url": "https://www.youtube.com/watch?v=def456"}"#,
            "\n\n"
        );

        let results = parse_search_output(stdout).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "abc123");
        assert_eq!(results[0].duration_secs, Some(245.0));
        assert_eq!(results[0].playable_url(), Some("https://www.youtube.com/watch?v=abc123"));
        assert_eq!(results[1].duration_secs, None);
        assert_eq!(results[1].playable_url(), Some("https://www.youtube.com/watch?v=def456"));
    }

    #[test]
    fn test_parse_skips_entries_without_id() {
        let stdout = "{\"title\": \"no id\"}\n{\"id\": \"ok\"}\n";
        let results = parse_search_output(stdout).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "ok");
        assert_eq!(results[0].title, "");
    }

    #[test]
    fn test_parse_garbage_is_error() {
        let err = parse_search_output("ERROR: something\nnot json\n").unwrap_err();
        assert!(matches!(err, BackendError::Parse { .. }));
    }

    #[test]
    fn test_parse_empty_output_is_empty() {
        assert!(parse_search_output("").unwrap().is_empty());
    }

    #[test]
    fn test_search_args() {
        let list = strings(&YtDlpClient::search_args("Some Singer", 45));
        assert_eq!(list.last().unwrap(), "ytsearch45:Some Singer");
        assert!(list.contains(&"--flat-playlist".to_string()));
    }

    #[test]
    fn test_fetch_args_use_id_template() {
        let list = strings(
            &client().fetch_args("https://x/watch?v=1", Path::new("/work/downloads")),
        );
        assert_eq!(list[0], "-f");
        assert_eq!(list[1], "best[ext=mp4]/best");
        assert_eq!(list[3], "/work/downloads/%(id)s.%(ext)s");
        assert!(list.windows(2).any(|w| w[0] == "--retries" && w[1] == "3"));
        assert!(list.windows(2).any(|w| w[0] == "--socket-timeout" && w[1] == "10"));
        assert_eq!(list.last().unwrap(), "https://x/watch?v=1");
    }

    #[test]
    fn test_fetch_by_query_args_ignore_errors() {
        let list = strings(&client().fetch_by_query_args("Singer", 15, Path::new("dl")));
        assert!(list.contains(&"--ignore-errors".to_string()));
        assert_eq!(list.last().unwrap(), "ytsearch15:Singer");
    }
}
