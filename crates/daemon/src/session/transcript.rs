// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session append-only transcript log: every command-interpreter
//! invocation is appended as `(lldb) <cmd>\n<stdout><stderr>` and also
//! surfaced as a `transcript` event so `pollEvents` callers see it live.

use std::path::PathBuf;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

pub struct TranscriptLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl TranscriptLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path, write_lock: Mutex::new(()) }
    }

    /// Appends one command's transcript line, returning the exact text
    /// written so the caller can also enqueue it as a `transcript` event.
    pub async fn append(&self, command: &str, stdout: &str, stderr: &str) -> std::io::Result<String> {
        let mut text = format!("(lldb) {command}\n");
        text.push_str(stdout);
        text.push_str(stderr);
        if !text.ends_with('\n') {
            text.push('\n');
        }

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path).await?;
        file.write_all(text.as_bytes()).await?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_formatted_command_line() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join("transcript.log");
        let log = TranscriptLog::new(path.clone());
        let text = log.append("process continue", "Resuming process.\n", "").await.expect("append");
        assert_eq!(text, "(lldb) process continue\nResuming process.\n");

        let on_disk = tokio::fs::read_to_string(&path).await.expect("read");
        assert_eq!(on_disk, text);
    }

    #[tokio::test]
    async fn appends_accumulate_across_calls() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join("transcript.log");
        let log = TranscriptLog::new(path.clone());
        log.append("a", "1\n", "").await.expect("append a");
        log.append("b", "2\n", "").await.expect("append b");
        let on_disk = tokio::fs::read_to_string(&path).await.expect("read");
        assert_eq!(on_disk, "(lldb) a\n1\n(lldb) b\n2\n");
    }
}
