//! `yt-dlp` backed resolver.
//!
//! Downloads the best audio for a URL or the first search result and
//! converts it to mp3. Every resolution writes into its own directory under
//! the download directory, so two requests for the same video never share a
//! file. The exact output path is read back from the downloader
//! (`--print after_move:filepath`).

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use uuid::Uuid;

use super::{ArtifactResolver, ResolveError, ResolveResult, ResolveTarget};
use crate::artifact::Artifact;
use crate::protocol_constants::{ARTIFACT_EXTENSION, OUTPUT_TEMPLATE};

/// Settings for [`YtDlpResolver`].
#[derive(Debug, Clone)]
pub struct YtDlpConfig {
    /// Program to run (normally `yt-dlp`).
    pub program: String,
    /// Arguments placed before the generated ones (wrappers, extra flags).
    pub leading_args: Vec<String>,
    /// Directory that receives downloaded artifacts.
    pub download_dir: PathBuf,
    /// Explicit ffmpeg binary or directory, if not on `PATH`.
    pub ffmpeg_location: Option<PathBuf>,
}

/// Resolver that shells out to `yt-dlp`.
pub struct YtDlpResolver {
    config: YtDlpConfig,
}

impl YtDlpResolver {
    pub fn new(config: YtDlpConfig) -> Self {
        Self { config }
    }

    /// Builds the downloader argument list for a target written into `output_dir`.
    fn build_args(&self, target: &ResolveTarget, output_dir: &Path) -> Vec<String> {
        let mut args = self.config.leading_args.clone();
        args.extend(
            [
                "-x",
                "--audio-format",
                ARTIFACT_EXTENSION,
                "--no-playlist",
                "--no-progress",
                "--quiet",
                "--print",
                "after_move:filepath",
                "-o",
            ]
            .map(String::from),
        );
        args.push(output_dir.join(OUTPUT_TEMPLATE).to_string_lossy().into_owned());
        if let Some(ffmpeg) = &self.config.ffmpeg_location {
            args.push("--ffmpeg-location".to_string());
            args.push(ffmpeg.to_string_lossy().into_owned());
        }
        args.push(target.downloader_arg());
        args
    }
}

/// Extracts the produced file path from downloader stdout.
///
/// The downloader prints one path per finished item; the last non-empty
/// line wins.
fn parse_output_path(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(PathBuf::from)
}

/// Picks the most useful line out of downloader stderr.
fn last_error_line(stderr: &str) -> String {
    stderr
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .unwrap_or("downloader exited with an error")
        .to_string()
}

fn is_no_result_error(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    lower.contains("no video results")
        || lower.contains("video unavailable")
        || lower.contains("http error 404")
}

impl YtDlpResolver {
    /// Runs the downloader for one query and returns the produced file.
    async fn download(&self, query: &str, output_dir: &Path) -> ResolveResult<PathBuf> {
        let target = ResolveTarget::parse(query);
        let args = self.build_args(&target, output_dir);
        log::info!("[Resolver] Resolving {:?}", target);

        let output = Command::new(&self.config.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                ResolveError::failed(format!("cannot run {}: {e}", self.config.program))
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            log::warn!(
                "[Resolver] {} exited with {}: {}",
                self.config.program,
                output.status,
                stderr.trim()
            );
            let line = last_error_line(&stderr);
            return Err(if is_no_result_error(&stderr) {
                ResolveError::not_found(line)
            } else {
                ResolveError::failed(line)
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let Some(path) = parse_output_path(&stdout) else {
            return Err(ResolveError::not_found(format!("no result for \"{query}\"")));
        };

        if !Path::new(&path).is_file() {
            return Err(ResolveError::failed("no audio file produced"));
        }
        Ok(path)
    }
}

#[async_trait]
impl ArtifactResolver for YtDlpResolver {
    async fn resolve(&self, query: &str) -> ResolveResult<Artifact> {
        let output_dir = self.config.download_dir.join(Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|e| ResolveError::failed(format!("cannot create download dir: {e}")))?;

        match self.download(query, &output_dir).await {
            Ok(path) => {
                log::info!("[Resolver] Resolved to {}", path.display());
                Ok(Artifact::in_scratch_dir(path, output_dir))
            }
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_dir_all(&output_dir).await {
                    log::debug!(
                        "[Resolver] Could not remove {}: {}",
                        output_dir.display(),
                        rm
                    );
                }
                Err(e)
            }
        }
    }
}
