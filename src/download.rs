use crate::config::{DBLP_DTD_FILENAME, DBLP_DTD_URL, DBLP_XML_FILENAME, DBLP_XML_URL};
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Local paths of the two files a run needs.
#[derive(Debug, Clone)]
pub struct DblpFiles {
    pub xml: PathBuf,
    pub dtd: PathBuf,
}

impl DblpFiles {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            xml: dir.join(DBLP_XML_FILENAME),
            dtd: dir.join(DBLP_DTD_FILENAME),
        }
    }

    /// Deletes downloaded files; a file that is already gone is not an error.
    pub fn remove(&self) -> Result<()> {
        for path in [&self.xml, &self.dtd] {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    warn!(path = ?path, "Downloaded file already removed");
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to remove: {:?}", path));
                }
            }
        }
        info!("Removed DBLP xml files");
        Ok(())
    }
}

fn progress_bar(len: Option<u64>, name: &str) -> ProgressBar {
    let pb = match len {
        Some(len) => ProgressBar::new(len),
        None => ProgressBar::new_spinner(),
    };
    if let Ok(style) =
        ProgressStyle::with_template("{msg} [{bar:40}] {bytes}/{total_bytes} ({bytes_per_sec})")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_message(name.to_string());
    pb
}

/// Streams `url` into `dest` through a temporary sibling file.
pub fn download_file(client: &reqwest::blocking::Client, url: &str, dest: &Path) -> Result<()> {
    info!(url, dest = ?dest, "Downloading");

    let response = client
        .get(url)
        .send()
        .with_context(|| format!("Request failed: {}", url))?;

    if !response.status().is_success() {
        bail!("HTTP request for {} failed with status: {}", url, response.status());
    }

    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let pb = progress_bar(response.content_length(), &name);

    let tmp_path = dest.with_extension("part");
    let file = File::create(&tmp_path)
        .with_context(|| format!("Failed to create: {:?}", tmp_path))?;
    let mut writer = BufWriter::with_capacity(256 * 1024, file);
    let mut reader = pb.wrap_read(response);

    io::copy(&mut reader, &mut writer).with_context(|| format!("Download of {} failed", url))?;
    writer
        .into_inner()
        .map_err(|e| e.into_error())
        .and_then(|f| f.sync_all())
        .with_context(|| format!("Failed to flush: {:?}", tmp_path))?;
    pb.finish_and_clear();

    fs::rename(&tmp_path, dest)
        .with_context(|| format!("Failed to rename {:?} to {:?}", tmp_path, dest))?;
    Ok(())
}

/// Fetches the compressed dump and its DTD into `dir`.
pub fn download_dblp(dir: &Path) -> Result<DblpFiles> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create directory: {:?}", dir))?;

    let files = DblpFiles::in_dir(dir);
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(None::<Duration>)
        .build()
        .context("Failed to build HTTP client")?;

    download_file(&client, DBLP_XML_URL, &files.xml)?;
    download_file(&client, DBLP_DTD_URL, &files.dtd)?;
    Ok(files)
}
