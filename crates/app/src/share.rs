use std::path::PathBuf;

use anchorfield_core::{Result, ShareOutcome, ShareRequest, ShareSink};

/// Saves each shared snapshot as a JPEG file. Without a directory the
/// dialog is simply dismissed.
#[derive(Debug)]
pub struct DirectoryShareSink {
    dir: Option<PathBuf>,
    saved: usize,
}

impl DirectoryShareSink {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir, saved: 0 }
    }
}

impl ShareSink for DirectoryShareSink {
    fn share(&mut self, request: &ShareRequest) -> Result<ShareOutcome> {
        let Some(dir) = &self.dir else {
            tracing::info!(
                title = %request.labels.share_title,
                data_url_len = request.snapshot.data_url().len(),
                "no snapshot directory configured; closing share dialog"
            );
            return Ok(ShareOutcome::Closed);
        };

        std::fs::create_dir_all(dir)?;
        self.saved += 1;
        let path = dir.join(format!(
            "{}-{}.jpg",
            request.labels.file_name_prepend, self.saved
        ));
        std::fs::write(&path, &request.snapshot.jpeg)?;
        tracing::info!(path = %path.display(), "snapshot saved");
        Ok(ShareOutcome::Saved)
    }
}
