use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

pub struct FileReader;

impl FileReader {
    /// Read a UTF-8 text file, returning `None` when it does not exist.
    pub async fn read_optional(path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context(format!("Failed to read file: {:?}", path)),
        }
    }

    /// Overwrite `path` with `content`, creating parent directories as needed.
    pub async fn write(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .context(format!("Failed to create directory: {:?}", parent))?;
        }
        fs::write(path, content)
            .await
            .context(format!("Failed to write file: {:?}", path))
    }
}

/// Parse a comma-separated target list into trimmed, non-empty names.
pub fn parse_targets(content: &str) -> Vec<String> {
    content
        .trim()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
