use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

pub async fn read_text_file(path: &Path) -> Result<String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    match extension {
        "txt" | "md" => {
            let content = fs::read_to_string(path)
                .await
                .context(format!("Failed to read file: {:?}", path))?;
            Ok(content)
        }
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    }
}
