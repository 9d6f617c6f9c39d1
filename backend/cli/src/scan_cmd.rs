//! `cardscan scan <FILE>`: one-shot OCR without the HTTP server.

use std::path::Path;

use anyhow::{Context, Result};

use cardscan_config::AppConfig;
use cardscan_core::validate_upload;
use cardscan_understanding::DocumentPipeline;

pub async fn run(config: &AppConfig, file: &Path, pretty: bool) -> Result<()> {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    validate_upload(&name).with_context(|| format!("cannot scan {}", file.display()))?;

    let pipeline = DocumentPipeline::from_config(config);
    let fields = pipeline
        .process(file)
        .await
        .with_context(|| format!("OCR failed for {}", file.display()))?;

    let output = if pretty {
        serde_json::to_string_pretty(&fields)?
    } else {
        serde_json::to_string(&fields)?
    };
    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_unsupported_extension() {
        let err = run(&AppConfig::default(), Path::new("card.gif"), false)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("Invalid file type"));
    }

    #[tokio::test]
    async fn reports_unreadable_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.png");
        std::fs::write(&path, b"garbage").unwrap();

        let err = run(&AppConfig::default(), &path, false).await.unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read image"));
    }
}
