//! CLI Doctor Command
//!
//! Checks that the configuration is valid, tesseract is runnable with the
//! configured language, and the upload directory is writable.

use std::path::Path;

use anyhow::{bail, Result};

use cardscan_config::{validate, AppConfig};
use cardscan_understanding::TesseractRecognizer;

/// Executes the full doctor diagnosis.
pub async fn run(config: &AppConfig) -> Result<()> {
    println!("\n🔍 Running CardScan Doctor...\n");

    let config_ok = check_config(config);
    let tesseract_ok = check_tesseract(&TesseractRecognizer::new(&config.ocr)).await;
    let uploads_ok = check_upload_dir(&config.server.upload_dir).await;

    println!();
    if config_ok && tesseract_ok && uploads_ok {
        println!("✅ All checks passed! CardScan is ready.");
        Ok(())
    } else {
        println!("❌ Some checks failed! Please fix the errors above.");
        bail!("doctor found problems")
    }
}

fn check_config(config: &AppConfig) -> bool {
    println!("Checking Configuration:");
    let report = validate(config);
    for warning in &report.warnings {
        println!("  🟡 {warning}");
    }
    for error in &report.errors {
        println!("  🔴 {error}");
    }
    if report.is_valid() {
        println!("  🟢 Configuration is valid");
    }
    report.is_valid()
}

async fn check_tesseract(recognizer: &TesseractRecognizer) -> bool {
    println!("Checking Tesseract:");
    let languages = match recognizer.languages().await {
        Ok(languages) => languages,
        Err(e) => {
            println!("  🔴 {e}");
            return false;
        }
    };
    println!("  🟢 tesseract is runnable");

    let wanted = recognizer.language();
    // A language setting may combine several packs, e.g. `ara+eng`.
    let missing: Vec<&str> = wanted
        .split('+')
        .filter(|lang| !languages.iter().any(|l| l == *lang))
        .collect();
    if missing.is_empty() {
        println!("  🟢 language data for {wanted} is installed");
        true
    } else {
        println!("  🔴 missing language data: {}", missing.join(", "));
        false
    }
}

async fn check_upload_dir(dir: &Path) -> bool {
    println!("Checking Upload Directory:");
    let probe = dir.join(".cardscan-doctor");
    let result = async {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&probe, b"ok").await?;
        tokio::fs::remove_file(&probe).await
    }
    .await;

    match result {
        Ok(()) => {
            println!("  🟢 {} is writable", dir.display());
            true
        }
        Err(e) => {
            println!("  🔴 {} is not writable: {e}", dir.display());
            false
        }
    }
}
