use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::engine::TesseractRecognizer;
use crate::config::AppConfig;
use crate::log;
use crate::paths::get_tesseract_dir;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";
const TRAINED_DATA: &str = "eng.traineddata";

const EXECUTABLE_NAME: &str = if cfg!(windows) {
    "tesseract.exe"
} else {
    "tesseract"
};

const COMMON_INSTALL_DIRS: [&str; 4] = [
    r"C:\Program Files\Tesseract-OCR",
    r"C:\Program Files (x86)\Tesseract-OCR",
    "/usr/share/tesseract-ocr/5",
    "/usr/share/tesseract-ocr/4.00",
];

fn responds_to_version(executable: &Path) -> bool {
    Command::new(executable)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Finds the Tesseract executable: configured path, local dir, PATH, then common installs.
pub fn find_tesseract_executable(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        log(&format!(
            "Configured tesseract_path {} does not exist, searching elsewhere",
            path.display()
        ));
    }

    let local_exe = get_tesseract_dir().join(EXECUTABLE_NAME);
    if local_exe.exists() {
        return Ok(local_exe);
    }

    let on_path = PathBuf::from("tesseract");
    if responds_to_version(&on_path) {
        return Ok(on_path);
    }

    for dir in &COMMON_INSTALL_DIRS {
        let p = PathBuf::from(dir).join(EXECUTABLE_NAME);
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!("Tesseract not found. Please install Tesseract-OCR."))
}

/// Finds a tessdata directory containing English data.
///
/// Returns `None` when only tesseract's compiled-in default location is left,
/// in which case no `--tessdata-dir` is passed.
pub fn find_tessdata_dir() -> Option<PathBuf> {
    let local_tessdata = get_tesseract_dir().join("tessdata");
    if local_tessdata.join(TRAINED_DATA).exists() {
        return Some(local_tessdata);
    }

    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let p = PathBuf::from(&prefix);
        if p.join(TRAINED_DATA).exists() {
            return Some(p);
        }
        let p = p.join("tessdata");
        if p.join(TRAINED_DATA).exists() {
            return Some(p);
        }
    }

    COMMON_INSTALL_DIRS
        .iter()
        .map(|dir| PathBuf::from(dir).join("tessdata"))
        .find(|p| p.join(TRAINED_DATA).exists())
}

/// Builds a recognizer from configuration. `threshold` overrides the configured one.
pub fn build_recognizer(config: &AppConfig, threshold: Option<u8>) -> Result<TesseractRecognizer> {
    let executable = find_tesseract_executable(config.tesseract_path.as_deref())?;
    let tessdata = find_tessdata_dir();
    log(&format!(
        "Using tesseract at {} (tessdata: {})",
        executable.display(),
        tessdata
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "default".to_string())
    ));

    Ok(TesseractRecognizer {
        executable,
        tessdata,
        threshold: threshold.unwrap_or(config.ocr_threshold),
        crop: config.crop,
    })
}

/// Ensures Tesseract is usable, downloading English trained data if no tessdata is found.
pub fn ensure_tesseract(config: &AppConfig) -> Result<TesseractRecognizer> {
    let executable = find_tesseract_executable(config.tesseract_path.as_deref())?;
    log(&format!("Tesseract found at: {}", executable.display()));

    if find_tessdata_dir().is_none() {
        let tessdata_dir = get_tesseract_dir().join("tessdata");
        fs::create_dir_all(&tessdata_dir)?;
        download_tessdata(&tessdata_dir)?;
    }

    build_recognizer(config, None)
}

/// Downloads English trained data
fn download_tessdata(tessdata_dir: &Path) -> Result<()> {
    let eng_url = format!("{}/{}", TESSDATA_REPO, TRAINED_DATA);
    let eng_path = tessdata_dir.join(TRAINED_DATA);

    log(&format!("Downloading {}...", TRAINED_DATA));

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&eng_url)
        .header("User-Agent", "guild-stats")
        .send()
        .context("Failed to request trained data")?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}: HTTP {}",
            TRAINED_DATA,
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let mut file = fs::File::create(&eng_path)?;
    file.write_all(&bytes)?;

    log(&format!("Downloaded {} ({} bytes)", TRAINED_DATA, bytes.len()));

    Ok(())
}
