use clap::Args;
use scry_core::{MaskingLevel, RecorderSettings};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Args)]
pub struct CheckConfigCommand {
    /// Settings document (JSON, partial documents are merged over defaults)
    pub file: Option<PathBuf>,

    /// Override the masking level from the document
    #[arg(long, env = "SCRY_MASKING_LEVEL")]
    pub masking_level: Option<String>,

    /// Fail on out-of-range values instead of replacing them with defaults
    #[arg(long)]
    pub strict: bool,
}

impl CheckConfigCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let settings = load_settings(self.file.as_deref(), self.masking_level.as_deref(), self.strict)?;
        println!("{}", serde_json::to_string_pretty(&settings)?);
        Ok(())
    }
}

/// Settings from `file` (or defaults), with the masking level override
/// applied.
pub fn load_settings(
    file: Option<&Path>,
    masking_level: Option<&str>,
    strict: bool,
) -> anyhow::Result<RecorderSettings> {
    let mut settings = match file {
        Some(path) => {
            debug!("Reading settings from {}", path.display());
            let contents = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
            serde_json::from_str::<RecorderSettings>(&contents)
                .map_err(|e| anyhow::anyhow!("Invalid settings in {}: {}", path.display(), e))?
        }
        None => RecorderSettings::default(),
    };

    if let Some(level) = masking_level {
        // Parsing never fails; unknown levels mask everything
        let parsed: MaskingLevel = level.parse().unwrap_or_default();
        info!("Masking level overridden to {}", parsed.as_str());
        settings.masking_level = parsed;
    }

    if strict {
        settings.validate()?;
        Ok(settings)
    } else {
        Ok(settings.normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn settings_file(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "scry-settings-{}-{}.json",
            std::process::id(),
            contents.len()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_partial_document_merges_over_defaults() {
        let path = settings_file(r#"{"networkRecording": {"enabled": true, "excludeDomains": ["cdn.test"]}}"#);

        let settings = load_settings(Some(&path), None, true).unwrap();

        assert_eq!(settings.masking_level, MaskingLevel::All);
        assert!(settings.network_recording.enabled);
        assert_eq!(settings.network_recording.exclude_domains, vec!["cdn.test"]);
        assert!(settings.network_recording.capture_headers);
        assert!(settings.console_recording.enabled);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_masking_level_override() {
        let settings = load_settings(None, Some("input-and-textarea"), false).unwrap();
        assert_eq!(settings.masking_level, MaskingLevel::InputAndTextarea);

        let settings = load_settings(None, Some("bogus"), false).unwrap();
        assert_eq!(settings.masking_level, MaskingLevel::Unrecognized);
    }

    #[test]
    fn test_strict_rejects_zero_interval() {
        let path = settings_file(r#"{"flushIntervalMs": 0}"#);

        assert!(load_settings(Some(&path), None, true).is_err());
        let settings = load_settings(Some(&path), None, false).unwrap();
        assert_eq!(settings.flush_interval_ms, 2_000);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load_settings(Some(Path::new("/nonexistent/scry.json")), None, false).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
