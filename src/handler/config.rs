use std::path::PathBuf;

use derive_builder::Builder;

/// Worker configuration.
///
/// `Default` matches the production deployment: voices mounted at `/voices`,
/// text capped at 4000 characters, and the model's own parameter defaults.
/// Use [`WorkerConfigBuilder`] to override individual fields.
#[derive(Debug, Clone, Builder)]
#[builder(default)]
pub struct WorkerConfig {
    /// Directory holding reference clips named `{voice}.{ext}`.
    #[builder(setter(into))]
    pub voices_dir: PathBuf,
    /// Extensions tried for a voice, in priority order.
    #[builder(setter(into))]
    pub voice_extensions: Vec<String>,
    /// Voice names that always select the built-in voice.
    #[builder(setter(into))]
    pub default_voices: Vec<String>,
    /// Voice reported when a request doesn't name one.
    #[builder(setter(into))]
    pub default_voice: String,
    /// Longer text is truncated to this many characters before synthesis.
    pub max_text_length: usize,
    pub default_exaggeration: f32,
    pub default_cfg_weight: f32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            voices_dir: PathBuf::from("/voices"),
            voice_extensions: vec!["wav".into(), "mp3".into(), "flac".into()],
            default_voices: vec!["default".into(), "narrator".into()],
            default_voice: "narrator".to_string(),
            max_text_length: 4000,
            default_exaggeration: 0.6,
            default_cfg_weight: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_only_named_fields() {
        let config = WorkerConfigBuilder::default()
            .voices_dir("/tmp/voices")
            .max_text_length(10usize)
            .build()
            .unwrap();

        assert_eq!(config.voices_dir, PathBuf::from("/tmp/voices"));
        assert_eq!(config.max_text_length, 10);
        assert_eq!(config.default_voice, "narrator");
        assert_eq!(config.voice_extensions, vec!["wav", "mp3", "flac"]);
        assert_eq!(config.default_exaggeration, 0.6);
        assert_eq!(config.default_cfg_weight, 0.5);
    }
}
