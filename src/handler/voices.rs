use std::path::{Path, PathBuf};

use serde::Serialize;

use super::config::WorkerConfig;

/// How a requested voice was satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceResolution {
    /// Empty name or a reserved default: use the model's built-in voice.
    Builtin,
    /// A reference clip was found in the voices directory.
    Reference(PathBuf),
    /// A named voice with no clip on disk; degraded to the built-in voice.
    Fallback,
}

impl VoiceResolution {
    /// Reference clip to hand to the model, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Reference(path) => Some(path),
            Self::Builtin | Self::Fallback => None,
        }
    }

    pub fn source(&self) -> VoiceSource {
        match self {
            Self::Builtin => VoiceSource::Builtin,
            Self::Reference(_) => VoiceSource::Reference,
            Self::Fallback => VoiceSource::Fallback,
        }
    }
}

/// Wire form of [`VoiceResolution`], reported as `voice_source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceSource {
    Builtin,
    Reference,
    Fallback,
}

/// Maps voice names to reference clips in a read-only directory.
///
/// Lookups are plain existence checks; nothing is cached, so clips added to
/// the directory are picked up by the next request.
#[derive(Debug, Clone)]
pub struct VoiceResolver {
    voices_dir: PathBuf,
    extensions: Vec<String>,
    default_voices: Vec<String>,
}

impl VoiceResolver {
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            voices_dir: config.voices_dir.clone(),
            extensions: config.voice_extensions.clone(),
            default_voices: config.default_voices.clone(),
        }
    }

    /// Resolve `voice` to a reference clip, probing extensions in priority order.
    ///
    /// Never fails: an unknown voice degrades to the built-in one.
    pub fn resolve(&self, voice: &str) -> VoiceResolution {
        if voice.is_empty() || self.default_voices.iter().any(|d| d == voice) {
            return VoiceResolution::Builtin;
        }

        // Voice names are file stems, never paths.
        if voice.contains(&['/', '\\'][..]) || voice.contains("..") {
            log::warn!("Voice name {voice:?} is not a plain file stem, using default voice");
            return VoiceResolution::Fallback;
        }

        for ext in &self.extensions {
            let path = self.voices_dir.join(format!("{voice}.{ext}"));
            if path.is_file() {
                log::debug!("Voice '{voice}' resolved to {}", path.display());
                return VoiceResolution::Reference(path);
            }
        }

        log::warn!(
            "Voice '{voice}' not found in {}, using default voice",
            self.voices_dir.display()
        );
        VoiceResolution::Fallback
    }

    pub fn voices_dir(&self) -> &Path {
        &self.voices_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::config::WorkerConfigBuilder;
    use std::fs;

    fn resolver(dir: &Path) -> VoiceResolver {
        let config = WorkerConfigBuilder::default()
            .voices_dir(dir)
            .build()
            .unwrap();
        VoiceResolver::new(&config)
    }

    #[test]
    fn sentinels_and_empty_use_builtin_voice() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("narrator.wav"), b"RIFF").unwrap();
        let resolver = resolver(dir.path());

        assert_eq!(resolver.resolve(""), VoiceResolution::Builtin);
        assert_eq!(resolver.resolve("default"), VoiceResolution::Builtin);
        // a clip named after a sentinel is never used
        assert_eq!(resolver.resolve("narrator"), VoiceResolution::Builtin);
    }

    #[test]
    fn extension_priority_is_wav_mp3_flac() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(dir.path());
        for ext in ["flac", "mp3", "wav"] {
            fs::write(dir.path().join(format!("alice.{ext}")), b"clip").unwrap();
        }

        assert_eq!(
            resolver.resolve("alice"),
            VoiceResolution::Reference(dir.path().join("alice.wav"))
        );

        fs::remove_file(dir.path().join("alice.wav")).unwrap();
        assert_eq!(
            resolver.resolve("alice"),
            VoiceResolution::Reference(dir.path().join("alice.mp3"))
        );

        fs::remove_file(dir.path().join("alice.mp3")).unwrap();
        let flac = resolver.resolve("alice");
        assert_eq!(flac.path(), Some(dir.path().join("alice.flac").as_path()));
        assert_eq!(flac.source(), VoiceSource::Reference);
    }

    #[test]
    fn unknown_voice_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(dir.path());

        let resolution = resolver.resolve("nobody");
        assert_eq!(resolution, VoiceResolution::Fallback);
        assert_eq!(resolution.path(), None);
        assert_eq!(resolution.source(), VoiceSource::Fallback);
    }

    #[test]
    fn missing_voices_dir_falls_back() {
        let resolver = resolver(Path::new("/nonexistent/voices/dir"));
        assert_eq!(resolver.resolve("alice"), VoiceResolution::Fallback);
    }

    #[test]
    fn path_like_names_never_touch_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let voices = dir.path().join("voices");
        fs::create_dir(&voices).unwrap();
        fs::write(dir.path().join("secret.wav"), b"clip").unwrap();
        let resolver = resolver(&voices);

        assert_eq!(resolver.resolve("../secret"), VoiceResolution::Fallback);
        assert_eq!(resolver.resolve("a/b"), VoiceResolution::Fallback);
    }
}
