//! File-backed catalog of narrated story sections.

use crate::playback::AudioInfo;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationPart {
    pub url: String,
    pub duration_secs: f64,
}

/// One section of a story, optionally narrated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationSection {
    pub story_id: Option<i64>,
    pub story_title: String,
    pub section_name: String,
    #[serde(default)]
    pub audio_available: bool,
    #[serde(default)]
    pub parts: Vec<NarrationPart>,
}

impl NarrationSection {
    pub fn has_audio(&self) -> bool {
        self.audio_available && !self.parts.is_empty()
    }

    pub fn total_duration(&self) -> f64 {
        self.parts.iter().map(|p| p.duration_secs).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NarrationCatalog {
    pub sections: Vec<NarrationSection>,
}

impl NarrationCatalog {
    pub fn new(sections: Vec<NarrationSection>) -> Self {
        Self { sections }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&contents)?;
        info!(
            "Loaded {} narration sections from {}",
            catalog.sections.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn section(&self, story_id: Option<i64>, section_name: &str) -> Option<&NarrationSection> {
        self.sections
            .iter()
            .find(|s| s.story_id == story_id && s.section_name == section_name)
    }

    /// Playback description for a section, if it has narration
    pub fn audio_info(&self, story_id: Option<i64>, section_name: &str) -> Option<AudioInfo> {
        let section = self.section(story_id, section_name)?;
        if !section.has_audio() {
            return None;
        }

        Some(AudioInfo {
            section_name: section.section_name.clone(),
            story_id: section.story_id,
            story_title: section.story_title.clone(),
            audio_sources: section.parts.iter().map(|p| p.url.clone()).collect(),
            part_durations: section.parts.iter().map(|p| p.duration_secs).collect(),
        })
    }

    /// Sections of one story, in file order
    pub fn sections_for_story(&self, story_id: Option<i64>) -> Vec<&NarrationSection> {
        self.sections
            .iter()
            .filter(|s| s.story_id == story_id)
            .collect()
    }

    /// Distinct stories, in order of first appearance
    pub fn stories(&self) -> Vec<(Option<i64>, String)> {
        let mut stories: Vec<(Option<i64>, String)> = Vec::new();
        for section in &self.sections {
            if !stories.iter().any(|(id, _)| *id == section.story_id) {
                stories.push((section.story_id, section.story_title.clone()));
            }
        }
        stories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = r#"{
        "sections": [
            {
                "story_id": 7,
                "story_title": "The Lantern",
                "section_name": "Intro",
                "audio_available": true,
                "parts": [
                    { "url": "https://cdn.example/7/intro-1.mp3", "duration_secs": 100.0 },
                    { "url": "https://cdn.example/7/intro-2.mp3", "duration_secs": 50.0 },
                    { "url": "https://cdn.example/7/intro-3.mp3", "duration_secs": 30.0 }
                ]
            },
            {
                "story_id": 7,
                "story_title": "The Lantern",
                "section_name": "Discussion",
                "audio_available": false
            },
            {
                "story_id": 9,
                "story_title": "River Song",
                "section_name": "Intro",
                "audio_available": true,
                "parts": []
            },
            {
                "story_id": null,
                "story_title": "Guide",
                "section_name": "Welcome",
                "audio_available": true,
                "parts": [
                    { "url": "/srv/narration/welcome.flac", "duration_secs": 42.0 }
                ]
            }
        ]
    }"#;

    fn catalog() -> NarrationCatalog {
        NarrationCatalog::from_json(CATALOG).unwrap()
    }

    #[test]
    fn test_audio_info_for_narrated_section() {
        let info = catalog().audio_info(Some(7), "Intro").unwrap();
        assert_eq!(info.story_title, "The Lantern");
        assert_eq!(info.part_count(), 3);
        assert_eq!(info.part_durations, vec![100.0, 50.0, 30.0]);
        assert!(info.validate().is_ok());
    }

    #[test]
    fn test_audio_info_absent_without_narration() {
        let catalog = catalog();
        assert!(catalog.audio_info(Some(7), "Discussion").is_none());
        assert!(catalog.audio_info(Some(9), "Intro").is_none());
        assert!(catalog.audio_info(Some(7), "Epilogue").is_none());
        assert!(catalog.audio_info(None, "Intro").is_none());
    }

    #[test]
    fn test_sections_without_story() {
        let info = catalog().audio_info(None, "Welcome").unwrap();
        assert_eq!(info.story_id, None);
        assert_eq!(info.audio_sources, vec!["/srv/narration/welcome.flac"]);
    }

    #[test]
    fn test_sections_for_story_keep_file_order() {
        let catalog = catalog();
        let names: Vec<&str> = catalog
            .sections_for_story(Some(7))
            .iter()
            .map(|s| s.section_name.as_str())
            .collect();
        assert_eq!(names, vec!["Intro", "Discussion"]);
        assert_eq!(catalog.sections_for_story(Some(7))[0].total_duration(), 180.0);
    }

    #[test]
    fn test_stories_are_distinct() {
        assert_eq!(
            catalog().stories(),
            vec![
                (Some(7), "The Lantern".to_string()),
                (Some(9), "River Song".to_string()),
                (None, "Guide".to_string()),
            ]
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();

        let catalog = NarrationCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.sections.len(), 4);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = NarrationCatalog::load(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(CatalogError::Io(_))));

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            NarrationCatalog::load(&path),
            Err(CatalogError::Parse(_))
        ));
    }
}
