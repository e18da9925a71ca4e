//! Preset and queue repositories.
//!
//! Both stores are plain collections owned by the caller. Loading and saving
//! go through `from_json`/`to_json`; reading and writing the files is left to
//! the binary.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::engine::core::{EncodeSettings, generate_query, parse_query};

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("Preset '{0}' already exists")]
    Duplicate(String),

    #[error("Preset '{0}' not found")]
    NotFound(String),

    #[error("Preset '{0}' is built in and can not be changed")]
    BuiltIn(String),

    #[error("Queue item {0} not found")]
    QueueItemNotFound(Uuid),

    #[error("Malformed preset or queue document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A named encoder query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub query: String,
    /// Whether crop and picture size are part of the preset.
    #[serde(default)]
    pub picture_settings: bool,
    #[serde(default)]
    pub built_in: bool,
}

impl Preset {
    pub fn new(name: impl Into<String>, query: impl Into<String>, picture_settings: bool) -> Self {
        Self {
            name: name.into(),
            category: String::new(),
            query: query.into(),
            picture_settings,
            built_in: false,
        }
    }

    /// Capture `settings` as a preset. Source and destination are not stored.
    pub fn from_settings(
        name: impl Into<String>,
        settings: &EncodeSettings,
        picture_settings: bool,
    ) -> Self {
        let mut stripped = settings.clone();
        stripped.source.clear();
        stripped.destination.clear();
        stripped.title = None;
        stripped.angle = None;
        stripped.chapters = None;
        if !picture_settings {
            clear_picture(&mut stripped);
        }
        Self::new(name, generate_query(&stripped), picture_settings)
    }

    /// Settings stored in the preset query.
    pub fn settings(&self) -> EncodeSettings {
        let mut settings = parse_query(&self.query);
        if !self.picture_settings {
            clear_picture(&mut settings);
        }
        settings
    }

    /// Apply the preset on top of `current`, keeping its source selection and
    /// destination (and its picture size when the preset has none).
    pub fn apply_to(&self, current: &EncodeSettings) -> EncodeSettings {
        let mut next = self.settings();
        next.source = current.source.clone();
        next.title = current.title;
        next.angle = current.angle;
        next.chapters = current.chapters;
        next.destination = current.destination.clone();
        if !self.picture_settings {
            next.width = current.width;
            next.height = current.height;
            next.max_width = current.max_width;
            next.max_height = current.max_height;
            match current.cropping() {
                Some(c) => next.set_cropping(c.top, c.bottom, c.left, c.right),
                None => next.clear_cropping(),
            }
        }
        next
    }
}

fn clear_picture(settings: &mut EncodeSettings) {
    settings.width = None;
    settings.height = None;
    settings.max_width = None;
    settings.max_height = None;
    settings.clear_cropping();
}

/// Output of the encoder's `--preset-list`, used for the built-in presets.
const BUILTIN_PRESET_LIST: &str = r#"
< Apple

   + Universal:  -e x264 -q 20.0 -a 1,1 -E faac,ac3 -B 160,160 -6 dpl2,auto -R 48,Auto -D 0.0,0.0 -f mp4 -X 720 --loose-anamorphic -m -x cabac=0:ref=2:me=umh:bframes=0:weightb=0:8x8dct=0:trellis=0:subme=6

   + iPod:  -e x264 -b 700 -a 1 -E faac -B 160 -6 dpl2 -R 48 -D 0.0 -f mp4 -I -X 320 -m -x level=30:bframes=0:weightb=0:cabac=0:ref=1:vbv-maxrate=768:vbv-bufsize=2000:analyse=all:me=umh:no-fast-pskip=1:subme=6:8x8dct=0:trellis=0

   + AppleTV:  -e x264 -q 20.0 -a 1,1 -E faac,ac3 -B 160,160 -6 dpl2,auto -R 48,Auto -D 0.0,0.0 -f mp4 -4 -X 960 --loose-anamorphic -m -x cabac=0:ref=2:me=umh:b-pyramid=none:b-adapt=2:weightb=0:trellis=0:weightp=0:vbv-maxrate=9500:vbv-bufsize=9500

>

< Regular

   + Normal:  -e x264 -q 20.0 -a 1 -E faac -B 160 -6 dpl2 -R Auto -D 0.0 -f mp4 --strict-anamorphic -m -x ref=1:weightb=0:subme=2:mixed-refs=0:trellis=0

   + High Profile:  -e x264 -q 20.0 -a 1,1 -E faac,ac3 -B 160,160 -6 dpl2,auto -R Auto,Auto -D 0.0,0.0 -f mp4 --detelecine --decomb --loose-anamorphic -m -x b-adapt=2:rc-lookahead=50

>

< Legacy

   + Classic:  -e ffmpeg -b 1000 -a 1 -E faac -B 160 -R Auto -6 dpl2 -D 0.0 -f mp4 -w 720 -l 400 --crop 0:0:0:0

>
"#;

/// Ordered, name-unique collection of presets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetStore {
    presets: Vec<Preset>,
}

impl PresetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Presets shipped with the encoder.
    pub fn builtin() -> Self {
        Self::from_preset_list(BUILTIN_PRESET_LIST)
    }

    /// Parse `--preset-list` output.
    ///
    /// `< Category` opens a category, `+ Name:  query` declares a preset. A
    /// preset whose query carries `--crop` keeps its picture settings.
    pub fn from_preset_list(text: &str) -> Self {
        let mut store = Self::new();
        let mut category = String::new();
        for line in text.lines() {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix('<') {
                if !rest.starts_with('<') {
                    category = rest.trim().to_string();
                }
                continue;
            }
            let Some(rest) = line.strip_prefix('+') else {
                continue;
            };
            let Some((name, query)) = rest.split_once(":  ") else {
                debug!(line, "skipping preset line without a query");
                continue;
            };
            let query = query.trim();
            let preset = Preset {
                name: name.trim().to_string(),
                category: category.clone(),
                query: query.to_string(),
                picture_settings: query.contains("--crop"),
                built_in: true,
            };
            if store.add(preset).is_err() {
                debug!(name = name.trim(), "duplicate preset in preset list");
            }
        }
        store
    }

    pub fn from_json(json: &str) -> Result<Self, PresetError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, PresetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn add(&mut self, preset: Preset) -> Result<(), PresetError> {
        if self.get(&preset.name).is_some() {
            return Err(PresetError::Duplicate(preset.name));
        }
        self.presets.push(preset);
        Ok(())
    }

    /// Replace the query of a user preset.
    pub fn update(
        &mut self,
        name: &str,
        query: impl Into<String>,
        picture_settings: bool,
    ) -> Result<(), PresetError> {
        let preset = self
            .presets
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| PresetError::NotFound(name.to_string()))?;
        if preset.built_in {
            return Err(PresetError::BuiltIn(name.to_string()));
        }
        preset.query = query.into();
        preset.picture_settings = picture_settings;
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<Preset, PresetError> {
        let idx = self
            .presets
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| PresetError::NotFound(name.to_string()))?;
        Ok(self.presets.remove(idx))
    }

    /// Drop every built-in preset, keeping user presets.
    pub fn remove_builtin(&mut self) {
        self.presets.retain(|p| !p.built_in);
    }

    /// Add presets from `other` whose names are not taken yet.
    pub fn merge(&mut self, other: PresetStore) {
        for preset in other.presets {
            if self.get(&preset.name).is_none() {
                self.presets.push(preset);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.presets.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QueueStatus {
    #[default]
    Pending,
    Running,
    Done,
    Failed,
}

/// One queued encode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: Uuid,
    pub query: String,
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub status: QueueStatus,
    pub added_at: String, // RFC 3339
}

impl QueueItem {
    pub fn new(settings: &EncodeSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            query: generate_query(settings),
            source: settings.source.clone(),
            destination: settings.destination.clone(),
            status: QueueStatus::Pending,
            added_at: chrono::Local::now().to_rfc3339(),
        }
    }

    pub fn settings(&self) -> EncodeSettings {
        parse_query(&self.query)
    }
}

/// Ordered encode queue; the front item is encoded next.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueStore {
    items: Vec<QueueItem>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, PresetError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, PresetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Queue `settings` and return the new item id.
    pub fn enqueue(&mut self, settings: &EncodeSettings) -> Uuid {
        let item = QueueItem::new(settings);
        let id = item.id;
        self.items.push(item);
        id
    }

    /// Mark the first pending item as running and return it.
    pub fn start_next(&mut self) -> Option<&QueueItem> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.status == QueueStatus::Pending)?;
        item.status = QueueStatus::Running;
        Some(&*item)
    }

    pub fn set_status(&mut self, id: Uuid, status: QueueStatus) -> Result<(), PresetError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(PresetError::QueueItemNotFound(id))?;
        item.status = status;
        Ok(())
    }

    pub fn remove(&mut self, id: Uuid) -> Result<QueueItem, PresetError> {
        let idx = self.position(id)?;
        Ok(self.items.remove(idx))
    }

    pub fn move_up(&mut self, id: Uuid) -> Result<(), PresetError> {
        let idx = self.position(id)?;
        if idx > 0 {
            self.items.swap(idx, idx - 1);
        }
        Ok(())
    }

    pub fn move_down(&mut self, id: Uuid) -> Result<(), PresetError> {
        let idx = self.position(id)?;
        if idx + 1 < self.items.len() {
            self.items.swap(idx, idx + 1);
        }
        Ok(())
    }

    /// Remove finished items.
    pub fn clear_done(&mut self) {
        self.items.retain(|i| i.status != QueueStatus::Done);
    }

    /// True when another queued item writes to `destination`.
    pub fn has_destination(&self, destination: &str) -> bool {
        self.items.iter().any(|i| i.destination == destination)
    }

    pub fn get(&self, id: Uuid) -> Option<&QueueItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, id: Uuid) -> Result<usize, PresetError> {
        self.items
            .iter()
            .position(|i| i.id == id)
            .ok_or(PresetError::QueueItemNotFound(id))
    }
}
