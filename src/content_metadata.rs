// Metadata describing one piece of consumable media.
//
// This is the only input rules inspect. It is immutable for the duration of
// a classification call; blank or missing fields are absent signal, never
// an error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of the channel or creator that published the content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(String);

impl ChannelId {
    /// Creates a new ChannelId from a string
    pub fn new(id: impl Into<String>) -> Self {
        ChannelId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ChannelId {
    fn from(s: String) -> Self {
        ChannelId(s)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        ChannelId(s.to_string())
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inspectable metadata of a single content item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContentMetadata {
    /// Caller-side identifier (video id, episode id), used only for audit.
    #[serde(default)]
    pub content_id: Option<String>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub channel_id: Option<ChannelId>,

    /// Display name of the channel. Inspected as text, never used for trust.
    #[serde(default)]
    pub channel_name: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Any other text fields a listing source provides (captions, category).
    #[serde(default)]
    pub extra_fields: BTreeMap<String, String>,
}

impl ContentMetadata {
    /// Creates metadata with only a title.
    pub fn new(title: impl Into<String>) -> Self {
        ContentMetadata {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn builder() -> ContentMetadataBuilder {
        ContentMetadataBuilder::new()
    }

    /// Title, or `None` if it is blank.
    pub fn title_text(&self) -> Option<&str> {
        non_blank(Some(self.title.as_str()))
    }

    /// Description, or `None` if it is missing or blank.
    pub fn description_text(&self) -> Option<&str> {
        non_blank(self.description.as_deref())
    }

    /// Channel identifier with surrounding whitespace removed, if present.
    pub fn channel_key(&self) -> Option<&str> {
        non_blank(self.channel_id.as_ref().map(|id| id.as_str())).map(str::trim)
    }

    /// Yields `(field_name, text)` for every non-blank inspectable text field.
    ///
    /// Order is stable: title, description, channel name, tags, then extra
    /// fields by key.
    pub fn text_fields(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        let fixed = [
            ("title", self.title_text()),
            ("description", self.description_text()),
            ("channel_name", non_blank(self.channel_name.as_deref())),
        ];
        let tags = self.tags.iter().map(|tag| ("tag", non_blank(Some(tag.as_str()))));
        let extra = self
            .extra_fields
            .iter()
            .map(|(key, value)| (key.as_str(), non_blank(Some(value.as_str()))));

        fixed
            .into_iter()
            .chain(tags)
            .chain(extra)
            .filter_map(|(name, text)| text.map(|t| (name, t)))
    }

    /// True if no field carries any signal at all.
    pub fn is_empty(&self) -> bool {
        self.channel_key().is_none() && self.text_fields().next().is_none()
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

/// Builder for ContentMetadata.
#[derive(Debug, Default)]
pub struct ContentMetadataBuilder {
    metadata: ContentMetadata,
}

impl ContentMetadataBuilder {
    pub fn new() -> Self {
        ContentMetadataBuilder::default()
    }

    pub fn content_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.content_id = Some(id.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.metadata.title = title.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = Some(description.into());
        self
    }

    pub fn channel_id(mut self, id: impl Into<ChannelId>) -> Self {
        self.metadata.channel_id = Some(id.into());
        self
    }

    pub fn channel_name(mut self, name: impl Into<String>) -> Self {
        self.metadata.channel_name = Some(name.into());
        self
    }

    /// Adds a tag.
    pub fn add_tag(mut self, tag: impl Into<String>) -> Self {
        self.metadata.tags.push(tag.into());
        self
    }

    /// Adds multiple tags.
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn extra_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.extra_fields.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> ContentMetadata {
        self.metadata
    }
}
