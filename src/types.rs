use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Which kind of edit the uploaded photo goes through
#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Display,
    EnumString,
    EnumIter,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EditContext {
    #[default]
    Clothes,
    Celebrity,
    Background,
    Destination,
}

impl EditContext {
    /// Whether the trigger stays disabled until the user types something
    pub fn requires_text(self) -> bool {
        !matches!(self, EditContext::Destination)
    }
}

#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Display,
    EnumString,
    EnumIter,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Destination {
    #[default]
    Paris,
    Tokyo,
    NewYork,
    Santorini,
    Safari,
    Moon,
}

impl Destination {
    pub fn scene(self) -> &'static str {
        match self {
            Destination::Paris => "in front of the Eiffel Tower in Paris on a sunny afternoon",
            Destination::Tokyo => "on a neon-lit street in Shibuya, Tokyo at night",
            Destination::NewYork => "in Times Square, New York City with yellow cabs passing by",
            Destination::Santorini => {
                "on a whitewashed terrace in Santorini overlooking the blue Aegean Sea"
            }
            Destination::Safari => "on an African savanna safari at golden hour with acacia trees",
            Destination::Moon => "standing on the surface of the Moon with Earth in the sky",
        }
    }
}

/// Base64 image payload sent to the generation API, without a data URI prefix
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ImageInput {
    pub data: String,
    pub mime_type: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_edit_context_enum_string() {
        assert_eq!(EditContext::from_str("celebrity").unwrap(), EditContext::Celebrity);
        assert!(EditContext::from_str("INVALID").is_err());
        assert_eq!(EditContext::Background.to_string(), "background");

        let json = serde_json::to_string(&EditContext::Destination).unwrap();
        assert_eq!(json, "\"destination\"");
    }

    #[test]
    fn test_only_destination_skips_text() {
        for context in EditContext::iter() {
            assert_eq!(
                context.requires_text(),
                context != EditContext::Destination,
                "{context}"
            );
        }
    }

    #[test]
    fn test_destination_scenes_are_distinct() {
        let scenes: Vec<_> = Destination::iter().map(Destination::scene).collect();
        for (i, scene) in scenes.iter().enumerate() {
            assert!(!scene.is_empty());
            assert!(!scenes[i + 1..].contains(scene));
        }
        assert_eq!(
            Destination::from_str("new_york").unwrap(),
            Destination::NewYork
        );
    }
}
