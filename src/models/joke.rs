use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Source tag stored on jokes created through the API.
pub const CUSTOM_SOURCE: &str = "custom";

/// Maximum accepted length of a joke body, in characters.
pub const MAX_JOKE_TEXT_LEN: usize = 1000;

/// A stored joke with its creator and topics resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Joke {
    pub id: Uuid,
    pub number: i32,
    pub text: String,
    pub source: Option<String>,
    pub user: Option<UserSummary>,
    pub topics: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
}

/// Insert payload handed to the store once user and topic are resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJoke {
    pub text: String,
    pub source: String,
    pub user_id: Uuid,
    pub topic_id: Uuid,
}

/// Body of `POST /api/jokes`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJokeRequest {
    #[serde(default)]
    pub text: String,
    pub user_name: Option<String>,
    pub topic_name: Option<String>,
}

/// Query string of `GET /api/jokes/list`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JokeListQuery {
    pub user_name: Option<String>,
    pub topic_name: Option<String>,
}

/// One joke from each external provider plus the text stitched from both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedJoke {
    pub chuck: String,
    pub dad: String,
    #[serde(rename = "combinado")]
    pub combined: String,
}

impl CreateJokeRequest {
    pub fn validate(&self) -> Result<(), String> {
        let text = self.text.trim();

        if text.is_empty() {
            return Err("Text is required".to_string());
        }

        if text.chars().count() > MAX_JOKE_TEXT_LEN {
            return Err(format!("Text cannot exceed {} characters", MAX_JOKE_TEXT_LEN));
        }

        Ok(())
    }

    pub fn get_normalized_text(&self) -> String {
        self.text.trim().to_string()
    }

    /// Trimmed user name, `None` when absent or blank.
    pub fn get_normalized_user_name(&self) -> Option<String> {
        normalize_optional(self.user_name.as_deref())
    }

    /// Trimmed topic name, `None` when absent or blank.
    pub fn get_normalized_topic_name(&self) -> Option<String> {
        normalize_optional(self.topic_name.as_deref())
    }
}

impl JokeListQuery {
    /// User names are stored capitalized ("Manolito"), so "MANOLITO" and
    /// "manolito" both become "Manolito".
    pub fn get_normalized_user_name(&self) -> Option<String> {
        normalize_optional(self.user_name.as_deref()).map(|name| {
            let lower = name.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => lower,
            }
        })
    }

    pub fn get_normalized_topic_name(&self) -> Option<String> {
        normalize_optional(self.topic_name.as_deref()).map(|topic| topic.to_lowercase())
    }
}

impl PairedJoke {
    pub fn new(chuck: String, dad: String, combined: String) -> Self {
        PairedJoke { chuck, dad, combined }
    }
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> CreateJokeRequest {
        CreateJokeRequest {
            text: text.to_string(),
            user_name: None,
            topic_name: None,
        }
    }

    #[test]
    fn test_create_joke_request_validation() {
        assert!(request("Why did the chicken cross the road?").validate().is_ok());
        assert!(request("").validate().is_err());
        assert!(request("   ").validate().is_err());
        assert!(request(&"a".repeat(MAX_JOKE_TEXT_LEN)).validate().is_ok());
        assert!(request(&"a".repeat(MAX_JOKE_TEXT_LEN + 1)).validate().is_err());
    }

    #[test]
    fn test_create_joke_request_normalization() {
        let request = CreateJokeRequest {
            text: "  a joke  ".to_string(),
            user_name: Some("  Manolito ".to_string()),
            topic_name: Some("   ".to_string()),
        };

        assert_eq!(request.get_normalized_text(), "a joke");
        assert_eq!(request.get_normalized_user_name(), Some("Manolito".to_string()));
        assert_eq!(request.get_normalized_topic_name(), None);
    }

    #[test]
    fn test_create_joke_request_deserialization() {
        let json = r#"{"text":"hola","userName":"Pepe","topicName":"humor negro"}"#;
        let request: CreateJokeRequest = serde_json::from_str(json).expect("valid request");
        assert_eq!(request.text, "hola");
        assert_eq!(request.user_name.as_deref(), Some("Pepe"));
        assert_eq!(request.topic_name.as_deref(), Some("humor negro"));

        let missing_text: CreateJokeRequest = serde_json::from_str("{}").expect("defaults apply");
        assert!(missing_text.validate().is_err());
    }

    #[test]
    fn test_list_query_normalization() {
        let query = JokeListQuery {
            user_name: Some("mANOLITO".to_string()),
            topic_name: Some("Humor Negro".to_string()),
        };
        assert_eq!(query.get_normalized_user_name(), Some("Manolito".to_string()));
        assert_eq!(query.get_normalized_topic_name(), Some("humor negro".to_string()));

        let empty = JokeListQuery {
            user_name: Some("".to_string()),
            topic_name: None,
        };
        assert_eq!(empty.get_normalized_user_name(), None);
        assert_eq!(empty.get_normalized_topic_name(), None);
    }

    #[test]
    fn test_joke_serialization_uses_camel_case() {
        let created = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let joke = Joke {
            id: Uuid::nil(),
            number: 1,
            text: "This is a random joke from DB".to_string(),
            source: Some(CUSTOM_SOURCE.to_string()),
            user: Some(UserSummary {
                id: Uuid::nil(),
                name: "Manolito".to_string(),
            }),
            topics: vec!["humor negro".to_string()],
            created_at: created,
            updated_at: created,
        };

        let value = serde_json::to_value(&joke).expect("serializable");
        assert_eq!(value["number"], 1);
        assert_eq!(value["user"]["name"], "Manolito");
        assert_eq!(value["topics"][0], "humor negro");
        assert_eq!(value["createdAt"], "2024-01-01T00:00:00Z");
        assert!(value.get("created_at").is_none());
    }

    #[test]
    fn test_paired_joke_wire_format() {
        let pair = PairedJoke::new("c".to_string(), "d".to_string(), "c d".to_string());
        let json = serde_json::to_string(&pair).expect("serializable");
        assert_eq!(json, r#"{"chuck":"c","dad":"d","combinado":"c d"}"#);
    }
}
