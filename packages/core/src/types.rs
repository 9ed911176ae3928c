// ABOUTME: Entity type definitions for the Compass catalog
// ABOUTME: Solutions, categories, tags, ratings, users and their input shapes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Development stage of a solution
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Developing,
    Uat,
    Production,
    Deprecated,
    Retired,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Developing => "DEVELOPING",
            Stage::Uat => "UAT",
            Stage::Production => "PRODUCTION",
            Stage::Deprecated => "DEPRECATED",
            Stage::Retired => "RETIRED",
        }
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEVELOPING" => Ok(Stage::Developing),
            "UAT" => Ok(Stage::Uat),
            "PRODUCTION" => Ok(Stage::Production),
            "DEPRECATED" => Ok(Stage::Deprecated),
            "RETIRED" => Ok(Stage::Retired),
            _ => Err(format!(
                "Invalid stage '{}'. Must be one of: DEVELOPING, UAT, PRODUCTION, DEPRECATED, RETIRED",
                s
            )),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tech radar adoption posture
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RadarStatus {
    Adopt,
    Trial,
    Assess,
    Hold,
}

impl RadarStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RadarStatus::Adopt => "ADOPT",
            RadarStatus::Trial => "TRIAL",
            RadarStatus::Assess => "ASSESS",
            RadarStatus::Hold => "HOLD",
        }
    }

    /// Ring position on the tech radar (1 = innermost)
    pub fn ring(&self) -> i64 {
        match self {
            RadarStatus::Adopt => 1,
            RadarStatus::Trial => 2,
            RadarStatus::Assess => 3,
            RadarStatus::Hold => 4,
        }
    }
}

impl FromStr for RadarStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADOPT" => Ok(RadarStatus::Adopt),
            "TRIAL" => Ok(RadarStatus::Trial),
            "ASSESS" => Ok(RadarStatus::Assess),
            "HOLD" => Ok(RadarStatus::Hold),
            _ => Err(format!(
                "Invalid radar_status '{}'. Must be one of: ADOPT, TRIAL, ASSESS, HOLD",
                s
            )),
        }
    }
}

impl fmt::Display for RadarStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Strategic recommendation for a solution
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendStatus {
    Buy,
    Hold,
    Sell,
}

impl RecommendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendStatus::Buy => "BUY",
            RecommendStatus::Hold => "HOLD",
            RecommendStatus::Sell => "SELL",
        }
    }
}

impl FromStr for RecommendStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUY" => Ok(RecommendStatus::Buy),
            "HOLD" => Ok(RecommendStatus::Hold),
            "SELL" => Ok(RecommendStatus::Sell),
            _ => Err(format!(
                "Invalid recommend_status '{}'. Must be one of: BUY, HOLD, SELL",
                s
            )),
        }
    }
}

impl fmt::Display for RecommendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A technology solution tracked in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Solution {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub category: Option<String>,
    pub radar_status: RadarStatus,
    pub stage: Option<Stage>,
    pub recommend_status: Option<RecommendStatus>,
    pub department: String,
    pub team: String,
    pub team_email: Option<String>,
    pub maintainer_id: Option<String>,
    pub maintainer_name: Option<String>,
    pub maintainer_email: Option<String>,
    pub official_website: Option<String>,
    pub documentation_url: Option<String>,
    pub demo_url: Option<String>,
    pub version: Option<String>,
    pub tags: Vec<String>,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

/// Input for creating a solution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionCreateInput {
    pub name: String,
    pub description: String,
    pub category: Option<String>,
    pub radar_status: RadarStatus,
    pub stage: Option<Stage>,
    pub recommend_status: Option<RecommendStatus>,
    pub department: String,
    pub team: String,
    pub team_email: Option<String>,
    pub maintainer_id: Option<String>,
    pub maintainer_name: Option<String>,
    pub maintainer_email: Option<String>,
    pub official_website: Option<String>,
    pub documentation_url: Option<String>,
    pub demo_url: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
}

/// Input for partially updating a solution
///
/// Non-nullable fields use `Option<T>`: absent means unchanged. Nullable
/// fields use `Option<Option<T>>` so an explicit `null` in the payload
/// clears the stored value while an absent field leaves it untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SolutionUpdateInput {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
    pub radar_status: Option<RadarStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub stage: Option<Option<Stage>>,
    #[serde(default, deserialize_with = "double_option")]
    pub recommend_status: Option<Option<RecommendStatus>>,
    pub department: Option<String>,
    pub team: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub team_email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub maintainer_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub maintainer_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub maintainer_email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub official_website: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub documentation_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub demo_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub version: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub pros: Option<Vec<String>>,
    pub cons: Option<Vec<String>>,
}

/// A category grouping solutions, placed on a radar quadrant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub name: String,
    pub description: String,
    pub radar_quadrant: i64,
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

/// Radar quadrant value meaning "not placed on the radar"
pub const UNCLASSIFIED_QUADRANT: i64 = -1;

fn default_quadrant() -> i64 {
    UNCLASSIFIED_QUADRANT
}

/// Input for creating a category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCreateInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_quadrant")]
    pub radar_quadrant: i64,
}

/// Input for partially updating a category
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryUpdateInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub radar_quadrant: Option<i64>,
}

/// A tag attached to solutions by name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub name: String,
    pub description: Option<String>,
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

/// Input for creating a tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagCreateInput {
    pub name: String,
    pub description: Option<String>,
}

/// Input for partially updating a tag
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagUpdateInput {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

/// One user's rating of one solution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub solution_slug: String,
    pub username: String,
    pub score: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or replacing a rating
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingInput {
    pub score: i64,
    pub comment: Option<String>,
}

/// Aggregated rating statistics for a solution
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RatingSummary {
    pub average: f64,
    pub count: i64,
    /// Number of ratings per score, keyed "1" through "5"
    pub distribution: std::collections::BTreeMap<String, i64>,
}

impl RatingSummary {
    pub fn empty() -> Self {
        let distribution = (1..=5).map(|s| (s.to_string(), 0)).collect();
        Self {
            average: 0.0,
            count: 0,
            distribution,
        }
    }
}

/// A user account as exposed by the API (no credential material)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

/// A user account as stored, including the password hash
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub hashed_password: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        User {
            username: record.username,
            email: record.email,
            full_name: record.full_name,
            is_active: record.is_active,
            is_superuser: record.is_superuser,
            created_at: record.created_at,
            created_by: record.created_by,
            updated_at: record.updated_at,
            updated_by: record.updated_by,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Input for creating a user
#[derive(Debug, Clone, Deserialize)]
pub struct UserCreateInput {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

/// Input for partially updating a user
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdateInput {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
}

/// Input for changing a user's password
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordUpdateInput {
    pub current_password: String,
    pub new_password: String,
}

/// One blip on the tech radar
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RadarEntry {
    pub quadrant: i64,
    pub ring: i64,
    pub label: String,
    pub active: bool,
    pub moved: i64,
}

/// Full tech radar dataset
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RadarData {
    /// Generation date in YYYY.MM format
    pub date: String,
    pub entries: Vec<RadarEntry>,
}

impl RadarData {
    pub fn current(entries: Vec<RadarEntry>) -> Self {
        Self {
            date: Utc::now().format("%Y.%m").to_string(),
            entries,
        }
    }
}

/// Deserializes a field so that an explicit `null` becomes `Some(None)`
/// while an absent field stays `None` (via `#[serde(default)]`).
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_enum_wire_format() {
        assert_eq!(serde_json::to_string(&Stage::Uat).unwrap(), "\"UAT\"");
        assert_eq!(
            serde_json::to_string(&RadarStatus::Adopt).unwrap(),
            "\"ADOPT\""
        );
        assert_eq!(
            serde_json::to_string(&RecommendStatus::Sell).unwrap(),
            "\"SELL\""
        );
    }

    #[test]
    fn test_enum_rejects_wrong_case() {
        assert!(serde_json::from_str::<RadarStatus>("\"adopt\"").is_err());
        assert!(serde_json::from_str::<Stage>("\"uat\"").is_err());
        assert!(serde_json::from_str::<RecommendStatus>("\"Buy\"").is_err());
    }

    #[test]
    fn test_enum_from_str() {
        assert_eq!("PRODUCTION".parse::<Stage>().unwrap(), Stage::Production);
        assert_eq!("HOLD".parse::<RadarStatus>().unwrap(), RadarStatus::Hold);
        assert_eq!("HOLD".parse::<RecommendStatus>().unwrap(), RecommendStatus::Hold);
        assert!("production".parse::<Stage>().is_err());
        assert!("UNKNOWN".parse::<RadarStatus>().is_err());
    }

    #[test]
    fn test_radar_rings() {
        assert_eq!(RadarStatus::Adopt.ring(), 1);
        assert_eq!(RadarStatus::Trial.ring(), 2);
        assert_eq!(RadarStatus::Assess.ring(), 3);
        assert_eq!(RadarStatus::Hold.ring(), 4);
    }

    #[test]
    fn test_update_input_null_vs_absent() {
        let update: TagUpdateInput = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(update.description, Some(None));
        assert_eq!(update.name, None);

        let update: TagUpdateInput =
            serde_json::from_str(r#"{"description": "build tooling"}"#).unwrap();
        assert_eq!(update.description, Some(Some("build tooling".to_string())));

        let update: TagUpdateInput = serde_json::from_str("{}").unwrap();
        assert_eq!(update.description, None);
    }

    #[test]
    fn test_user_record_conversion_drops_hash() {
        let record = UserRecord {
            username: "jo".to_string(),
            email: "jo@example.com".to_string(),
            full_name: "Jo Doe".to_string(),
            hashed_password: "$argon2id$...".to_string(),
            is_active: true,
            is_superuser: false,
            created_at: Utc::now(),
            created_by: None,
            updated_at: Utc::now(),
            updated_by: None,
        };

        let user: User = record.into();
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("hashed_password"));
    }
}
