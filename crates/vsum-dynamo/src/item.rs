//! Item layout of the article table.
//!
//! One item per video, partition key `vid`. Per-language fields are stored
//! as maps keyed by language code so a write for one language can target
//! `title.en` without touching `title.pt`.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use vsum_models::{ArticleRecord, ArticleStatus, Language, LanguageFields, VideoFields};

use crate::error::{StoreError, StoreResult};

/// Partition key attribute.
pub const PK: &str = "vid";
/// Index used for recency listings.
pub const GSI1: &str = "GSI1";
pub const GSI1_PK: &str = "GSI1PK";
pub const GSI1_SK: &str = "GSI1SK";
/// Fixed partition value of every item in `GSI1`.
pub const GSI1_PARTITION: &str = "VIDS#";

pub const TITLE: &str = "title";
pub const CONTENT: &str = "content";
pub const ANSWER: &str = "answer";
pub const PATH: &str = "path";
pub const STATUS: &str = "status";
pub const CHANNEL_ID: &str = "channel_id";
pub const CHANNEL_NAME: &str = "channel_name";
pub const UPLOAD_DATE: &str = "video_upload_date";
pub const CATEGORY: &str = "category";
pub const DURATION: &str = "duration";
pub const VIEW_COUNT: &str = "view_count";
pub const UPDATED_AT: &str = "article_update_datetime";

/// Per-language map attributes.
pub const LANGUAGE_MAPS: [&str; 5] = [TITLE, CONTENT, ANSWER, PATH, STATUS];

// =============================================================================
// Update plans
// =============================================================================

/// A fully-built `UpdateItem` request body, independent of the SDK client.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePlan {
    pub update_expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
    pub condition: Option<String>,
}

impl UpdatePlan {
    fn new() -> Self {
        Self {
            update_expression: String::new(),
            names: HashMap::new(),
            values: HashMap::new(),
            condition: None,
        }
    }

    fn name(&mut self, attribute: &str) -> String {
        let placeholder = format!("#{}", attribute);
        self.names.insert(placeholder.clone(), attribute.to_string());
        placeholder
    }

    fn value(&mut self, key: &str, value: AttributeValue) -> String {
        let placeholder = format!(":{}", key);
        self.values.insert(placeholder.clone(), value);
        placeholder
    }

    fn set_clauses(mut self, clauses: Vec<String>) -> Self {
        self.update_expression = format!("SET {}", clauses.join(", "));
        self
    }
}

/// Create the item and its empty language maps if absent, and fill
/// video-level fields that are not set yet.
///
/// Nested `map.lang` paths can only be written once the map exists, and one
/// expression may not touch both `title` and `title.en`.
pub fn ensure_item_plan(video: Option<&VideoFields>) -> UpdatePlan {
    let mut plan = UpdatePlan::new();
    let empty = plan.value("empty", AttributeValue::M(HashMap::new()));
    let mut clauses = Vec::new();

    for map in LANGUAGE_MAPS {
        let name = plan.name(map);
        clauses.push(format!("{name} = if_not_exists({name}, {empty})"));
    }

    if let Some(video) = video {
        let fields = [
            (CHANNEL_ID, s(&video.channel_id)),
            (CHANNEL_NAME, s(&video.channel_name)),
            (UPLOAD_DATE, s(&video.upload_date)),
            (CATEGORY, s(&video.category)),
            (DURATION, n(video.duration)),
            (VIEW_COUNT, n(video.view_count)),
        ];
        for (attribute, value) in fields {
            let name = plan.name(attribute);
            let value = plan.value(attribute, value);
            clauses.push(format!("{name} = if_not_exists({name}, {value})"));
        }
    }

    plan.set_clauses(clauses)
}

/// Write every `*[lang]` sub-field plus the update time and index keys.
///
/// Conditional on the item existing; apply [`ensure_item_plan`] first.
pub fn language_plan(lang: Language, fields: &LanguageFields, now: &str) -> UpdatePlan {
    let mut plan = UpdatePlan::new();
    let lang_name = plan.name(lang.as_str());
    let mut clauses = Vec::new();

    let sub_fields = [
        (TITLE, &fields.title),
        (CONTENT, &fields.content),
        (ANSWER, &fields.answer),
        (PATH, &fields.path),
    ];
    for (map, value) in sub_fields {
        let map_name = plan.name(map);
        let value = plan.value(map, s(value));
        clauses.push(format!("{map_name}.{lang_name} = {value}"));
    }

    let status_name = plan.name(STATUS);
    let status = plan.value(STATUS, s(fields.status.as_str()));
    clauses.push(format!("{status_name}.{lang_name} = {status}"));

    let updated_at = plan.name(UPDATED_AT);
    let now_value = plan.value("now", s(now));
    clauses.push(format!("{updated_at} = {now_value}"));

    let gsi_pk = plan.name(GSI1_PK);
    let gsi_pk_value = plan.value("gsi1pk", s(GSI1_PARTITION));
    clauses.push(format!("{gsi_pk} = {gsi_pk_value}"));

    let gsi_sk = plan.name(GSI1_SK);
    clauses.push(format!("{gsi_sk} = {now_value}"));

    let pk = plan.name(PK);
    plan.condition = Some(format!("attribute_exists({pk})"));

    plan.set_clauses(clauses)
}

/// Record a terminal status for `lang` unless the language is already
/// completed.
pub fn failure_plan(lang: Language, status: ArticleStatus) -> UpdatePlan {
    let mut plan = UpdatePlan::new();
    let lang_name = plan.name(lang.as_str());
    let status_name = plan.name(STATUS);
    let value = plan.value(STATUS, s(status.as_str()));
    let completed = plan.value("completed", s(ArticleStatus::Completed.as_str()));

    plan.condition = Some(format!(
        "attribute_not_exists({status_name}.{lang_name}) OR {status_name}.{lang_name} <> {completed}"
    ));
    plan.set_clauses(vec![format!("{status_name}.{lang_name} = {value}")])
}

// =============================================================================
// Item decoding
// =============================================================================

/// Decode a stored item into an [`ArticleRecord`].
///
/// Language keys outside the allow-list are skipped.
pub fn item_to_record(item: &HashMap<String, AttributeValue>) -> StoreResult<ArticleRecord> {
    let video_id = item
        .get(PK)
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| StoreError::invalid_item("missing vid"))?;

    let mut record = ArticleRecord::new(video_id.clone());
    record.title = language_map(item, TITLE);
    record.content = language_map(item, CONTENT);
    record.answer = language_map(item, ANSWER);
    record.path = language_map(item, PATH);
    record.status = language_map(item, STATUS);
    record.channel_id = string_attr(item, CHANNEL_ID);
    record.channel_name = string_attr(item, CHANNEL_NAME);
    record.upload_date = string_attr(item, UPLOAD_DATE);
    record.category = string_attr(item, CATEGORY);
    record.article_update_datetime = string_attr(item, UPDATED_AT);
    record.duration = number_attr(item, DURATION);
    record.view_count = number_attr(item, VIEW_COUNT);

    Ok(record)
}

fn language_map(
    item: &HashMap<String, AttributeValue>,
    attribute: &str,
) -> std::collections::BTreeMap<Language, String> {
    item.get(attribute)
        .and_then(|v| v.as_m().ok())
        .map(|map| {
            map.iter()
                .filter_map(|(code, value)| {
                    let lang = Language::from_code(code)?;
                    let text = value.as_s().ok()?;
                    Some((lang, text.clone()))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn string_attr(item: &HashMap<String, AttributeValue>, attribute: &str) -> Option<String> {
    item.get(attribute)
        .and_then(|v| v.as_s().ok())
        .cloned()
}

fn number_attr(item: &HashMap<String, AttributeValue>, attribute: &str) -> Option<u64> {
    item.get(attribute).and_then(|v| match v {
        AttributeValue::N(n) => n.parse().ok(),
        AttributeValue::S(s) => s.parse().ok(),
        _ => None,
    })
}

fn s(value: &str) -> AttributeValue {
    AttributeValue::S(value.to_string())
}

fn n(value: u64) -> AttributeValue {
    AttributeValue::N(value.to_string())
}
