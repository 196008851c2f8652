use anyhow::{anyhow, Result};
use serde::de::{self, Deserializer};
use serde_derive::Deserialize;
use url::Url;

use std::fmt;
use std::str::FromStr;

/// One page of a `/node.json` listing as returned by the drupal.org API.
#[derive(Debug, Deserialize)]
pub struct NodeList {
    #[serde(rename = "self")]
    pub self_url: String,
    #[serde(default)]
    pub last: Option<String>,
    #[serde(default)]
    pub list: Vec<Issue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Issue {
    #[serde(rename = "field_issue_component", default, deserialize_with = "string_or_null")]
    pub component: String,
    #[serde(rename = "field_issue_version", default, deserialize_with = "string_or_null")]
    pub version: String,
    #[serde(rename = "field_issue_category", default, deserialize_with = "category_code")]
    pub category: u32,
}

#[cfg(test)]
impl Issue {
    pub fn new(component: &str, version: &str, category: u32) -> Self {
        Self {
            component: component.to_owned(),
            version: version.to_owned(),
            category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<Issue>,
    pub current: u32,
    pub last: u32,
}

impl Page {
    pub fn is_last(&self) -> bool {
        self.current >= self.last
    }
}

impl From<NodeList> for Page {
    fn from(list: NodeList) -> Self {
        let current = page_index(&list.self_url);
        let last = list.last.as_deref().map_or(current, page_index);
        Self {
            items: list.list,
            current,
            last,
        }
    }
}

/// Extracts the `page` query parameter from a listing URL, 0 if absent.
pub fn page_index(url: &str) -> u32 {
    Url::parse(url)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "page")
                .and_then(|(_, value)| value.parse().ok())
        })
        .unwrap_or(0)
}

fn string_or_null<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = serde::Deserialize::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

fn category_code<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Number(u32),
        Text(String),
    }

    match <Option<Code> as serde::Deserialize>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Code::Number(code)) => Ok(code),
        Some(Code::Text(text)) if text.is_empty() => Ok(0),
        Some(Code::Text(text)) => text.parse().map_err(de::Error::custom),
    }
}

/// Issue status queues tracked in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Queue {
    NeedsReview,
    Rtbc,
}

impl Queue {
    pub const ALL: [Queue; 2] = [Queue::NeedsReview, Queue::Rtbc];

    /// Value of `field_issue_status` for this queue.
    pub fn status(self) -> u32 {
        match self {
            Queue::NeedsReview => 8,
            Queue::Rtbc => 14,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Queue::NeedsReview => "NR",
            Queue::Rtbc => "RTBC",
        }
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Queue::NeedsReview => write!(f, "needs review"),
            Queue::Rtbc => write!(f, "reviewed & tested by the community"),
        }
    }
}

impl FromStr for Queue {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "needs-review" | "nr" => Ok(Queue::NeedsReview),
            "rtbc" => Ok(Queue::Rtbc),
            _ => Err(anyhow!("unknown queue '{}', expected needs-review or rtbc", s)),
        }
    }
}

/// Value of `field_issue_category`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Bug,
    Task,
    Feature,
    Support,
    Plan,
}

impl Category {
    pub fn code(self) -> u32 {
        match self {
            Category::Bug => 1,
            Category::Task => 2,
            Category::Feature => 3,
            Category::Support => 4,
            Category::Plan => 5,
        }
    }

    fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Category::Bug),
            2 => Some(Category::Task),
            3 => Some(Category::Feature),
            4 => Some(Category::Support),
            5 => Some(Category::Plan),
            _ => None,
        }
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let category = match s.to_ascii_lowercase().as_str() {
            "bug" => Some(Category::Bug),
            "task" => Some(Category::Task),
            "feature" => Some(Category::Feature),
            "support" => Some(Category::Support),
            "plan" => Some(Category::Plan),
            other => other.parse().ok().and_then(Category::from_code),
        };
        category.ok_or_else(|| anyhow!("unknown issue category '{}'", s))
    }
}
