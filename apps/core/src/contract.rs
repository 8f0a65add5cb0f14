use serde::{Deserialize, Serialize};

use crate::model::{Target, TargetGroup};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListTargetsRequest {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetDto {
    pub id: i64,
    pub label: String,
    pub url_pattern: String,
    pub bound_app_id: String,
    pub icon_mode: String,
    pub label_text: String,
    pub background_color: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupDto {
    pub id: i64,
    pub name: String,
    pub targets: Vec<TargetDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListTargetsResponse {
    pub groups: Vec<GroupDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpenGroupRequest {
    pub group: String,
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpenGroupResponse {
    pub opened: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshIconsRequest {
    pub force: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshIconsResponse {
    pub refreshed: usize,
    pub fallbacks: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload")]
pub enum CoreRequest {
    ListTargets(ListTargetsRequest),
    OpenGroup(OpenGroupRequest),
    RefreshIcons(RefreshIconsRequest),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload")]
pub enum CoreResponse {
    ListTargets(ListTargetsResponse),
    OpenGroup(OpenGroupResponse),
    RefreshIcons(RefreshIconsResponse),
}

impl From<Target> for TargetDto {
    fn from(value: Target) -> Self {
        Self {
            id: value.id,
            label: value.label,
            url_pattern: value.url_pattern,
            bound_app_id: value.bound_app_id,
            icon_mode: value.icon_mode.as_str().to_string(),
            label_text: value.label_text,
            background_color: value.background_color,
        }
    }
}

impl GroupDto {
    pub fn from_group(group: TargetGroup, targets: Vec<Target>) -> Self {
        Self {
            id: group.id,
            name: group.name,
            targets: targets.into_iter().map(TargetDto::from).collect(),
        }
    }
}
