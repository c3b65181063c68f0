use serde::{Deserialize, Serialize};

use crate::domain::{DayKey, Theme};

pub fn daily_comic_route() -> &'static str {
    "/api/daily-comic"
}

pub fn daily_prompt_route() -> &'static str {
    "/api/daily-prompt"
}

pub fn healthz_route() -> &'static str {
    "/healthz"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPromptResponse {
    pub prompt: Theme,
    pub day_key: DayKey,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
