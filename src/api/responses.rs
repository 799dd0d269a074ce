use crate::board::ViewModel;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct BoardSuccessResponse {
    #[serde(flatten)]
    pub board: ViewModel,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct BoardErrorResponse {
    pub error_code: BoardErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
    Ko,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthSuccessResponse {
    pub status: HealthStatus,
    pub record_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_refresh: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthErrorResponse {
    pub error_code: HealthErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthErrorCode {
    InternalError,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoardErrorCode {
    NoData,
    InternalError,
}
