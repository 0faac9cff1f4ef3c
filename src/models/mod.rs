// AI Detector Data Models
// Wire types for the detection service API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============ Authentication ============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    /// Always "bearer" for this service.
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// ============ Analysis ============

/// One contiguous span of the analyzed text believed AI-generated.
///
/// Offsets are 0-based UTF-8 byte offsets, end-exclusive. Spans as received
/// from the server may overlap, be unsorted, or reach outside the text;
/// `merge_segments` normalizes them before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: i32,
    pub end: i32,
    pub prob_ai: f64,
}

/// Predicted label: 1 = AI-generated, 0 = human-written.
pub const LABEL_AI: i32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub label: i32,
    pub prob_ai: f64,
    pub threshold: f64,
    pub segments: Vec<Segment>,
    /// Echo of the analyzed text, when the server includes it.
    #[serde(default)]
    pub text: Option<String>,
}

impl AnalyzeResponse {
    pub fn is_ai(&self) -> bool {
        self.label == LABEL_AI
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisListItem {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub label_pred: i32,
    pub prob_ai: f64,
    pub preview: String,
    #[serde(default)]
    pub segments: Option<Vec<Segment>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisDetail {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub label_pred: i32,
    pub prob_ai: f64,
    #[serde(default)]
    pub threshold: Option<f64>,
    pub text: String,
    pub segments: Vec<Segment>,
}

// ============ Aggregate Stats ============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_count: i64,
    pub ai_count: i64,
    pub human_count: i64,
    pub avg_prob_ai: f64,
}

// ============ Health ============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

// ============ Error Payload ============

/// RFC 7807 problem-details body the service attaches to non-2xx responses
/// with content type `application/problem+json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub instance: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_response_label() {
        let res = AnalyzeResponse {
            label: 1,
            prob_ai: 0.91,
            threshold: 0.5,
            segments: vec![],
            text: None,
        };
        assert!(res.is_ai());
    }

    #[test]
    fn test_problem_details_partial_body() {
        let problem: ProblemDetails =
            serde_json::from_str(r#"{"detail":"text too short","status":422}"#).unwrap();
        assert_eq!(problem.detail.as_deref(), Some("text too short"));
        assert_eq!(problem.status, Some(422));
        assert!(problem.title.is_none());
    }

    #[test]
    fn test_analysis_detail_optional_threshold() {
        let json = r#"{
            "id": 7,
            "created_at": "2026-01-15T10:30:00Z",
            "label_pred": 0,
            "prob_ai": 0.12,
            "text": "hello",
            "segments": []
        }"#;
        let detail: AnalysisDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.id, 7);
        assert!(detail.threshold.is_none());
    }
}
