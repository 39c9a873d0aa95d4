/// 平台 HTTP API 客户端
///
/// 封装所有与竞赛平台学生端接口相关的调用逻辑
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use crate::clients::session_api::{SessionApi, SubmitReceipt};
use crate::config::Config;
use crate::error::ApiError;
use crate::models::answer::Answer;
use crate::models::checkpoint::Checkpoint;
use crate::models::session::{SessionData, SessionRef};

/// 平台统一返回结构
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

/// 保存/提交请求体
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnswersPayload<'a> {
    session_id: &'a str,
    answers: &'a [Answer],
    time_spent: u64,
    saved_at: DateTime<Utc>,
}

impl<'a> AnswersPayload<'a> {
    fn new(session: &'a SessionRef, checkpoint: &'a Checkpoint) -> Self {
        Self {
            session_id: &session.session_id,
            answers: &checkpoint.answers,
            time_spent: checkpoint.time_spent_seconds,
            saved_at: checkpoint.saved_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DisqualificationStatus {
    #[serde(default)]
    disqualification: Option<DisqualificationInfo>,
}

#[derive(Debug, Deserialize)]
struct DisqualificationInfo {
    #[serde(default)]
    reason: Option<String>,
}

/// 平台 HTTP API 客户端
pub struct HttpSessionApi {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpSessionApi {
    /// 创建新的 HTTP 客户端
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::request_failed("client", e))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.auth_token.clone(),
        })
    }

    /// 拼接学生端接口地址
    fn url(&self, path: &str) -> String {
        format!("{}/student/dashboard/{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if self.token.is_empty() {
            request
        } else {
            request.bearer_auth(&self.token)
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
        let request = self.authorize(self.client.get(self.url(path)));
        self.send(path, request).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<T>, ApiError> {
        let request = self.authorize(self.client.post(self.url(path)).json(body));
        self.send(path, request).await
    }

    /// 发送请求并解析统一返回结构
    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<Option<T>, ApiError> {
        debug!("调用平台接口: {}", endpoint);

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::request_failed(endpoint, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::request_failed(endpoint, e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|e| e.message);
            warn!("接口 {} 返回状态 {}: {:?}", endpoint, status, message);
            return Err(ApiError::BadStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        if body.trim().is_empty() {
            return Err(ApiError::EmptyResponse {
                endpoint: endpoint.to_string(),
            });
        }

        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|source| ApiError::Decode {
                endpoint: endpoint.to_string(),
                source,
            })?;

        if envelope.success == Some(false) {
            return Err(ApiError::Rejected {
                endpoint: endpoint.to_string(),
                message: envelope
                    .message
                    .unwrap_or_else(|| "未知错误".to_string()),
            });
        }

        Ok(envelope.data)
    }
}

#[async_trait]
impl SessionApi for HttpSessionApi {
    async fn fetch_session(&self, competition_id: &str) -> Result<SessionData, ApiError> {
        // 竞赛详情接口，data 为会话数据
        let path = format!("competitions/{}", competition_id);
        self.get::<SessionData>(&path)
            .await?
            .ok_or_else(|| ApiError::EmptyResponse {
                endpoint: path.clone(),
            })
    }

    async fn save_answers(
        &self,
        session: &SessionRef,
        checkpoint: &Checkpoint,
    ) -> Result<(), ApiError> {
        let path = format!("competitions/{}/save", session.competition_id);
        let payload = AnswersPayload::new(session, checkpoint);
        self.post::<_, serde_json::Value>(&path, &payload).await?;
        Ok(())
    }

    async fn submit_answers(
        &self,
        session: &SessionRef,
        checkpoint: &Checkpoint,
    ) -> Result<SubmitReceipt, ApiError> {
        let path = format!("competitions/{}/submit", session.competition_id);
        let payload = AnswersPayload::new(session, checkpoint);
        let receipt = self.post::<_, SubmitReceipt>(&path, &payload).await?;
        Ok(receipt.unwrap_or_default())
    }

    async fn join_competition(&self, competition_id: &str) -> Result<(), ApiError> {
        let path = format!("competitions/{}/join", competition_id);
        self.post::<_, serde_json::Value>(&path, &json!({})).await?;
        Ok(())
    }

    async fn disqualification_status(
        &self,
        competition_id: &str,
    ) -> Result<Option<String>, ApiError> {
        let body = json!({ "competitionId": competition_id });
        let status = self
            .post::<_, DisqualificationStatus>("competitions/disqualified", &body)
            .await?;

        Ok(status.and_then(|s| s.disqualification).map(|d| {
            d.reason
                .unwrap_or_else(|| "被竞赛管理员取消资格".to_string())
        }))
    }

    async fn report_disqualification(
        &self,
        competition_id: &str,
        reason: &str,
    ) -> Result<(), ApiError> {
        let path = format!("competitions/{}/disqualify", competition_id);
        let body = json!({ "competitionId": competition_id, "reason": reason });
        self.post::<_, serde_json::Value>(&path, &body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::answer::AnswerValue;
    use std::sync::Arc;

    #[test]
    fn test_envelope_rejection_parsing() {
        let body = r#"{"success":false,"message":"You have already submitted answers for this competition"}"#;
        let envelope: Envelope<serde_json::Value> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.success, Some(false));
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_envelope_without_data() {
        let envelope: Envelope<SessionData> =
            serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_session_envelope_decoding() {
        let body = r#"{
            "success": true,
            "data": {
                "sessionId": "s1",
                "deadline": "2026-05-01T10:00:00Z",
                "durationSeconds": 3600,
                "questions": [
                    {"questionId": "q1", "type": "single_choice", "options": [{"id": "A"}, {"id": "B"}]},
                    {"questionId": "q2", "type": "code"}
                ],
                "savedAnswers": [
                    {"questionId": "q1", "value": {"kind": "single_choice", "selected": "B"}}
                ]
            }
        }"#;
        let envelope: Envelope<SessionData> = serde_json::from_str(body).unwrap();
        let data = envelope.data.unwrap();
        assert_eq!(data.session_id, "s1");
        assert!(data.student_id.is_empty());
        assert_eq!(data.duration_seconds, 3600);
        assert_eq!(data.questions.len(), 2);
        assert_eq!(data.saved_answers.len(), 1);
        assert_eq!(data.saved_answers[0].value, AnswerValue::single("B"));
    }

    #[test]
    fn test_payload_shape() {
        let session = SessionRef {
            session_id: "s1".to_string(),
            competition_id: "c1".to_string(),
        };
        let answers: Arc<[Answer]> = vec![Answer {
            question_id: "q1".to_string(),
            value: AnswerValue::single("A"),
            last_modified_at: None,
        }]
        .into();
        let checkpoint = Checkpoint::new(answers, 42);

        let json = serde_json::to_value(AnswersPayload::new(&session, &checkpoint)).unwrap();
        assert_eq!(json["sessionId"], "s1");
        assert_eq!(json["timeSpent"], 42);
        assert_eq!(json["answers"][0]["questionId"], "q1");
        assert_eq!(json["answers"][0]["value"]["selected"], "A");
    }

    #[test]
    fn test_url_building() {
        let config = Config {
            api_base_url: "http://localhost:5000/api/".to_string(),
            ..Config::default()
        };
        let api = HttpSessionApi::new(&config).unwrap();
        assert_eq!(
            api.url("competitions/c1/save"),
            "http://localhost:5000/api/student/dashboard/competitions/c1/save"
        );
    }
}
