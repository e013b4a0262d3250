/// 后端 HTTP 客户端
///
/// 封装所有与试卷 API 相关的调用逻辑
use crate::clients::TestApi;
use crate::config::Config;
use crate::error::{ApiError, AppError};
use crate::models::test_bundle::{
    Response, SavedTest, SubmitReceipt, TestDetail, TestForEdit, TestPayload,
};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

/// 试卷 API 客户端
pub struct HttpTestApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpTestApi {
    /// 创建新的客户端
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.token.is_empty() {
            request
        } else {
            request.bearer_auth(&self.token)
        }
    }

    /// 发送请求并解析 JSON 响应
    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        debug!("正在调用 API: {}", endpoint);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Api(ApiError::BadStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            })
            .into());
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("无法解析 API 响应: {}", endpoint))
    }
}

impl TestApi for HttpTestApi {
    async fn get_test_for_edit(&self, test_id: i64) -> Result<TestForEdit> {
        let endpoint = self.url(&format!("/tests/{}/edit", test_id));
        self.send(&endpoint, self.client.get(&endpoint)).await
    }

    async fn create_test(&self, payload: &TestPayload) -> Result<SavedTest> {
        let endpoint = self.url("/tests");
        self.send(&endpoint, self.client.post(&endpoint).json(payload))
            .await
    }

    async fn update_test(&self, test_id: i64, payload: &TestPayload) -> Result<SavedTest> {
        let endpoint = self.url(&format!("/tests/{}", test_id));
        self.send(&endpoint, self.client.put(&endpoint).json(payload))
            .await
    }

    async fn get_test_detail(&self, test_id: i64) -> Result<TestDetail> {
        let endpoint = self.url(&format!("/tests/{}", test_id));
        self.send(&endpoint, self.client.get(&endpoint)).await
    }

    async fn submit_test(&self, test_id: i64, responses: &[Response]) -> Result<SubmitReceipt> {
        let endpoint = self.url(&format!("/tests/{}/submit", test_id));
        let body = json!({ "responses": responses });
        self.send(&endpoint, self.client.post(&endpoint).json(&body))
            .await
    }
}
