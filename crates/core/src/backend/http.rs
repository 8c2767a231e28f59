use crate::backend::error::{FetchError, FetchErrorKind, FetchStage};
use crate::backend::PredictionBackend;
use crate::config::Settings;
use crate::domain::analysis::ComprehensiveAnalysis;
use crate::domain::association::AssociationRule;
use crate::domain::contract::{
    server_error_detail, AnalysisRequest, AssociationRequest, AssociationResponse,
    ForecastRequest, ForecastResponse,
};
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpPredictionBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPredictionBackend {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(&settings.prediction_api_url, settings.request_timeout)
    }

    /// `timeout` applies to each call separately.
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        anyhow::ensure!(!base_url.trim().is_empty(), "prediction API base URL is empty");

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build prediction service http client")?;

        Ok(Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, stage: FetchStage) -> String {
        format!("{}{}", self.base_url, stage.path())
    }

    async fn post_json<B, R>(&self, stage: FetchStage, body: &B) -> Result<R, FetchError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let res = self
            .http
            .post(self.url(stage))
            .json(body)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(stage, &e))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(stage, &e))?;

        if !status.is_success() {
            let detail = server_error_detail(&text);
            tracing::warn!(
                %stage,
                http_status = %status,
                %detail,
                "prediction service returned an error"
            );
            return Err(FetchError::server(stage, status.as_u16(), detail));
        }

        serde_json::from_str::<R>(&text).map_err(|e| {
            FetchError::new(stage, FetchErrorKind::Unexpected)
                .with_cause(format!("failed to decode {stage} response: {e}"))
        })
    }
}

#[async_trait::async_trait]
impl PredictionBackend for HttpPredictionBackend {
    fn backend_name(&self) -> &'static str {
        "http_json"
    }

    async fn forecast(&self, req: &ForecastRequest) -> Result<Vec<f64>, FetchError> {
        let res: ForecastResponse = self.post_json(FetchStage::Forecast, req).await?;
        Ok(res.into_predictions())
    }

    async fn stock_association(
        &self,
        req: &AssociationRequest,
    ) -> Result<Vec<AssociationRule>, FetchError> {
        let res: AssociationResponse = self.post_json(FetchStage::Associations, req).await?;
        Ok(res.rules)
    }

    async fn comprehensive_analysis(
        &self,
        req: &AnalysisRequest,
    ) -> Result<ComprehensiveAnalysis, FetchError> {
        self.post_json(FetchStage::Analysis, req).await
    }
}
