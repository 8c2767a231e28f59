use crate::domain::analysis::ComprehensiveAnalysis;
use crate::domain::association::AssociationRule;
use crate::domain::contract::{AnalysisRequest, AssociationRequest, ForecastRequest};

pub mod error;
pub mod http;

pub use error::{FetchError, FetchErrorKind, FetchStage};
pub use http::HttpPredictionBackend;

/// The external forecasting/analysis service. One method per endpoint; each call
/// is independent and either yields its payload or a classified failure.
#[async_trait::async_trait]
pub trait PredictionBackend: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Raw predicted prices, in order.
    async fn forecast(&self, req: &ForecastRequest) -> Result<Vec<f64>, FetchError>;

    async fn stock_association(
        &self,
        req: &AssociationRequest,
    ) -> Result<Vec<AssociationRule>, FetchError>;

    async fn comprehensive_analysis(
        &self,
        req: &AnalysisRequest,
    ) -> Result<ComprehensiveAnalysis, FetchError>;
}

#[async_trait::async_trait]
impl<T: PredictionBackend + ?Sized> PredictionBackend for std::sync::Arc<T> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    async fn forecast(&self, req: &ForecastRequest) -> Result<Vec<f64>, FetchError> {
        (**self).forecast(req).await
    }

    async fn stock_association(
        &self,
        req: &AssociationRequest,
    ) -> Result<Vec<AssociationRule>, FetchError> {
        (**self).stock_association(req).await
    }

    async fn comprehensive_analysis(
        &self,
        req: &AnalysisRequest,
    ) -> Result<ComprehensiveAnalysis, FetchError> {
        (**self).comprehensive_analysis(req).await
    }
}
