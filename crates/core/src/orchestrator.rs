//! Turns one submitted ticker into a [`PredictionView`].
//!
//! Every submission gets a fresh view and a new token. Results are merged into
//! the view only while their token is still current, so a slow answer to an
//! earlier query can never overwrite a newer one.

use crate::backend::{FetchError, FetchStage, PredictionBackend};
use crate::domain::analysis::ComprehensiveAnalysis;
use crate::domain::association::AssociationRule;
use crate::domain::contract::{AnalysisRequest, AssociationRequest, ForecastRequest};
use crate::domain::forecast::ForecastSeries;
use crate::domain::query::{PredictionQuery, VALIDATION_MESSAGE};
use crate::time::calendar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStrategy {
    /// Forecast, then associations, then analysis; stops at the first failure.
    #[default]
    Sequential,
    /// All three in flight at once, each merged as it resolves.
    Concurrent,
}

impl FromStr for FetchStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(FetchStrategy::Sequential),
            "concurrent" => Ok(FetchStrategy::Concurrent),
            other => anyhow::bail!("unknown fetch strategy {other:?} (expected sequential|concurrent)"),
        }
    }
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStrategy::Sequential => f.write_str("sequential"),
            FetchStrategy::Concurrent => f.write_str("concurrent"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryError {
    /// Empty symbol; nothing was sent.
    Validation,
    Fetch(FetchError),
}

impl QueryError {
    pub fn user_message(&self) -> String {
        match self {
            QueryError::Validation => VALIDATION_MESSAGE.to_string(),
            QueryError::Fetch(err) => err.user_message(),
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::Validation => f.write_str(VALIDATION_MESSAGE),
            QueryError::Fetch(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for QueryError {}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum QueryPhase {
    Idle,
    Validating,
    Fetching(FetchStage),
    Settled,
    /// Terminal, but keeps whatever earlier stages produced.
    Errored(QueryError),
}

/// View state of one query. Replaced wholesale on every submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionView {
    pub token: u64,
    pub query: Option<PredictionQuery>,
    pub phase: QueryPhase,
    pub forecast: Option<ForecastSeries>,
    /// `None` until the association call succeeds; `Some(vec![])` means it
    /// succeeded and found nothing.
    pub association_rules: Option<Vec<AssociationRule>>,
    pub analysis: Option<ComprehensiveAnalysis>,
    pub failures: Vec<FetchError>,
    /// True while any call of this query is outstanding.
    loading: bool,
    #[serde(skip)]
    pending: BTreeSet<FetchStage>,
}

impl Default for PredictionView {
    fn default() -> Self {
        Self::idle()
    }
}

enum StageOutcome {
    Forecast(ForecastSeries),
    Associations(Vec<AssociationRule>),
    Analysis(Box<ComprehensiveAnalysis>),
    Failed(FetchError),
}

impl PredictionView {
    pub fn idle() -> Self {
        Self {
            token: 0,
            query: None,
            phase: QueryPhase::Idle,
            forecast: None,
            association_rules: None,
            analysis: None,
            failures: Vec::new(),
            loading: false,
            pending: BTreeSet::new(),
        }
    }

    fn validating(token: u64) -> Self {
        Self {
            token,
            phase: QueryPhase::Validating,
            ..Self::idle()
        }
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, QueryPhase::Settled | QueryPhase::Errored(_))
    }

    pub fn error(&self) -> Option<&QueryError> {
        match &self.phase {
            QueryPhase::Errored(err) => Some(err),
            _ => None,
        }
    }

    pub fn failure(&self, stage: FetchStage) -> Option<&FetchError> {
        self.failures.iter().find(|f| f.stage == stage)
    }

    fn start(&mut self, stages: &[FetchStage]) {
        self.pending.extend(stages.iter().copied());
        self.refresh_phase();
    }

    fn resolve(&mut self, stage: FetchStage, outcome: StageOutcome) {
        self.pending.remove(&stage);
        match outcome {
            StageOutcome::Forecast(series) => self.forecast = Some(series),
            StageOutcome::Associations(rules) => self.association_rules = Some(rules),
            StageOutcome::Analysis(analysis) => self.analysis = Some(*analysis),
            StageOutcome::Failed(err) => self.failures.push(err),
        }
        self.refresh_phase();
    }

    /// Drops stages that will never run, e.g. after a sequential failure.
    fn abandon_pending(&mut self) {
        self.pending.clear();
        self.refresh_phase();
    }

    fn refresh_phase(&mut self) {
        self.loading = !self.pending.is_empty();
        if let Some(next) = self.pending.iter().next() {
            self.phase = QueryPhase::Fetching(*next);
            return;
        }
        self.phase = match self.failures.iter().min_by_key(|f| f.stage) {
            Some(err) => QueryPhase::Errored(QueryError::Fetch(err.clone())),
            None => QueryPhase::Settled,
        };
    }
}

pub struct Orchestrator<B> {
    backend: B,
    strategy: FetchStrategy,
    today: fn() -> NaiveDate,
    current: AtomicU64,
    view: Mutex<PredictionView>,
}

impl<B: PredictionBackend> Orchestrator<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            strategy: FetchStrategy::default(),
            today: calendar::utc_today,
            current: AtomicU64::new(0),
            view: Mutex::new(PredictionView::idle()),
        }
    }

    pub fn with_strategy(mut self, strategy: FetchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Reference date for forecast labels.
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn strategy(&self) -> FetchStrategy {
        self.strategy
    }

    pub fn current_token(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    pub async fn view(&self) -> PredictionView {
        self.view.lock().await.clone()
    }

    /// Runs one query to completion. Returns its final view, or `None` when a
    /// newer submission superseded it first.
    pub async fn submit(&self, raw_symbol: &str) -> Option<PredictionView> {
        let token = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.replace(PredictionView::validating(token)).await {
            return None;
        }

        let query = match PredictionQuery::parse(raw_symbol) {
            Ok(q) => q,
            Err(_) => {
                tracing::info!(token, raw_symbol, "rejected empty symbol");
                self.apply(token, |v| v.phase = QueryPhase::Errored(QueryError::Validation))
                    .await;
                return self.snapshot(token).await;
            }
        };

        tracing::info!(
            token,
            symbol = %query.symbol,
            strategy = %self.strategy,
            backend = self.backend.backend_name(),
            "prediction query started"
        );

        let q = query.clone();
        if !self.apply(token, move |v| v.query = Some(q)).await {
            return None;
        }

        match self.strategy {
            FetchStrategy::Sequential => self.run_sequential(token, &query).await,
            FetchStrategy::Concurrent => self.run_concurrent(token, &query).await,
        }

        let out = self.snapshot(token).await;
        match &out {
            Some(view) => tracing::info!(
                token,
                symbol = %query.symbol,
                forecast_points = view.forecast.as_ref().map(|f| f.len()).unwrap_or(0),
                rules = ?view.association_rules.as_ref().map(|r| r.len()),
                analysis = view.analysis.is_some(),
                failures = view.failures.len(),
                "prediction query finished"
            ),
            None => tracing::debug!(token, symbol = %query.symbol, "prediction query superseded"),
        }
        out
    }

    async fn run_sequential(&self, token: u64, query: &PredictionQuery) {
        // All stages stay pending until the chain ends, so the view never
        // looks settled between two calls.
        if !self.apply(token, |v| v.start(&FetchStage::ALL)).await {
            return;
        }
        for stage in FetchStage::ALL {
            let outcome = self.fetch(stage, query).await;
            let failed = matches!(outcome, StageOutcome::Failed(_));
            let merged = self
                .apply(token, move |v| {
                    v.resolve(stage, outcome);
                    if failed {
                        v.abandon_pending();
                    }
                })
                .await;
            if !merged || failed {
                return;
            }
        }
    }

    async fn run_concurrent(&self, token: u64, query: &PredictionQuery) {
        if !self.apply(token, |v| v.start(&FetchStage::ALL)).await {
            return;
        }
        let one = move |stage: FetchStage| async move {
            let outcome = self.fetch(stage, query).await;
            self.merge(token, stage, outcome).await;
        };
        tokio::join!(
            one(FetchStage::Forecast),
            one(FetchStage::Associations),
            one(FetchStage::Analysis),
        );
    }

    async fn fetch(&self, stage: FetchStage, query: &PredictionQuery) -> StageOutcome {
        let res = match stage {
            FetchStage::Forecast => self
                .backend
                .forecast(&ForecastRequest::from(query))
                .await
                .map(|prices| {
                    StageOutcome::Forecast(ForecastSeries::from_predictions(prices, (self.today)()))
                }),
            FetchStage::Associations => self
                .backend
                .stock_association(&AssociationRequest::from(query))
                .await
                .map(StageOutcome::Associations),
            FetchStage::Analysis => self
                .backend
                .comprehensive_analysis(&AnalysisRequest::from(query))
                .await
                .map(|a| StageOutcome::Analysis(Box::new(a))),
        };

        res.unwrap_or_else(|err| {
            tracing::warn!(
                symbol = %query.symbol,
                %stage,
                error = %err,
                "prediction call failed"
            );
            StageOutcome::Failed(err)
        })
    }

    async fn merge(&self, token: u64, stage: FetchStage, outcome: StageOutcome) -> bool {
        self.apply(token, move |v| v.resolve(stage, outcome)).await
    }

    /// Installs a fresh view unless a newer query already owns the state.
    async fn replace(&self, fresh: PredictionView) -> bool {
        let mut view = self.view.lock().await;
        if fresh.token < view.token {
            return false;
        }
        *view = fresh;
        true
    }

    async fn apply(&self, token: u64, f: impl FnOnce(&mut PredictionView)) -> bool {
        let mut view = self.view.lock().await;
        if view.token != token {
            tracing::debug!(token, current = view.token, "dropping stale result");
            return false;
        }
        f(&mut view);
        true
    }

    async fn snapshot(&self, token: u64) -> Option<PredictionView> {
        let view = self.view.lock().await;
        (view.token == token).then(|| view.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FetchErrorKind;
    use std::sync::Arc;
    use tokio::sync::Notify;

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn rule(a: &str, c: &str) -> AssociationRule {
        AssociationRule {
            antecedents: vec![a.to_string()],
            consequents: vec![c.to_string()],
            support: 0.35,
            confidence: 0.7,
            lift: 1.2,
        }
    }

    #[derive(Default)]
    struct FakeBackend {
        prices: Vec<f64>,
        rules: Vec<AssociationRule>,
        fail: Vec<(FetchStage, FetchErrorKind)>,
        calls: std::sync::Mutex<Vec<(FetchStage, serde_json::Value)>>,
        // Forecast calls for symbol "SLOW" signal `entered` and wait on `gate`.
        entered: Arc<Notify>,
        gate: Arc<Notify>,
        // Association calls for symbol "HOLD" do the same on these.
        assoc_entered: Arc<Notify>,
        assoc_gate: Arc<Notify>,
    }

    impl FakeBackend {
        fn ok(prices: Vec<f64>) -> Self {
            Self {
                prices,
                rules: vec![rule("AAPL", "MSFT")],
                ..Self::default()
            }
        }

        fn failing(mut self, stage: FetchStage, kind: FetchErrorKind) -> Self {
            self.fail.push((stage, kind));
            self
        }

        fn record(&self, stage: FetchStage, body: &impl Serialize) -> Result<(), FetchError> {
            self.calls
                .lock()
                .unwrap()
                .push((stage, serde_json::to_value(body).unwrap()));
            match self.fail.iter().find(|(s, _)| *s == stage) {
                Some((s, kind)) => Err(FetchError::new(*s, kind.clone())),
                None => Ok(()),
            }
        }

        fn calls(&self) -> Vec<(FetchStage, serde_json::Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl PredictionBackend for FakeBackend {
        fn backend_name(&self) -> &'static str {
            "fake"
        }

        async fn forecast(&self, req: &ForecastRequest) -> Result<Vec<f64>, FetchError> {
            if req.stock_symbol == "SLOW" {
                self.entered.notify_one();
                self.gate.notified().await;
            }
            self.record(FetchStage::Forecast, req)?;
            Ok(self.prices.clone())
        }

        async fn stock_association(
            &self,
            req: &AssociationRequest,
        ) -> Result<Vec<AssociationRule>, FetchError> {
            if req.tickers.first().map(String::as_str) == Some("HOLD") {
                self.assoc_entered.notify_one();
                self.assoc_gate.notified().await;
            }
            self.record(FetchStage::Associations, req)?;
            Ok(self.rules.clone())
        }

        async fn comprehensive_analysis(
            &self,
            req: &AnalysisRequest,
        ) -> Result<ComprehensiveAnalysis, FetchError> {
            self.record(FetchStage::Analysis, req)?;
            Ok(serde_json::from_value(serde_json::json!({
                "basic_info": {"company_name": req.symbol}
            }))
            .unwrap())
        }
    }

    fn orchestrator(backend: FakeBackend) -> Orchestrator<Arc<FakeBackend>> {
        Orchestrator::new(Arc::new(backend)).with_today(fixed_today)
    }

    #[tokio::test]
    async fn settles_with_all_three_results() {
        let backend = Arc::new(FakeBackend::ok(vec![100.0, 105.0, 110.0]));
        let orch = Orchestrator::new(backend.clone()).with_today(fixed_today);

        let view = orch.submit("  aapl ").await.unwrap();

        assert_eq!(view.phase, QueryPhase::Settled);
        assert!(!view.loading());
        let series = view.forecast.as_ref().unwrap();
        let dates: Vec<_> = series.points.iter().map(|p| calendar::format_ymd(p.date)).collect();
        assert_eq!(dates, vec!["2026-10-16", "2026-10-17", "2026-10-18"]);
        assert_eq!(format!("{:.2}", series.metrics().change_percent), "10.00");
        assert_eq!(view.association_rules.as_ref().unwrap().len(), 1);
        assert_eq!(view.analysis.as_ref().unwrap().basic_info.company_name, "AAPL");

        let calls = backend.calls();
        let stages: Vec<_> = calls.iter().map(|(s, _)| *s).collect();
        assert_eq!(stages, FetchStage::ALL.to_vec());
        assert_eq!(calls[0].1["stock_symbol"], "AAPL");
        assert_eq!(calls[1].1["tickers"][0], "AAPL");
        assert_eq!(calls[2].1["symbol"], "AAPL");
    }

    #[tokio::test]
    async fn empty_symbol_never_reaches_the_backend() {
        let backend = Arc::new(FakeBackend::ok(vec![1.0]));
        let orch = Orchestrator::new(backend.clone());

        for raw in ["", "   ", "\t\n"] {
            let view = orch.submit(raw).await.unwrap();
            assert_eq!(view.phase, QueryPhase::Errored(QueryError::Validation));
            assert_eq!(
                view.error().unwrap().user_message(),
                "Please enter a valid stock symbol"
            );
            assert!(!view.loading());
            assert!(view.query.is_none());
        }
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn later_failure_keeps_forecast_and_skips_remaining_calls() {
        let backend = Arc::new(
            FakeBackend::ok(vec![10.0, 11.0]).failing(FetchStage::Associations, FetchErrorKind::Connectivity),
        );
        let orch = Orchestrator::new(backend.clone()).with_today(fixed_today);

        let view = orch.submit("msft").await.unwrap();

        assert_eq!(view.forecast.as_ref().unwrap().len(), 2);
        assert!(view.association_rules.is_none());
        assert!(view.analysis.is_none());
        assert!(!view.loading());
        let err = view.error().unwrap();
        assert_eq!(
            err.user_message(),
            "No response from server. Please check your backend connection."
        );
        assert!(view.failure(FetchStage::Associations).is_some());
        assert_eq!(backend.calls().len(), 2);
    }

    #[tokio::test]
    async fn forecast_failure_is_terminal_in_sequential_mode() {
        let orch = orchestrator(FakeBackend::ok(vec![1.0]).failing(
            FetchStage::Forecast,
            FetchErrorKind::Server {
                status: 500,
                detail: "Error fetching stock data".to_string(),
            },
        ));

        let view = orch.submit("zzzz").await.unwrap();
        assert!(view.forecast.is_none());
        assert_eq!(
            view.error().unwrap().user_message(),
            "Server Error: Error fetching stock data"
        );
    }

    #[tokio::test]
    async fn concurrent_mode_merges_each_result_independently() {
        let backend = Arc::new(
            FakeBackend::ok(vec![5.0, 6.0])
                .failing(FetchStage::Forecast, FetchErrorKind::Unexpected),
        );
        let orch = Orchestrator::new(backend.clone())
            .with_strategy(FetchStrategy::Concurrent)
            .with_today(fixed_today);

        let view = orch.submit("goog").await.unwrap();

        assert!(view.forecast.is_none());
        assert_eq!(view.association_rules.as_ref().unwrap().len(), 1);
        assert!(view.analysis.is_some());
        assert!(matches!(
            view.phase,
            QueryPhase::Errored(QueryError::Fetch(FetchError { stage: FetchStage::Forecast, .. }))
        ));
        assert_eq!(backend.calls().len(), 3);
    }

    #[tokio::test]
    async fn concurrent_mode_reports_earliest_failed_stage() {
        let orch = orchestrator(
            FakeBackend::ok(vec![5.0])
                .failing(FetchStage::Analysis, FetchErrorKind::Unexpected)
                .failing(FetchStage::Associations, FetchErrorKind::Connectivity),
        )
        .with_strategy(FetchStrategy::Concurrent);

        let view = orch.submit("goog").await.unwrap();
        assert!(view.forecast.is_some());
        assert_eq!(view.failures.len(), 2);
        match view.error() {
            Some(QueryError::Fetch(err)) => assert_eq!(err.stage, FetchStage::Associations),
            other => panic!("unexpected error state: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_rules_settle_without_error() {
        let mut backend = FakeBackend::ok(vec![1.0, 2.0]);
        backend.rules.clear();
        let view = orchestrator(backend).submit("aapl").await.unwrap();
        assert_eq!(view.phase, QueryPhase::Settled);
        assert_eq!(view.association_rules, Some(vec![]));
    }

    #[tokio::test]
    async fn newer_query_supersedes_a_slow_one() {
        let backend = Arc::new(FakeBackend::ok(vec![1.0, 2.0, 3.0]));
        let orch = Arc::new(Orchestrator::new(backend.clone()).with_today(fixed_today));

        let slow = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.submit("slow").await })
        };
        backend.entered.notified().await;

        let in_flight = orch.view().await;
        assert!(in_flight.loading());
        assert_eq!(in_flight.phase, QueryPhase::Fetching(FetchStage::Forecast));

        let fresh = orch.submit("msft").await.unwrap();
        assert_eq!(fresh.token, 2);
        assert_eq!(fresh.phase, QueryPhase::Settled);

        backend.gate.notify_one();
        let stale = slow.await.unwrap();
        assert!(stale.is_none());

        let view = orch.view().await;
        assert_eq!(view.token, 2);
        assert_eq!(view.query.as_ref().unwrap().symbol, "MSFT");
        assert_eq!(view.phase, QueryPhase::Settled);
        assert_eq!(orch.current_token(), 2);
    }

    #[tokio::test]
    async fn stays_loading_between_sequential_stages() {
        let backend = Arc::new(FakeBackend::ok(vec![10.0, 12.0]));
        let orch = Arc::new(Orchestrator::new(backend.clone()).with_today(fixed_today));

        let run = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.submit("hold").await })
        };
        backend.assoc_entered.notified().await;

        let mid = orch.view().await;
        assert_eq!(mid.phase, QueryPhase::Fetching(FetchStage::Associations));
        assert!(mid.loading());
        assert!(!mid.is_terminal());
        assert_eq!(mid.forecast.as_ref().unwrap().len(), 2);
        assert!(mid.association_rules.is_none());

        backend.assoc_gate.notify_one();
        let done = run.await.unwrap().unwrap();
        assert_eq!(done.phase, QueryPhase::Settled);
        assert!(!done.loading());
        assert!(done.analysis.is_some());
    }

    #[tokio::test]
    async fn sequential_failure_clears_skipped_stages() {
        let orch = orchestrator(
            FakeBackend::ok(vec![1.0]).failing(FetchStage::Forecast, FetchErrorKind::Connectivity),
        );
        let view = orch.submit("aapl").await.unwrap();
        assert!(!view.loading());
        assert!(view.is_terminal());
        assert!(view.error().is_some());
    }

    #[tokio::test]
    async fn starts_idle() {
        let orch = orchestrator(FakeBackend::ok(vec![]));
        let view = orch.view().await;
        assert_eq!(view.phase, QueryPhase::Idle);
        assert!(!view.loading());
        assert!(!view.is_terminal());
    }

    #[test]
    fn parses_fetch_strategy() {
        assert_eq!("Concurrent".parse::<FetchStrategy>().unwrap(), FetchStrategy::Concurrent);
        assert_eq!(" sequential ".parse::<FetchStrategy>().unwrap(), FetchStrategy::Sequential);
        assert!("parallel".parse::<FetchStrategy>().is_err());
    }

    #[test]
    fn view_serializes_phase_with_detail() {
        let mut view = PredictionView::validating(3);
        view.start(&[FetchStage::Forecast]);
        let v = serde_json::to_value(&view).unwrap();
        assert_eq!(v["phase"], serde_json::json!({"state": "fetching", "detail": "forecast"}));
        assert_eq!(v["token"], 3);
        assert_eq!(v["loading"], true);
        assert!(v.get("pending").is_none());

        view.resolve(FetchStage::Forecast, StageOutcome::Forecast(ForecastSeries { points: vec![] }));
        let v = serde_json::to_value(&view).unwrap();
        assert_eq!(v["loading"], false);
        assert_eq!(v["phase"], serde_json::json!({"state": "settled"}));
    }
}
