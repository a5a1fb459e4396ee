//! Dashboard view controller.
//!
//! Drives one dashboard through its render cycles:
//!
//! ```text
//! load ─► fetch ─► classify mode ─► adapt layout ─► charts, tables,
//!                                                   recommendations ─► Ready
//!            └─► FetchError ─► Failed(ErrorPanel)
//! ```
//!
//! Every fetch takes a [`RequestTicket`]. Only the most recently issued
//! ticket may apply its result; anything older is discarded as stale, so a
//! slow response can never overwrite a newer one.
//!
//! Upload and delete are side entry points. On success they schedule a full
//! reload after the configured delay; on failure they report an inline
//! message and leave the current view untouched.

use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{Value, json};

use crate::analytics::{CycleEvent, EventKind, EventLog, Outcome};
use crate::charts::{ChartRegistry, ChartRenderer, ChartSpec};
use crate::client::{ActionError, Backend, DataSource, FetchError, UploadForm, data_path};
use crate::mode::{self, Resolution};
use crate::payload::{AnalysisPayload, Scalar};
use crate::recommendations::{self, RecommendationList};
use crate::view::banner::{self, ModeBanner, SourceBanner};
use crate::view::tables::{self, DensityCard, Row};
use crate::view::{self, Layout, RegionId};

/// Default delay between a successful action and the forced reload.
pub const DEFAULT_RELOAD_DELAY: Duration = Duration::from_millis(1500);

const UNDER_DEVELOPMENT: &str =
    "This resource type analyzer is under development. Please check back soon!";
const MISSING_FILE_NOTE: &str = "Note: File 1 (App Service Plans CSV) is required. File 2 \
     (App Services CSV) is optional but enhances analysis.";

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Sequencing token for one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Whether a completed fetch was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// A newer request was issued first; the result was dropped.
    Stale,
}

// ---------------------------------------------------------------------------
// View state
// ---------------------------------------------------------------------------

/// One summary card with its current label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryCard {
    pub region: RegionId,
    pub title: String,
    pub value: String,
}

/// Everything the dashboard shows for one successful render cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub resource_type: String,
    pub source: DataSource,
    pub resolution: Resolution,
    pub layout: Layout,
    pub mode_banner: Option<ModeBanner>,
    pub source_banner: Option<SourceBanner>,
    pub summary: Vec<SummaryCard>,
    pub recommendations: Option<RecommendationList>,
    pub tier_rows: Vec<Row>,
    pub group_rows: Vec<Row>,
    pub density: Vec<DensityCard>,
}

impl DashboardView {
    /// Build the view for a payload and the chart specs that go with it.
    pub fn compose(
        resource_type: &str,
        source: DataSource,
        payload: &AnalysisPayload,
        renderer: &ChartRenderer,
    ) -> (Self, Vec<ChartSpec>) {
        let resolution = mode::classify(payload);
        let mode = resolution.mode;
        let layout = view::adapt(mode, payload);

        let charts = view::chart_plan(mode, payload, &layout)
            .into_iter()
            .filter_map(|(region, kind, series)| renderer.render_into(region.dom_id(), kind, series))
            .collect();

        let summary = payload
            .summary
            .as_ref()
            .map(|s| {
                [
                    (RegionId::PlansCard, &s.total_plans),
                    (RegionId::AppsCard, &s.total_apps),
                    (RegionId::InstancesCard, &s.total_instances),
                    (RegionId::AvgAppsCard, &s.avg_apps_per_plan),
                ]
                .into_iter()
                .filter(|(region, _)| layout.is_visible(*region))
                .map(|(region, value)| SummaryCard {
                    region,
                    title: layout.title(region).to_string(),
                    value: value.as_ref().map(Scalar::to_string).unwrap_or_else(|| "-".to_string()),
                })
                .collect()
            })
            .unwrap_or_default();

        let recommendations = payload
            .recommendations
            .as_deref()
            .map(|recs| recommendations::render(recs, &payload.recommendation_definitions));

        let tier_rows = payload
            .tables
            .as_ref()
            .and_then(|t| t.tier_stats.as_deref())
            .map(tables::tier_rows)
            .unwrap_or_default();
        let group_rows = payload
            .tables
            .as_ref()
            .and_then(|t| t.group_rows())
            .map(tables::group_rows)
            .unwrap_or_default();
        let density = if layout.is_visible(RegionId::Density) {
            tables::density_cards(payload.density())
        } else {
            Vec::new()
        };

        let view = Self {
            resource_type: resource_type.to_string(),
            source,
            resolution,
            mode_banner: banner::mode_banner(mode, payload),
            source_banner: banner::source_banner(payload),
            layout,
            summary,
            recommendations,
            tier_rows,
            group_rows,
            density,
        };
        (view, charts)
    }
}

/// Which kind of failure an error panel describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    NoData,
    MissingFile,
    /// Transport failure, unexpected status or undecodable payload.
    Failed,
    /// Informational: the backend has no analyzer for this resource type.
    NotImplemented,
}

/// Recovery actions an error panel offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelAction {
    UploadFiles,
    BackHome,
    ClearAndReupload,
    ReloadPage,
}

impl PanelAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::UploadFiles => "Upload CSV Files",
            Self::BackHome => "Back to Home",
            Self::ClearAndReupload => "Clear & Upload Correct Files",
            Self::ReloadPage => "Reload Page",
        }
    }
}

/// Terminal state of a failed render cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPanel {
    pub kind: PanelKind,
    pub heading: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Data source in effect, echoed on generic failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<DataSource>,
    /// Endpoint that was requested, echoed on generic failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub actions: Vec<PanelAction>,
}

impl ErrorPanel {
    pub fn from_fetch_error(error: &FetchError, resource_type: &str, source: DataSource) -> Self {
        match error {
            FetchError::NoData { message } => Self {
                kind: PanelKind::NoData,
                heading: "No Data Available".to_string(),
                message: message.clone(),
                note: None,
                source: None,
                url: None,
                actions: vec![PanelAction::UploadFiles, PanelAction::BackHome],
            },
            FetchError::MissingRequiredFile { message } => Self {
                kind: PanelKind::MissingFile,
                heading: "Missing Required File".to_string(),
                message: message.clone(),
                note: Some(MISSING_FILE_NOTE.to_string()),
                source: None,
                url: None,
                actions: vec![PanelAction::ClearAndReupload, PanelAction::BackHome],
            },
            other => Self {
                kind: PanelKind::Failed,
                heading: "Error loading data".to_string(),
                message: other.to_string(),
                note: None,
                source: Some(source),
                url: Some(data_path(resource_type, source)),
                actions: vec![PanelAction::ReloadPage],
            },
        }
    }

    pub fn not_implemented(payload: &AnalysisPayload) -> Self {
        Self {
            kind: PanelKind::NotImplemented,
            heading: payload
                .message
                .clone()
                .unwrap_or_else(|| "Not implemented yet".to_string()),
            message: UNDER_DEVELOPMENT.to_string(),
            note: None,
            source: None,
            url: None,
            actions: vec![PanelAction::BackHome],
        }
    }

    fn outcome(&self) -> Outcome {
        match self.kind {
            PanelKind::NoData => Outcome::NoData,
            PanelKind::MissingFile => Outcome::MissingFile,
            PanelKind::Failed => Outcome::Error,
            PanelKind::NotImplemented => Outcome::NotImplemented,
        }
    }
}

/// What the dashboard currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Loading,
    Ready(Box<DashboardView>),
    Failed(ErrorPanel),
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Result of an upload or delete as the user sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// Message shown while waiting; a full reload follows after `reload_after`.
    Succeeded {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
        #[serde(serialize_with = "serialize_millis")]
        reload_after: Duration,
    },
    /// Inline error; the view was left untouched.
    Failed { message: String },
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl ActionOutcome {
    pub fn message(&self) -> &str {
        match self {
            Self::Succeeded { message, .. } | Self::Failed { message } => message,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Owns the dashboard state and the chart instances for one resource type.
pub struct DashboardViewController<B: Backend> {
    backend: B,
    resource_type: String,
    source: DataSource,
    renderer: ChartRenderer,
    charts: ChartRegistry,
    state: ViewState,
    last_issued: u64,
    reload_delay: Duration,
    pending_reload: Option<Instant>,
    log: EventLog,
}

impl<B: Backend> DashboardViewController<B> {
    pub fn new(backend: B, resource_type: impl Into<String>, source: DataSource) -> Self {
        Self {
            backend,
            resource_type: resource_type.into(),
            source,
            renderer: ChartRenderer::new(RegionId::CHARTS.map(RegionId::dom_id)),
            charts: ChartRegistry::new(),
            state: ViewState::Loading,
            last_issued: 0,
            reload_delay: DEFAULT_RELOAD_DELAY,
            pending_reload: None,
            log: EventLog::disabled(),
        }
    }

    pub fn with_reload_delay(mut self, delay: Duration) -> Self {
        self.reload_delay = delay;
        self
    }

    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = log;
        self
    }

    /// Restrict chart rendering to the given canvas ids.
    pub fn with_mounts<I, S>(mut self, mounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.renderer = ChartRenderer::new(mounts);
        self
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn view(&self) -> Option<&DashboardView> {
        match &self.state {
            ViewState::Ready(view) => Some(view),
            _ => None,
        }
    }

    pub fn charts(&self) -> &ChartRegistry {
        &self.charts
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The current state with its charts, as JSON.
    pub fn snapshot(&self) -> Value {
        match &self.state {
            ViewState::Ready(view) => {
                let charts: Vec<&ChartSpec> = self.charts.iter().collect();
                json!({ "state": "ready", "view": view, "charts": charts })
            }
            ViewState::Failed(panel) => json!({ "state": "failed", "panel": panel }),
            ViewState::Loading => json!({ "state": "loading" }),
        }
    }

    /// Deadline of the reload scheduled by a successful action.
    pub fn pending_reload(&self) -> Option<Instant> {
        self.pending_reload
    }

    // -----------------------------------------------------------------------
    // Render cycle
    // -----------------------------------------------------------------------

    /// Issue a new request id and show the loading state.
    pub fn begin_fetch(&mut self) -> RequestTicket {
        self.last_issued += 1;
        self.state = ViewState::Loading;
        RequestTicket(self.last_issued)
    }

    /// Perform the fetch for a ticket without applying it.
    pub fn fetch(&self, _ticket: RequestTicket) -> Result<AnalysisPayload, FetchError> {
        self.backend.fetch_payload(&self.resource_type, self.source)
    }

    /// Apply a fetch result, unless a newer request has been issued since.
    pub fn complete(
        &mut self,
        ticket: RequestTicket,
        result: Result<AnalysisPayload, FetchError>,
    ) -> Completion {
        let event = CycleEvent::now(
            EventKind::Render,
            &self.resource_type,
            self.source.as_str(),
            Outcome::Stale,
        )
        .with_request(ticket.id());

        if ticket.id() != self.last_issued {
            self.log.record(&event);
            return Completion::Stale;
        }

        match result {
            Ok(payload) if payload.is_not_implemented() => {
                self.fail(ErrorPanel::not_implemented(&payload), event);
            }
            Ok(payload) => {
                let (view, specs) = DashboardView::compose(
                    &self.resource_type,
                    self.source,
                    &payload,
                    &self.renderer,
                );
                self.charts.replace_all(specs);
                let mut event = event.with_mode(view.resolution.mode.as_str());
                event.outcome = Outcome::Ready;
                if let Some(conflict) = view.resolution.conflict {
                    event = event.with_detail(format!("insights claimed {conflict}"));
                }
                self.log.record(&event);
                self.state = ViewState::Ready(Box::new(view));
            }
            Err(error) => {
                let panel = ErrorPanel::from_fetch_error(&error, &self.resource_type, self.source);
                let event = event.with_detail(error.to_string());
                self.fail(panel, event);
            }
        }
        Completion::Applied
    }

    fn fail(&mut self, panel: ErrorPanel, mut event: CycleEvent) {
        self.charts.clear();
        event.outcome = panel.outcome();
        self.log.record(&event);
        self.state = ViewState::Failed(panel);
    }

    /// Run a full render cycle.
    pub fn load(&mut self) -> &ViewState {
        self.pending_reload = None;
        let ticket = self.begin_fetch();
        let result = self.fetch(ticket);
        self.complete(ticket, result);
        &self.state
    }

    /// Change the data source and reload.
    pub fn switch_source(&mut self, source: DataSource) -> &ViewState {
        self.source = source;
        self.load()
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// Validate and upload a form. Success schedules a reload.
    pub fn upload(&mut self, form: &UploadForm) -> ActionOutcome {
        let result = form
            .prepare()
            .and_then(|prepared| self.backend.upload(&self.resource_type, &prepared))
            .and_then(|reply| reply.into_result("Upload failed"));

        match result {
            Ok(reply) => {
                let detail = reply
                    .filenames
                    .as_ref()
                    .map(|names| format!("{} file(s): {}", names.len(), names.join(", ")));
                self.action_succeeded(
                    EventKind::Upload,
                    format!("{} Reloading analysis...", reply.message),
                    detail,
                )
            }
            Err(error) => {
                let message = match &error {
                    ActionError::Invalid(m) | ActionError::Rejected(m) => m.clone(),
                    other => format!("Error uploading file(s): {other}"),
                };
                self.action_failed(EventKind::Upload, message)
            }
        }
    }

    /// Delete every uploaded file. Success schedules a reload.
    pub fn delete_uploads(&mut self) -> ActionOutcome {
        let result = self
            .backend
            .delete_uploads(&self.resource_type)
            .and_then(|reply| reply.into_result("Delete failed"));

        match result {
            Ok(reply) => self.action_succeeded(
                EventKind::Delete,
                reply.message,
                Some("Data cleared. Reloading...".to_string()),
            ),
            Err(ActionError::Rejected(e) | ActionError::Invalid(e)) => {
                self.action_failed(EventKind::Delete, format!("Error: {e}"))
            }
            Err(_) => self.action_failed(
                EventKind::Delete,
                "Failed to delete files. Please try again.".to_string(),
            ),
        }
    }

    fn action_succeeded(
        &mut self,
        kind: EventKind,
        message: String,
        detail: Option<String>,
    ) -> ActionOutcome {
        self.pending_reload = Some(Instant::now() + self.reload_delay);
        self.log.record(&CycleEvent::now(
            kind,
            &self.resource_type,
            self.source.as_str(),
            Outcome::Ready,
        ));
        ActionOutcome::Succeeded {
            message,
            detail,
            reload_after: self.reload_delay,
        }
    }

    fn action_failed(&mut self, kind: EventKind, message: String) -> ActionOutcome {
        self.log.record(
            &CycleEvent::now(kind, &self.resource_type, self.source.as_str(), Outcome::Rejected)
                .with_detail(message.clone()),
        );
        ActionOutcome::Failed { message }
    }

    /// Run the scheduled reload if its deadline has passed. Returns whether
    /// a reload ran.
    pub fn poll_reload(&mut self, now: Instant) -> bool {
        match self.pending_reload {
            Some(deadline) if now >= deadline => {
                self.load();
                true
            }
            _ => false,
        }
    }

    /// Block until the scheduled reload is due, then run it.
    pub fn wait_for_reload(&mut self) -> bool {
        let Some(deadline) = self.pending_reload else {
            return false;
        };
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        }
        self.poll_reload(Instant::now())
    }

    /// Fetch the recommendations export document.
    pub fn export(&self) -> Result<Value, FetchError> {
        let result = self.backend.export_recommendations();
        let outcome = if result.is_ok() {
            Outcome::Ready
        } else {
            Outcome::Error
        };
        self.log.record(&CycleEvent::now(
            EventKind::Export,
            &self.resource_type,
            self.source.as_str(),
            outcome,
        ));
        result
    }
}
