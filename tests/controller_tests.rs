/// Dashboard controller tests.
///
/// Drives full render cycles and actions against an in-memory backend.
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde_json::{Value, json};

use plansight::client::{
    ActionError, ActionReply, Backend, DataSource, FetchError, PreparedUpload, UploadForm,
};
use plansight::controller::{
    ActionOutcome, Completion, DashboardViewController, PanelAction, PanelKind, ViewState,
};
use plansight::mode::Mode;
use plansight::payload::AnalysisPayload;
use plansight::view::RegionId;

// ---------------------------------------------------------------------------
// Fake backend
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeBackend {
    payloads: RefCell<VecDeque<Result<AnalysisPayload, FetchError>>>,
    sources: RefCell<Vec<DataSource>>,
    upload_reply: RefCell<Option<Result<ActionReply, ActionError>>>,
    uploaded: RefCell<Vec<String>>,
    delete_reply: RefCell<Option<Result<ActionReply, ActionError>>>,
    deletes: Cell<usize>,
}

impl FakeBackend {
    fn with_payloads(payloads: impl IntoIterator<Item = Result<AnalysisPayload, FetchError>>) -> Self {
        Self {
            payloads: RefCell::new(payloads.into_iter().collect()),
            ..Self::default()
        }
    }
}

impl Backend for FakeBackend {
    fn fetch_payload(
        &self,
        _resource_type: &str,
        source: DataSource,
    ) -> Result<AnalysisPayload, FetchError> {
        self.sources.borrow_mut().push(source);
        self.payloads
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(AnalysisPayload::default()))
    }

    fn upload(
        &self,
        _resource_type: &str,
        upload: &PreparedUpload,
    ) -> Result<ActionReply, ActionError> {
        self.uploaded
            .borrow_mut()
            .extend(upload.filenames().into_iter().map(str::to_string));
        self.upload_reply
            .borrow_mut()
            .take()
            .unwrap_or_else(|| Ok(ActionReply::ok("Uploaded.")))
    }

    fn delete_uploads(&self, _resource_type: &str) -> Result<ActionReply, ActionError> {
        self.deletes.set(self.deletes.get() + 1);
        self.delete_reply
            .borrow_mut()
            .take()
            .unwrap_or_else(|| Ok(ActionReply::ok("Deleted 2 file(s).")))
    }

    fn export_recommendations(&self) -> Result<Value, FetchError> {
        Ok(json!({ "recommendations": [] }))
    }
}

fn payload(value: Value) -> AnalysisPayload {
    serde_json::from_value(value).unwrap()
}

fn plans_payload() -> AnalysisPayload {
    payload(json!({
        "summary": { "total_plans": 5, "total_apps": 12, "total_instances": 20 },
        "charts": { "tier": { "labels": ["P1v2"], "plans": [5], "apps": [12], "instances": [20] } },
        "recommendations": [],
    }))
}

fn controller(backend: FakeBackend) -> DashboardViewController<FakeBackend> {
    DashboardViewController::new(backend, "app-service", DataSource::Csv)
        .with_reload_delay(Duration::ZERO)
}

fn temp_csv(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("plansight_{}_{name}", std::process::id()));
    std::fs::write(&path, "Name,Tier\nplan-a,P1v2\n").unwrap();
    path
}

// ---------------------------------------------------------------------------
// Render cycles
// ---------------------------------------------------------------------------

#[test]
fn plans_only_render_cycle() {
    let mut c = controller(FakeBackend::with_payloads([Ok(plans_payload())]));
    c.load();

    let view = c.view().expect("dashboard should be ready");
    assert_eq!(view.resolution.mode, Mode::PlansOnly);
    assert!(view.layout.is_visible(RegionId::InstancesCard));

    let tier = c.charts().get("tierChart").expect("tier chart rendered");
    assert_eq!(tier.labels(), vec!["P1v2"]);
    assert_eq!(tier.config["data"]["datasets"].as_array().unwrap().len(), 3);
    assert_eq!(tier.dataset_label(2), Some("Instances"));

    let values: Vec<&str> = view.summary.iter().map(|card| card.value.as_str()).collect();
    assert_eq!(values[..3], ["5", "12", "20"]);
}

#[test]
fn no_data_shows_panel_and_clears_charts() {
    let mut c = controller(FakeBackend::with_payloads([
        Ok(plans_payload()),
        Err(FetchError::NoData {
            message: "No data uploaded yet".to_string(),
        }),
    ]));
    c.load();
    assert_eq!(c.charts().len(), 1);

    c.load();
    match c.state() {
        ViewState::Failed(panel) => {
            assert_eq!(panel.kind, PanelKind::NoData);
            assert_eq!(panel.heading, "No Data Available");
            assert_eq!(panel.message, "No data uploaded yet");
            assert!(panel.actions.contains(&PanelAction::UploadFiles));
        }
        other => panic!("expected error panel, got {other:?}"),
    }
    assert!(c.charts().is_empty());
}

#[test]
fn not_implemented_resource_type() {
    let mut c = controller(FakeBackend::with_payloads([Ok(payload(json!({
        "status": "not_implemented",
        "message": "Functions analysis coming soon",
    })))]));
    c.load();
    match c.state() {
        ViewState::Failed(panel) => {
            assert_eq!(panel.kind, PanelKind::NotImplemented);
            assert_eq!(panel.heading, "Functions analysis coming soon");
            assert_eq!(panel.actions, vec![PanelAction::BackHome]);
        }
        other => panic!("expected not-implemented panel, got {other:?}"),
    }
}

#[test]
fn stale_response_is_discarded() {
    let mut c = controller(FakeBackend::default());
    let first = c.begin_fetch();
    let second = c.begin_fetch();
    assert!(second > first);

    let stale = payload(json!({ "charts": { "plans": { "labels": ["old"], "apps": [1] } } }));
    assert_eq!(c.complete(first, Ok(stale)), Completion::Stale);
    assert_eq!(c.state(), &ViewState::Loading);
    assert!(c.charts().is_empty());

    assert_eq!(c.complete(second, Ok(plans_payload())), Completion::Applied);
    assert_eq!(c.view().unwrap().resolution.mode, Mode::PlansOnly);
}

#[test]
fn switch_source_refetches_with_json() {
    let mut c = controller(FakeBackend::default());
    c.load();
    c.switch_source(DataSource::Json);
    assert_eq!(c.source(), DataSource::Json);
    assert_eq!(
        *c.backend().sources.borrow(),
        vec![DataSource::Csv, DataSource::Json]
    );
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

#[test]
fn upload_success_schedules_reload() {
    let plans = temp_csv("plans.csv");
    let mut c = controller(FakeBackend::with_payloads([
        Err(FetchError::NoData {
            message: "nothing yet".to_string(),
        }),
        Ok(plans_payload()),
    ]));
    c.load();

    let outcome = c.upload(&UploadForm::plans_and_apps(Some(plans.clone()), None));
    assert!(outcome.is_success());
    assert_eq!(outcome.message(), "Uploaded. Reloading analysis...");
    assert_eq!(c.backend().uploaded.borrow().len(), 1);
    // The view is not refreshed until the reload runs.
    assert!(matches!(c.state(), ViewState::Failed(_)));

    assert!(c.pending_reload().is_some());
    assert!(c.poll_reload(Instant::now()));
    assert!(c.view().is_some());
    assert!(c.pending_reload().is_none());

    let _ = std::fs::remove_file(plans);
}

#[test]
fn upload_rejection_leaves_view_untouched() {
    let plans = temp_csv("rejected.csv");
    let backend = FakeBackend::with_payloads([Ok(plans_payload())]);
    *backend.upload_reply.borrow_mut() = Some(Ok(ActionReply::failed("Invalid CSV format")));
    let mut c = controller(backend);
    c.load();
    let before = c.state().clone();

    let outcome = c.upload(&UploadForm::plans_and_apps(Some(plans.clone()), None));
    assert_eq!(
        outcome,
        ActionOutcome::Failed {
            message: "Invalid CSV format".to_string()
        }
    );
    assert_eq!(c.state(), &before);
    assert!(c.pending_reload().is_none());

    let _ = std::fs::remove_file(plans);
}

#[test]
fn empty_upload_form_is_rejected_before_sending() {
    let mut c = controller(FakeBackend::default());
    let outcome = c.upload(&UploadForm::plans_and_apps(None, None));
    assert_eq!(outcome.message(), "Please select at least one file to upload");
    assert!(c.backend().uploaded.borrow().is_empty());
}

#[test]
fn delete_success_and_failure() {
    let backend = FakeBackend::default();
    let mut c = controller(backend);
    c.load();

    match c.delete_uploads() {
        ActionOutcome::Succeeded { message, detail, .. } => {
            assert_eq!(message, "Deleted 2 file(s).");
            assert_eq!(detail.as_deref(), Some("Data cleared. Reloading..."));
        }
        other => panic!("expected success, got {other:?}"),
    }

    *c.backend().delete_reply.borrow_mut() = Some(Err(ActionError::Transport {
        url: "http://127.0.0.1:5000/delete-uploads/app-service".to_string(),
        detail: "connection refused".to_string(),
    }));
    assert_eq!(
        c.delete_uploads().message(),
        "Failed to delete files. Please try again."
    );
    assert_eq!(c.backend().deletes.get(), 2);
}

#[test]
fn export_returns_backend_document() {
    let c = controller(FakeBackend::default());
    assert_eq!(c.export().unwrap(), json!({ "recommendations": [] }));
}
