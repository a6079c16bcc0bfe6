//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose list/detail/login screen use-cases to Dart via FRB.
//! - Own the process-wide runtime and service graph behind `app_init`.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Failures are returned as envelope messages; the same failures are
//!   also queued as notices for `drain_notices`.
//! - Calls made before `app_init` fail with a stable message.

use once_cell::sync::OnceCell;
use pokecapture_core::{
    auth_provider_from_config, core_version as core_version_inner,
    init_logging as init_logging_inner, ping as ping_inner, AppContext, CoreConfig, CoreError,
    CoreResult, Entity, Notice, ScreenScope, StartupError,
};
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::runtime::Runtime;
use tokio::sync::mpsc::UnboundedReceiver;

const NOT_INITIALIZED: &str = "core not initialized; call app_init first";

static APP: OnceCell<FfiApp> = OnceCell::new();

struct FfiApp {
    runtime: Runtime,
    context: AppContext,
    notices: Mutex<UnboundedReceiver<Notice>>,
    screens: Mutex<HashMap<u64, Arc<ScreenScope>>>,
    next_screen_id: AtomicU64,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and an error message otherwise.
/// Repeating the same `level + log_dir` is idempotent.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Builds the runtime and service graph.
///
/// Input semantics:
/// - `catalog_url`: overrides the catalog base URL when non-blank.
/// - `db_path`: SQLite file for capture records; blank keeps them in memory.
///
/// Other settings come from `POKECAPTURE_*` environment variables.
///
/// # FFI contract
/// - Returns empty string on success, error message on failure.
/// - First successful call wins; later calls are no-ops.
pub fn app_init(catalog_url: Option<String>, db_path: Option<String>) -> String {
    match APP.get_or_try_init(|| build_app(catalog_url, db_path)) {
        Ok(_) => String::new(),
        Err(err) => format!("app_init failed: {err}"),
    }
}

/// One catalog row for the list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub sequence_number: u32,
    pub name: String,
    /// `#<n> <name>` label for list rows.
    pub label: String,
    pub detail_reference: String,
    pub captured: bool,
}

/// Annotated catalog envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogResponse {
    pub ok: bool,
    pub items: Vec<CatalogItem>,
    /// Remote total, not the page size.
    pub count: u64,
    pub message: String,
}

/// Capture state envelope for the detail screen button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureResponse {
    pub ok: bool,
    /// Re-read state; `false` when `ok` is false.
    pub captured: bool,
    pub message: String,
}

/// Detail screen envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailsResponse {
    pub ok: bool,
    pub name: String,
    pub height: u32,
    pub weight: u32,
    pub sprite_url: Option<String>,
    pub message: String,
}

/// Generic action envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    pub message: String,
}

/// Queued failure notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeItem {
    /// `network|lookup|toggle|auth_required|auth`.
    pub kind: String,
    pub message: String,
}

/// Signs in with email and password.
pub fn auth_sign_in(email: String, password: String) -> ActionResponse {
    let app = match app() {
        Ok(app) => app,
        Err(message) => return action_failure(message),
    };
    let session = app.context.session();
    match app.runtime.block_on(session.sign_in(&email, &password)) {
        Ok(_) => ActionResponse {
            ok: true,
            message: "Signed in.".to_string(),
        },
        Err(err) => action_failure(CoreError::from(err).to_string()),
    }
}

/// Signs out. Always succeeds once initialized.
pub fn auth_sign_out() -> ActionResponse {
    let app = match app() {
        Ok(app) => app,
        Err(message) => return action_failure(message),
    };
    app.runtime.block_on(app.context.session().sign_out());
    ActionResponse {
        ok: true,
        message: "Signed out.".to_string(),
    }
}

/// Whether a user is signed in; `false` before `app_init`.
pub fn auth_is_signed_in() -> bool {
    match app() {
        Ok(app) => app
            .runtime
            .block_on(app.context.session().is_signed_in()),
        Err(_) => false,
    }
}

/// Opens a cancellation scope for one screen and returns its handle.
#[flutter_rust_bridge::frb(sync)]
pub fn screen_open() -> u64 {
    let Ok(app) = app() else {
        return 0;
    };
    let screen_id = app.next_screen_id.fetch_add(1, Ordering::Relaxed);
    if let Ok(mut screens) = app.screens.lock() {
        screens.insert(screen_id, Arc::new(ScreenScope::new()));
    }
    screen_id
}

/// Closes a screen scope; in-flight calls bound to it return `cancelled`.
#[flutter_rust_bridge::frb(sync)]
pub fn screen_close(screen_id: u64) {
    let Ok(app) = app() else {
        return;
    };
    let scope = app
        .screens
        .lock()
        .ok()
        .and_then(|mut screens| screens.remove(&screen_id));
    if let Some(scope) = scope {
        scope.close();
    }
}

/// Fetches and annotates the first catalog page.
///
/// On failure `ok` is false and `items` is empty; the UI keeps its list.
pub fn catalog_fetch(screen_id: Option<u64>) -> CatalogResponse {
    let result = with_app(screen_id, |context| async move {
        context.sync().fetch_annotated_catalog().await
    });
    match result {
        Ok(page) => CatalogResponse {
            ok: true,
            message: format!("Loaded {} item(s).", page.entities.len()),
            count: page.count,
            items: page.entities.into_iter().map(to_catalog_item).collect(),
        },
        Err(message) => CatalogResponse {
            ok: false,
            items: Vec::new(),
            count: 0,
            message,
        },
    }
}

/// Captures or releases one entity and returns the re-read state.
pub fn capture_toggle(
    entity_name: String,
    currently_captured: bool,
    screen_id: Option<u64>,
) -> CaptureResponse {
    let result = with_app(screen_id, |context| async move {
        context
            .sync()
            .toggle_capture(&entity_name, currently_captured)
            .await
    });
    capture_response(result, "Captured.", "Released.")
}

/// Re-reads the capture state of one entity.
pub fn capture_refresh(entity_name: String, screen_id: Option<u64>) -> CaptureResponse {
    let result = with_app(screen_id, |context| async move {
        context.sync().refresh_capture(&entity_name).await
    });
    capture_response(result, "Captured.", "Not captured.")
}

/// Fetches detail attributes from a catalog item's `detail_reference`.
pub fn entity_details(detail_reference: String, screen_id: Option<u64>) -> DetailsResponse {
    let result = with_app(screen_id, |context| async move {
        context.sync().entity_details(&detail_reference).await
    });
    match result {
        Ok(details) => DetailsResponse {
            ok: true,
            message: String::new(),
            name: details.name,
            height: details.height,
            weight: details.weight,
            sprite_url: details.sprite_url,
        },
        Err(message) => DetailsResponse {
            ok: false,
            name: String::new(),
            height: 0,
            weight: 0,
            sprite_url: None,
            message,
        },
    }
}

/// Returns and clears queued failure notifications.
pub fn drain_notices() -> Vec<NoticeItem> {
    let Ok(app) = app() else {
        return Vec::new();
    };
    let Ok(mut receiver) = app.notices.lock() else {
        return Vec::new();
    };
    let mut items = Vec::new();
    while let Ok(notice) = receiver.try_recv() {
        items.push(NoticeItem {
            kind: notice.kind.as_str().to_string(),
            message: notice.message,
        });
    }
    items
}

fn build_app(catalog_url: Option<String>, db_path: Option<String>) -> Result<FfiApp, String> {
    let mut config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(url) = non_blank(catalog_url) {
        config.catalog_base_url = url;
    }
    if let Some(path) = non_blank(db_path) {
        config.store_path = Some(PathBuf::from(path));
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("runtime start failed: {err}"))?;
    let provider = auth_provider_from_config(&config)
        .map_err(|err| StartupError::from(err).to_string())?;
    let (context, notices) =
        AppContext::start(config, provider).map_err(|err| err.to_string())?;

    log::info!("event=ffi_app_init module=ffi status=ok");
    Ok(FfiApp {
        runtime,
        context,
        notices: Mutex::new(notices),
        screens: Mutex::new(HashMap::new()),
        next_screen_id: AtomicU64::new(1),
    })
}

fn app() -> Result<&'static FfiApp, String> {
    APP.get().ok_or_else(|| NOT_INITIALIZED.to_string())
}

fn with_app<T, F, Fut>(screen_id: Option<u64>, call: F) -> Result<T, String>
where
    F: FnOnce(&'static AppContext) -> Fut,
    Fut: Future<Output = CoreResult<T>>,
{
    let app = app()?;
    let scope = match screen_id {
        Some(screen_id) => Some(
            screen_scope(app, screen_id).ok_or_else(|| CoreError::Cancelled.to_string())?,
        ),
        None => None,
    };

    let fut = call(&app.context);
    let result = app.runtime.block_on(async move {
        match scope {
            Some(scope) => scope.run(fut).await,
            None => fut.await,
        }
    });
    result.map_err(|err| err.to_string())
}

fn screen_scope(app: &FfiApp, screen_id: u64) -> Option<Arc<ScreenScope>> {
    app.screens
        .lock()
        .ok()
        .and_then(|screens| screens.get(&screen_id).cloned())
}

fn capture_response(
    result: Result<bool, String>,
    captured_message: &str,
    released_message: &str,
) -> CaptureResponse {
    match result {
        Ok(captured) => CaptureResponse {
            ok: true,
            captured,
            message: if captured {
                captured_message
            } else {
                released_message
            }
            .to_string(),
        },
        Err(message) => CaptureResponse {
            ok: false,
            captured: false,
            message,
        },
    }
}

fn to_catalog_item(entity: Entity) -> CatalogItem {
    CatalogItem {
        label: entity.display_label(),
        sequence_number: entity.sequence_number,
        name: entity.name,
        detail_reference: entity.detail_reference,
        captured: entity.captured,
    }
}

fn action_failure(message: impl Into<String>) -> ActionResponse {
    ActionResponse {
        ok: false,
        message: message.into(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{
        app_init, auth_sign_in, capture_response, capture_toggle, catalog_fetch, core_version,
        drain_notices, init_logging, non_blank, ping, screen_close, screen_open,
    };

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn capture_response_reports_reread_state() {
        let response = capture_response(Ok(true), "Captured.", "Released.");
        assert!(response.ok && response.captured);
        assert_eq!(response.message, "Captured.");

        let failed = capture_response(Err("boom".to_string()), "Captured.", "Released.");
        assert!(!failed.ok && !failed.captured);
    }

    #[test]
    fn non_blank_filters_whitespace() {
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(non_blank(Some(" a ".to_string())), Some("a".to_string()));
    }

    #[test]
    fn initialized_app_reports_failures_as_envelopes() {
        let closed_port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };
        let init = app_init(Some(format!("http://127.0.0.1:{closed_port}/")), None);
        assert!(init.is_empty(), "{init}");

        let sign_in = auth_sign_in("ash@example.com".to_string(), "pikachu".to_string());
        assert!(!sign_in.ok);

        let toggle = capture_toggle("ivysaur".to_string(), false, None);
        assert!(!toggle.ok);
        assert!(toggle.message.contains("sign in"));

        let catalog = catalog_fetch(None);
        assert!(!catalog.ok);
        assert!(catalog.items.is_empty());

        let screen_id = screen_open();
        screen_close(screen_id);
        let cancelled = catalog_fetch(Some(screen_id));
        assert!(!cancelled.ok);
        assert!(cancelled.message.contains("cancelled"));

        let kinds = drain_notices()
            .into_iter()
            .map(|notice| notice.kind)
            .collect::<Vec<_>>();
        assert!(kinds.contains(&"auth_required".to_string()));
        assert!(kinds.contains(&"network".to_string()));
        assert!(kinds.contains(&"auth".to_string()));
    }
}
