//! Session coordinator

use scry_core::endpoints;
use scry_core::sync::lock;
use scry_core::transport::DEFAULT_BASE_URL;
use scry_core::{
    CaptureStream, HttpTransport, RecorderSettings, RecurringTask, SessionId, Transport,
    TransportError, TransportExt, TransportResponse, Window,
};
use scry_error_tracking::ErrorRecorder;
use scry_events::EventRecorder;
use scry_network::NetworkRecorder;
use scry_session_replay::{NoopReplayCapture, ReplayCapture, ReplayRecorder};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::RecorderError;
use crate::metadata::CapturedUserMetadata;
use crate::types::{CapturedUserIdentity, CreateSessionRequest};

/// Where session creation stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Pending,
    Active(SessionId),
    /// Creation failed; the recorder no longer captures anything.
    Failed,
}

pub struct RecorderBuilder {
    window: Arc<Window>,
    public_token: String,
    settings: RecorderSettings,
    transport: Option<Arc<dyn Transport>>,
    replay_capture: Option<Arc<dyn ReplayCapture>>,
}

impl RecorderBuilder {
    fn new(window: Arc<Window>, public_token: impl Into<String>) -> Self {
        Self {
            window,
            public_token: public_token.into(),
            settings: RecorderSettings::default(),
            transport: None,
            replay_capture: None,
        }
    }

    pub fn settings(mut self, settings: RecorderSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn replay_capture(mut self, capture: Arc<dyn ReplayCapture>) -> Self {
        self.replay_capture = Some(capture);
        self
    }

    /// Construct every stream (unstarted) and begin creating the session.
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Result<Recorder, RecorderError> {
        let runtime = Handle::try_current().map_err(|_| RecorderError::NoRuntime)?;
        let settings = self.settings.normalized();
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(DEFAULT_BASE_URL)?),
        };
        let replay_capture: Arc<dyn ReplayCapture> = match self.replay_capture {
            Some(capture) => capture,
            None => Arc::new(NoopReplayCapture),
        };
        let flush_interval = settings.flush_interval();

        let streams = Streams {
            replay: ReplayRecorder::new(
                transport.clone(),
                replay_capture,
                settings.masking_level,
                &settings.replay_recording,
                flush_interval,
            ),
            events: EventRecorder::new(
                self.window.clone(),
                transport.clone(),
                settings.masking_level,
                flush_interval,
            ),
            errors: ErrorRecorder::new(
                self.window.clone(),
                transport.clone(),
                settings.console_recording.enabled,
                flush_interval,
            ),
            network: NetworkRecorder::new(
                self.window.clone(),
                transport.clone(),
                settings.network_recording.clone(),
                flush_interval,
            ),
        };

        let (state, _) = watch::channel(SessionState::Pending);
        let inner = Arc::new(Inner {
            window: self.window,
            transport,
            public_token: self.public_token,
            settings,
            streams,
            state,
            identity: Mutex::new(None),
            ping_task: Mutex::new(None),
        });

        let creating = inner.clone();
        runtime.spawn(async move { creating.create_session().await });

        Ok(Recorder { inner })
    }
}

struct Streams {
    replay: ReplayRecorder,
    events: EventRecorder,
    errors: ErrorRecorder,
    network: NetworkRecorder,
}

impl Streams {
    fn all(&self) -> [&dyn CaptureStream; 4] {
        [&self.replay, &self.events, &self.errors, &self.network]
    }
}

struct Inner {
    window: Arc<Window>,
    transport: Arc<dyn Transport>,
    public_token: String,
    settings: RecorderSettings,
    streams: Streams,
    state: watch::Sender<SessionState>,
    identity: Mutex<Option<CapturedUserIdentity>>,
    ping_task: Mutex<Option<RecurringTask>>,
}

/// Client-side session recorder.
///
/// ```no_run
/// # async fn run(window: std::sync::Arc<scry_core::Window>) -> Result<(), scry_recorder::RecorderError> {
/// let recorder = scry_recorder::Recorder::builder(window, "pk_live_123").build()?;
/// recorder.start();
/// recorder.identify("user_123");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Recorder {
    inner: Arc<Inner>,
}

impl Recorder {
    pub fn builder(window: Arc<Window>, public_token: impl Into<String>) -> RecorderBuilder {
        RecorderBuilder::new(window, public_token)
    }

    /// Start every stream. Ignored once session creation has failed.
    pub fn start(&self) {
        if *self.inner.state.borrow() == SessionState::Failed {
            warn!("Captured session could not be created, recorder will not start");
            return;
        }
        for stream in self.inner.streams.all() {
            stream.start();
        }
    }

    pub fn stop(&self) {
        self.inner.stop_streams();
    }

    /// Stop every stream and the liveness ping.
    pub fn shutdown(&self) {
        self.inner.stop_streams();
        if let Some(task) = lock(&self.inner.ping_task).take() {
            task.cancel();
        }
    }

    /// Attach a user identity to the session.
    ///
    /// Sent right away when the session exists, otherwise once it has been
    /// created. Blank ids are logged and ignored.
    pub fn identify(&self, user_id: &str) {
        let Some(identity) = CapturedUserIdentity::parse(user_id) else {
            error!("Recorder.identify: {}", RecorderError::InvalidIdentity);
            return;
        };
        *lock(&self.inner.identity) = Some(identity.clone());

        let Some(session_id) = self.session_id() else {
            return;
        };
        match Handle::try_current() {
            Ok(runtime) => {
                let inner = self.inner.clone();
                runtime.spawn(async move { inner.send_identity(&session_id, &identity).await });
            }
            Err(_) => error!("{}", RecorderError::NoRuntime),
        }
    }

    pub fn session_state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        match &*self.inner.state.borrow() {
            SessionState::Active(id) => Some(id.clone()),
            _ => None,
        }
    }

    /// Wait until session creation has either succeeded or failed.
    pub async fn wait_for_session(&self) -> SessionState {
        let mut receiver = self.inner.state.subscribe();
        let state = match receiver
            .wait_for(|state| *state != SessionState::Pending)
            .await
        {
            Ok(state) => state.clone(),
            Err(_) => self.session_state(),
        };
        state
    }

    pub fn settings(&self) -> &RecorderSettings {
        &self.inner.settings
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.inner.window
    }

    pub fn is_running(&self) -> bool {
        self.inner.streams.all().iter().any(|stream| stream.is_running())
    }

    pub fn replay(&self) -> &ReplayRecorder {
        &self.inner.streams.replay
    }

    pub fn events(&self) -> &EventRecorder {
        &self.inner.streams.events
    }

    pub fn errors(&self) -> &ErrorRecorder {
        &self.inner.streams.errors
    }

    pub fn network(&self) -> &NetworkRecorder {
        &self.inner.streams.network
    }
}

impl Inner {
    fn stop_streams(&self) {
        for stream in self.streams.all() {
            stream.stop();
        }
    }

    async fn create_session(self: Arc<Self>) {
        let request = CreateSessionRequest {
            public_token: self.public_token.clone(),
        };
        let response = self
            .transport
            .post(&endpoints::create_session(), &request)
            .await;

        match session_id_from(response) {
            Ok(id) => self.on_session_created(id).await,
            Err(e) => {
                error!("Failed to create captured session: {}", e);
                self.state.send_replace(SessionState::Failed);
                self.stop_streams();
            }
        }
    }

    async fn on_session_created(self: Arc<Self>, id: SessionId) {
        info!("Captured session {} created", id);
        for stream in self.streams.all() {
            stream.set_session_id(id.clone());
        }
        self.state.send_replace(SessionState::Active(id.clone()));
        self.schedule_ping(&id);

        let metadata = CapturedUserMetadata::collect(&self.window);
        let response = self.transport.post(&endpoints::metadata(&id), &metadata).await;
        log_failure("send captured session metadata", response);

        let identity = lock(&self.identity).clone();
        if let Some(identity) = identity {
            self.send_identity(&id, &identity).await;
        }
    }

    fn schedule_ping(self: &Arc<Self>, id: &SessionId) {
        let weak = Arc::downgrade(self);
        let path = endpoints::ping(id);
        let task = RecurringTask::spawn("session ping", self.settings.ping_interval(), move || {
            let weak = weak.clone();
            let path = path.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    let response = inner.transport.put(&path, &json!({})).await;
                    log_failure("ping captured session", response);
                }
            }
        });
        match task {
            Ok(task) => *lock(&self.ping_task) = Some(task),
            Err(e) => error!("Failed to schedule session ping: {}", e),
        }
    }

    async fn send_identity(&self, id: &SessionId, identity: &CapturedUserIdentity) {
        let response = self.transport.patch(&endpoints::identify(id), identity).await;
        if log_failure("identify user", response) {
            debug!("Identified session {} as {}", id, identity.user_id);
        }
    }
}

fn session_id_from(response: Result<TransportResponse, TransportError>) -> Result<SessionId, RecorderError> {
    let response = response?;
    if !response.is_success() {
        return Err(RecorderError::SessionRejected {
            status: response.status,
            body: response.data,
        });
    }
    match response.data {
        Value::String(id) if !id.trim().is_empty() => Ok(SessionId::from(id)),
        Value::Number(id) => Ok(SessionId::from(id.to_string())),
        other => Err(RecorderError::InvalidSessionId(other)),
    }
}

/// Log a failed fire-and-forget call. Returns true when it succeeded.
fn log_failure(action: &str, response: Result<TransportResponse, TransportError>) -> bool {
    match response {
        Ok(response) if response.status >= 400 => {
            error!("Failed to {}: HTTP {} {}", action, response.status, response.data);
            false
        }
        Ok(_) => true,
        Err(e) => {
            error!("Failed to {}: {}", action, e);
            false
        }
    }
}
