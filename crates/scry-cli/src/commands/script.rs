//! Scripted page sessions for `scry simulate`.

use scry_core::host::{DomEvent, ErrorEvent, JsError, JsValue, NodeId, RequestInit, Window};
use scry_core::{FlushOutcome, RecorderSettings, SessionId, Transport};
use scry_recorder::{Recorder, SessionState};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageScript {
    pub url: String,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub viewport: Option<ScriptViewport>,
    #[serde(default)]
    pub identify: Option<String>,
    #[serde(default)]
    pub elements: Vec<ScriptElement>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScriptViewport {
    pub width: u32,
    pub height: u32,
}

/// An element created before the script runs. `key` names it for steps.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptElement {
    pub key: String,
    pub tag: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    Click(String),
    KeyDown { target: String, key: String },
    Type { target: String, value: String },
    Select { target: String, index: usize },
    Navigate(String),
    ConsoleError(String),
    ConsoleWarn(String),
    Throw { message: String, #[serde(default)] filename: String },
    Fetch { url: String, #[serde(default)] method: Option<String>, #[serde(default)] body: Option<Value> },
    Identify(String),
    WaitMs(u64),
}

#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub session: SessionState,
    pub steps_run: usize,
    pub flushes: Vec<(&'static str, FlushOutcome)>,
}

impl SimulationReport {
    pub fn session_id(&self) -> Option<&SessionId> {
        match &self.session {
            SessionState::Active(id) => Some(id),
            _ => None,
        }
    }
}

pub fn build_window(script: &PageScript) -> anyhow::Result<(Arc<Window>, HashMap<String, NodeId>)> {
    let mut builder = Window::builder(&script.url);
    if let Some(user_agent) = &script.user_agent {
        builder = builder.user_agent(user_agent);
    }
    if let Some(language) = &script.language {
        builder = builder.language(language);
    }
    if let Some(timezone) = &script.timezone {
        builder = builder.timezone(timezone);
    }
    if let Some(referrer) = &script.referrer {
        builder = builder.referrer(referrer);
    }
    if let Some(viewport) = script.viewport {
        builder = builder.viewport(viewport.width, viewport.height);
    }
    let window = builder
        .build()
        .map_err(|e| anyhow::anyhow!("Invalid page url {}: {}", script.url, e))?;

    let mut nodes = HashMap::new();
    {
        let mut doc = window.document_mut();
        for element in &script.elements {
            let parent = match &element.parent {
                Some(key) => *nodes
                    .get(key)
                    .ok_or_else(|| anyhow::anyhow!("Element {} has unknown parent {}", element.key, key))?,
                None => doc.body(),
            };
            let attributes: Vec<(&str, &str)> = element
                .attributes
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            let id = doc.create_element_with(parent, &element.tag, &attributes);
            if let Some(text) = &element.text {
                doc.append_text(id, text);
            }
            nodes.insert(element.key.clone(), id);
        }
    }
    Ok((window, nodes))
}

fn node(nodes: &HashMap<String, NodeId>, key: &str) -> anyhow::Result<NodeId> {
    nodes
        .get(key)
        .copied()
        .ok_or_else(|| anyhow::anyhow!("Unknown element {}", key))
}

/// Run `script` under a fresh recorder, flush every stream and stop.
pub async fn run_script(
    script: &PageScript,
    settings: RecorderSettings,
    transport: Arc<dyn Transport>,
    public_token: &str,
) -> anyhow::Result<SimulationReport> {
    let (window, nodes) = build_window(script)?;
    let recorder = Recorder::builder(window.clone(), public_token)
        .settings(settings)
        .transport(transport)
        .build()?;
    recorder.start();
    if let Some(user_id) = &script.identify {
        recorder.identify(user_id);
    }

    let session = recorder.wait_for_session().await;
    match &session {
        SessionState::Active(id) => info!("Recording into captured session {}", id),
        _ => warn!("Captured session was not created, steps run unrecorded"),
    }

    for (index, step) in script.steps.iter().enumerate() {
        debug!("Step {}: {:?}", index + 1, step);
        match step {
            Step::Click(target) => {
                window.dispatch_event(&DomEvent::Click { target: node(&nodes, target)? });
            }
            Step::KeyDown { target, key } => {
                window.dispatch_event(&DomEvent::KeyDown {
                    target: node(&nodes, target)?,
                    key: key.clone(),
                });
            }
            Step::Type { target, value } => {
                let target = node(&nodes, target)?;
                window.document_mut().set_value(target, value);
                window.dispatch_event(&DomEvent::Input { target });
                window.dispatch_event(&DomEvent::Change { target });
            }
            Step::Select { target, index } => {
                let target = node(&nodes, target)?;
                window.document_mut().select_option(target, *index);
                window.dispatch_event(&DomEvent::Change { target });
            }
            Step::Navigate(url) => window.push_state(Value::Null, Some(url.as_str())),
            Step::ConsoleError(message) => window.console.error(&[JsValue::from(message.as_str())]),
            Step::ConsoleWarn(message) => window.console.warn(&[JsValue::from(message.as_str())]),
            Step::Throw { message, filename } => {
                window.dispatch_event(&DomEvent::Error(ErrorEvent {
                    message: format!("Uncaught Error: {}", message),
                    filename: filename.clone(),
                    lineno: 1,
                    colno: 1,
                    error: Some(JsValue::from(JsError::new(message.as_str()))),
                }));
            }
            Step::Fetch { url, method, body } => {
                let mut init = RequestInit::default();
                if let Some(method) = method {
                    init = init.method(method);
                }
                if let Some(body) = body {
                    init = init.body(body.clone());
                }
                match window.fetch(url.as_str(), Some(init)).await {
                    Ok(response) => info!("fetch {} -> {}", url, response.status),
                    Err(e) => warn!("fetch {} failed: {}", url, e),
                }
            }
            Step::Identify(user_id) => recorder.identify(user_id),
            Step::WaitMs(millis) => tokio::time::sleep(Duration::from_millis(*millis)).await,
        }
    }

    let flushes = vec![
        ("interaction", recorder.events().flush().await),
        ("error", recorder.errors().flush().await),
        ("network", recorder.network().flush().await),
        ("replay", recorder.replay().flush().await),
    ];
    recorder.shutdown();

    Ok(SimulationReport {
        session,
        steps_run: script.steps.len(),
        flushes,
    })
}
