//! Instrumented fetch and XHR implementations.

use async_trait::async_trait;
use scry_core::generate_request_id;
use scry_core::host::{
    Body, FetchApi, FetchError, FetchInput, ReadyState, RequestInit, Response, XhrApi, XmlHttpRequest,
};
use std::sync::{Arc, Weak};

use crate::recorder::Inner;
use crate::types::XhrMetadata;

pub(crate) struct RecordingFetch {
    pub(crate) original: Arc<dyn FetchApi>,
    pub(crate) recorder: Weak<Inner>,
}

#[async_trait]
impl FetchApi for RecordingFetch {
    async fn fetch(&self, input: FetchInput, init: Option<RequestInit>) -> Result<Response, FetchError> {
        let Some(inner) = self.recorder.upgrade() else {
            return self.original.fetch(input, init).await;
        };

        let timestamp = inner.now();
        let request_id = generate_request_id(timestamp);
        let request = input.clone().resolve(init.clone());
        if !inner.should_capture(&request.url) {
            return self.original.fetch(input, init).await;
        }

        let record = inner.begin_fetch(&request, request_id, timestamp);
        let result = self.original.fetch(input, init).await;
        match &result {
            Ok(response) => inner.complete_fetch(record, Ok(response)),
            Err(e) => inner.complete_fetch(record, Err(e.message.as_str())),
        }
        result
    }
}

pub(crate) struct RecordingXhr {
    pub(crate) original: Arc<dyn XhrApi>,
    pub(crate) recorder: Weak<Inner>,
}

impl XhrApi for RecordingXhr {
    fn open(&self, xhr: &XmlHttpRequest, method: &str, url: &str) {
        let meta = self
            .recorder
            .upgrade()
            .and_then(|inner| inner.open_xhr(method, url));
        {
            let mut extensions = xhr.extensions();
            match meta {
                Some(meta) => {
                    extensions.insert(meta);
                }
                None => {
                    extensions.remove::<XhrMetadata>();
                }
            }
        }
        self.original.open(xhr, method, url);
    }

    fn send(&self, xhr: &XmlHttpRequest, body: Option<Body>) {
        let meta = xhr.extensions().get::<XhrMetadata>().cloned();
        if let (Some(meta), Some(inner)) = (meta, self.recorder.upgrade()) {
            inner.begin_xhr(&meta, xhr, body.as_ref());

            let previous = xhr.on_ready_state_change();
            let recorder = self.recorder.clone();
            let request_id = meta.request_id;
            xhr.set_on_ready_state_change(Some(Arc::new(move |xhr: &XmlHttpRequest| {
                if xhr.ready_state() == ReadyState::Done {
                    if let Some(inner) = recorder.upgrade() {
                        inner.complete_xhr(&request_id, xhr);
                    }
                }
                if let Some(previous) = &previous {
                    previous(xhr);
                }
            })));
        }
        self.original.send(xhr, body);
    }
}
