use scry_core::host::{DomEvent, EventKind, NodeId, Window};
use scry_core::test_utils::{test_window, MockTransport};
use scry_core::{CaptureStream, FlushOutcome, HttpMethod, MaskingLevel, SessionId};
use scry_events::{EventRecorder, InteractionEvent, InteractionType};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const FLUSH: Duration = Duration::from_millis(2_000);

fn recorder(level: MaskingLevel) -> (EventRecorder, Arc<Window>, Arc<MockTransport>) {
    let (window, _clock) = test_window("https://shop.test/checkout?step=2&utm_source=mail");
    let transport = MockTransport::new();
    let recorder = EventRecorder::new(window.clone(), transport.clone(), level, FLUSH);
    (recorder, window, transport)
}

fn add(window: &Window, parent: Option<NodeId>, tag: &str, attrs: &[(&str, &str)], text: Option<&str>) -> NodeId {
    let mut doc = window.document_mut();
    let parent = parent.unwrap_or_else(|| doc.body());
    let id = doc.create_element_with(parent, tag, attrs);
    if let Some(text) = text {
        doc.append_text(id, text);
    }
    id
}

fn only_event(recorder: &EventRecorder) -> InteractionEvent {
    let events = recorder.buffered();
    assert_eq!(events.len(), 1, "expected one event, got {:?}", events);
    events.into_iter().next().unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_all_masks_input_placeholder() {
    let (recorder, window, _) = recorder(MaskingLevel::All);
    let input = add(&window, None, "input", &[("type", "text"), ("placeholder", "Name")], None);
    recorder.start();

    window.dispatch_event(&DomEvent::Click { target: input });

    let event = only_event(&recorder);
    assert_eq!(event.event_type, InteractionType::Click);
    assert_eq!(event.tag_name.as_deref(), Some("input"));
    assert_eq!(event.text, None);
    assert_eq!(event.host, "shop.test");
    assert_eq!(event.path, "/checkout");
}

#[tokio::test(start_paused = true)]
async fn test_password_level_masks_only_sensitive_inputs() {
    let (recorder, window, _) = recorder(MaskingLevel::InputPasswordOrEmailAndTextarea);
    let password = add(&window, None, "input", &[("type", "password"), ("placeholder", "Password")], None);
    add(&window, None, "label", &[("for", "q")], Some("Search"));
    let search = add(&window, None, "input", &[("type", "text"), ("id", "q")], None);
    recorder.start();

    window.dispatch_event(&DomEvent::KeyDown { target: password, key: "a".to_string() });
    window.dispatch_event(&DomEvent::KeyDown { target: search, key: "b".to_string() });

    let events = recorder.buffered();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type, InteractionType::KeyDown);
    assert_eq!(events[0].key.as_deref(), Some("a"));
    assert_eq!(events[0].text, None);
    assert_eq!(events[1].text.as_deref(), Some("Search"));
}

#[tokio::test(start_paused = true)]
async fn test_uncaptured_tags_are_ignored() {
    let (recorder, window, _) = recorder(MaskingLevel::None);
    let div = add(&window, None, "div", &[], Some("Banner"));
    recorder.start();

    window.dispatch_event(&DomEvent::Click { target: div });
    assert!(recorder.buffered().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_button_click_with_dom_context() {
    let (recorder, window, _) = recorder(MaskingLevel::None);
    let form = add(&window, None, "form", &[("id", "checkout"), ("action", "/pay")], None);
    let button = add(&window, Some(form), "button", &[("type", "submit"), ("class", "primary")], Some(" Pay now "));
    recorder.start();

    window.dispatch_event(&DomEvent::Click { target: button });

    let event = only_event(&recorder);
    assert_eq!(event.text.as_deref(), Some("Pay now"));
    let context = serde_json::to_value(event.dom_context.unwrap()).unwrap();
    assert_eq!(
        context,
        json!([
            {"tag": "button", "attrs": {"class": "primary", "type": "submit"}},
            {"tag": "form", "attrs": {"id": "checkout"}},
            {"tag": "body", "attrs": {}}
        ])
    );
}

#[tokio::test(start_paused = true)]
async fn test_change_on_select_records_option_text() {
    let (recorder, window, _) = recorder(MaskingLevel::InputAndTextarea);
    let select = add(&window, None, "select", &[("name", "size")], None);
    add(&window, Some(select), "option", &[("value", "s")], Some("Small"));
    add(&window, Some(select), "option", &[("value", "l")], Some("Large"));
    window.document_mut().select_option(select, 1);
    recorder.start();

    window.dispatch_event(&DomEvent::Change { target: select });

    let event = only_event(&recorder);
    assert_eq!(event.event_type, InteractionType::Change);
    assert_eq!(event.text.as_deref(), Some("Large"));
}

#[tokio::test(start_paused = true)]
async fn test_push_state_records_sanitized_page_view() {
    let (recorder, window, _) = recorder(MaskingLevel::All);
    recorder.start();

    window.push_state(json!({}), Some("/orders/42?token=secret&ref=email"));

    let event = only_event(&recorder);
    assert_eq!(event.event_type, InteractionType::PageView);
    assert_eq!(event.path, "/orders/42");
    assert_eq!(event.text.as_deref(), Some("/orders/42"));
    assert_eq!(
        event.query_params,
        Some(vec![
            ("token".to_string(), "$redacted".to_string()),
            ("ref".to_string(), "email".to_string()),
        ])
    );
    // The original pushState still ran
    assert_eq!(window.location().path(), "/orders/42");
}

#[tokio::test(start_paused = true)]
async fn test_page_show_records_current_location() {
    let (recorder, window, _) = recorder(MaskingLevel::All);
    recorder.start();

    window.dispatch_event(&DomEvent::PageShow);

    let event = only_event(&recorder);
    assert_eq!(event.path, "/checkout");
    assert_eq!(
        event.query_params,
        Some(vec![
            ("step".to_string(), "$redacted".to_string()),
            ("utm_source".to_string(), "mail".to_string()),
        ])
    );
}

#[tokio::test(start_paused = true)]
async fn test_stop_detaches_everything() {
    let (recorder, window, _) = recorder(MaskingLevel::None);
    let original = window.history.current();
    let button = add(&window, None, "button", &[], Some("Go"));

    recorder.start();
    recorder.start();
    assert_eq!(window.listener_count(EventKind::Click), 1);
    assert!(!window.history.is_current(&original));

    recorder.stop();
    assert_eq!(window.listener_count(EventKind::Click), 0);
    assert!(window.history.is_current(&original));

    window.dispatch_event(&DomEvent::Click { target: button });
    window.push_state(json!({}), Some("/elsewhere"));
    assert!(recorder.buffered().is_empty());
    assert!(!recorder.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_flush_waits_for_session_then_posts_and_empties() {
    let (recorder, window, transport) = recorder(MaskingLevel::None);
    let button = add(&window, None, "button", &[], Some("Buy"));
    recorder.start();
    window.dispatch_event(&DomEvent::Click { target: button });

    tokio::time::sleep(FLUSH * 2).await;
    assert!(transport.requests().is_empty());
    assert_eq!(recorder.buffered().len(), 1);

    recorder.set_session_id(SessionId::from("sess-1"));
    tokio::time::sleep(FLUSH + Duration::from_millis(10)).await;

    let requests = transport.requests_to("/ui-events");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, HttpMethod::Post);
    assert_eq!(requests[0].path, "/public/captured-sessions/sess-1/ui-events");
    assert_eq!(requests[0].body.as_ref().unwrap()[0]["text"], "Buy");
    assert!(recorder.buffered().is_empty());
    recorder.stop();
}

#[tokio::test]
async fn test_failed_flush_drops_batch() {
    let (recorder, window, transport) = recorder(MaskingLevel::None);
    transport.respond(HttpMethod::Post, "/ui-events", 500, json!({"error": "boom"}));
    let button = add(&window, None, "button", &[], Some("Buy"));
    recorder.start();
    recorder.set_session_id(SessionId::from("s"));
    window.dispatch_event(&DomEvent::Click { target: button });

    let outcome = recorder.flush().await;

    assert_eq!(outcome, FlushOutcome::Failed { events: 1, retained: false });
    assert!(recorder.buffered().is_empty());
    recorder.stop();
}
