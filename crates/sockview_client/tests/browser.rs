//! Browser-side hook and wiring tests; run with `wasm-pack test --headless`.

#![cfg(target_arch = "wasm32")]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use serde_json::{Value, json};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

use sockview_client::{
    ChartRenderer, ContainerWidth, EventRouter, Frame, Hook, HookContext, HookRegistry,
    PAGE_LOADING_START_EVENT, PAGE_LOADING_STOP_EVENT, ProgressBar, ProgressIndicator,
    ProgressStyle, PushFn, SCROLL_TO_TOP_EVENT, ScrollHandler, Socket, SocketOptions, Transport,
    TransportEvents,
};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> web_sys::Document {
    web_sys::window().unwrap().document().unwrap()
}

fn test_element(width_px: i32) -> web_sys::Element {
    let el = document().create_element("div").unwrap();
    el.set_attribute("style", &format!("width: {width_px}px"))
        .unwrap();
    document().body().unwrap().append_child(&el).unwrap();
    el
}

fn dispatch_window_event(name: &str) {
    let event = web_sys::Event::new(name).unwrap();
    web_sys::window().unwrap().dispatch_event(&event).unwrap();
}

type Pushes = Rc<RefCell<Vec<(String, Value)>>>;

fn recording_ctx(el: web_sys::Element, router: &EventRouter) -> (HookContext, Pushes) {
    let pushes: Pushes = Rc::default();
    let sink = Rc::clone(&pushes);
    let pusher: PushFn = Rc::new(move |event: &str, payload: Value| {
        sink.borrow_mut().push((event.to_string(), payload));
    });
    (HookContext::new(el, pusher, router.clone()), pushes)
}

/// Install a fake rendering function on the global scope that records the
/// options object of each call and resolves.
fn install_render_global(name: &str) -> Rc<RefCell<Vec<JsValue>>> {
    let calls: Rc<RefCell<Vec<JsValue>>> = Rc::default();
    let sink = Rc::clone(&calls);
    let closure = Closure::wrap(Box::new(
        move |_el: JsValue, _spec: JsValue, options: JsValue| -> js_sys::Promise {
            sink.borrow_mut().push(options);
            js_sys::Promise::resolve(&JsValue::UNDEFINED)
        },
    )
        as Box<dyn FnMut(JsValue, JsValue, JsValue) -> js_sys::Promise>);
    let global: JsValue = web_sys::window().unwrap().into();
    js_sys::Reflect::set(&global, &JsValue::from_str(name), closure.as_ref()).unwrap();
    closure.forget();
    calls
}

#[wasm_bindgen_test]
fn container_width_reports_on_mount() {
    let router = EventRouter::new();
    let el = test_element(300);
    let (ctx, pushes) = recording_ctx(el.clone(), &router);

    let mut hook = ContainerWidth::new();
    hook.mounted(&ctx);
    {
        let pushes = pushes.borrow();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].0, "update_container_width");
        assert_eq!(pushes[0].1, json!({ "width": 300 }));
    }
    hook.destroyed(&ctx);
    el.remove();
}

#[wasm_bindgen_test]
async fn container_width_suppresses_zero_and_collapses_resize_bursts() {
    let router = EventRouter::new();
    let el = test_element(0);
    let (ctx, pushes) = recording_ctx(el.clone(), &router);

    let mut hook = ContainerWidth::new();
    hook.mounted(&ctx);
    assert!(pushes.borrow().is_empty(), "zero width must not be reported");

    el.set_attribute("style", "width: 420px").unwrap();
    for _ in 0..5 {
        dispatch_window_event("resize");
    }
    TimeoutFuture::new(400).await;
    {
        let pushes = pushes.borrow();
        assert_eq!(pushes.len(), 1, "a resize burst settles into one report");
        assert_eq!(pushes[0].1, json!({ "width": 420 }));
    }

    hook.destroyed(&ctx);
    dispatch_window_event("resize");
    TimeoutFuture::new(400).await;
    assert_eq!(pushes.borrow().len(), 1, "no reports after destroy");
    el.remove();
}

#[wasm_bindgen_test]
fn scroll_handler_tolerates_unknown_ids_and_bad_payloads() {
    let router = EventRouter::new();
    let el = test_element(100);
    let (ctx, _pushes) = recording_ctx(el.clone(), &router);

    let mut hook = ScrollHandler::new();
    hook.mounted(&ctx);

    assert_eq!(
        router.dispatch(SCROLL_TO_TOP_EVENT, &json!({ "id": "no-such-element" })),
        1
    );
    router.dispatch(SCROLL_TO_TOP_EVENT, &json!({ "nope": true }));
    el.remove();
}

#[wasm_bindgen_test]
fn scroll_handler_scrolls_to_an_existing_target() {
    let router = EventRouter::new();
    let el = test_element(100);
    let (ctx, _pushes) = recording_ctx(el.clone(), &router);

    let target = test_element(100);
    target.set_attribute("id", "scroll-target").unwrap();
    target.set_attribute("style", "margin-top: 4000px").unwrap();

    let mut hook = ScrollHandler::new();
    hook.mounted(&ctx);
    router.dispatch(SCROLL_TO_TOP_EVENT, &json!({ "id": "scroll-target" }));

    target.remove();
    el.remove();
}

#[wasm_bindgen_test]
fn chart_renderer_skips_malformed_specs() {
    let calls = install_render_global("renderMalformedTest");
    let router = EventRouter::new();
    let el = test_element(200);
    el.set_attribute("data-spec", "{not json").unwrap();
    let (ctx, _pushes) = recording_ctx(el.clone(), &router);

    let mut hook = ChartRenderer::with_render_global("renderMalformedTest");
    hook.mounted(&ctx);
    assert!(calls.borrow().is_empty());

    hook.destroyed(&ctx);
    el.remove();
}

#[wasm_bindgen_test]
fn chart_renderer_skips_elements_without_a_spec() {
    let calls = install_render_global("renderNoSpecTest");
    let router = EventRouter::new();
    let el = test_element(200);
    let (ctx, _pushes) = recording_ctx(el.clone(), &router);

    let mut hook = ChartRenderer::with_render_global("renderNoSpecTest");
    hook.mounted(&ctx);
    assert!(calls.borrow().is_empty());

    hook.destroyed(&ctx);
    el.remove();
}

#[wasm_bindgen_test]
async fn chart_renderer_renders_with_fixed_options() {
    let calls = install_render_global("renderOptionsTest");
    let router = EventRouter::new();
    let el = test_element(200);
    el.set_attribute("data-spec", r#"{"mark":"bar"}"#).unwrap();
    let (ctx, _pushes) = recording_ctx(el.clone(), &router);

    let mut hook = ChartRenderer::with_render_global("renderOptionsTest");
    hook.mounted(&ctx);
    {
        let calls = calls.borrow();
        assert_eq!(calls.len(), 1);
        let options = &calls[0];
        let get = |key: &str| js_sys::Reflect::get(options, &JsValue::from_str(key)).unwrap();
        assert_eq!(get("actions").as_bool(), Some(false));
        assert_eq!(get("renderer").as_string().as_deref(), Some("svg"));
        assert_eq!(get("width").as_string().as_deref(), Some("container"));
    }

    // An update re-reads the attribute and renders again.
    el.set_attribute("data-spec", r#"{"mark":"line"}"#).unwrap();
    hook.updated(&ctx);
    assert_eq!(calls.borrow().len(), 2);

    // A resize burst settles into exactly one more render.
    for _ in 0..4 {
        dispatch_window_event("resize");
    }
    TimeoutFuture::new(400).await;
    assert_eq!(calls.borrow().len(), 3);

    hook.destroyed(&ctx);
    el.remove();
}

#[wasm_bindgen_test]
async fn chart_renderer_survives_a_rejected_render() {
    let closure = Closure::wrap(Box::new(
        move |_el: JsValue, _spec: JsValue, _options: JsValue| -> js_sys::Promise {
            js_sys::Promise::reject(&JsValue::from_str("renderer said no"))
        },
    )
        as Box<dyn FnMut(JsValue, JsValue, JsValue) -> js_sys::Promise>);
    let global: JsValue = web_sys::window().unwrap().into();
    js_sys::Reflect::set(
        &global,
        &JsValue::from_str("renderRejectTest"),
        closure.as_ref(),
    )
    .unwrap();
    closure.forget();

    let router = EventRouter::new();
    let el = test_element(200);
    el.set_attribute("data-spec", r#"{"mark":"bar"}"#).unwrap();
    let (ctx, _pushes) = recording_ctx(el.clone(), &router);

    let mut hook = ChartRenderer::with_render_global("renderRejectTest");
    hook.mounted(&ctx);
    // The rejection is logged asynchronously; give it a tick and make sure
    // nothing panics.
    TimeoutFuture::new(10).await;

    hook.destroyed(&ctx);
    el.remove();
}

#[wasm_bindgen_test]
fn chart_renderer_tolerates_a_missing_render_global() {
    let router = EventRouter::new();
    let el = test_element(200);
    el.set_attribute("data-spec", r#"{"mark":"bar"}"#).unwrap();
    let (ctx, _pushes) = recording_ctx(el.clone(), &router);

    let mut hook = ChartRenderer::with_render_global("definitelyNotLoaded");
    hook.mounted(&ctx);

    hook.destroyed(&ctx);
    el.remove();
}

struct CountingBar {
    shows: Rc<Cell<u32>>,
    hides: Rc<Cell<u32>>,
}

impl ProgressBar for CountingBar {
    fn configure(&self, _style: &ProgressStyle) {}

    fn show(&self) {
        self.shows.set(self.shows.get() + 1);
    }

    fn hide(&self) {
        self.hides.set(self.hides.get() + 1);
    }
}

#[wasm_bindgen_test]
async fn progress_bar_only_shows_after_the_grace_delay() {
    let shows = Rc::new(Cell::new(0));
    let hides = Rc::new(Cell::new(0));
    let indicator = ProgressIndicator::attach(
        CountingBar {
            shows: Rc::clone(&shows),
            hides: Rc::clone(&hides),
        },
        ProgressStyle::default(),
    )
    .unwrap();

    // A fast navigation never flashes the bar.
    dispatch_window_event(PAGE_LOADING_START_EVENT);
    dispatch_window_event(PAGE_LOADING_STOP_EVENT);
    TimeoutFuture::new(400).await;
    assert_eq!(shows.get(), 0);
    assert_eq!(hides.get(), 1);

    // A slow one shows it once the grace delay elapses.
    dispatch_window_event(PAGE_LOADING_START_EVENT);
    TimeoutFuture::new(400).await;
    assert_eq!(shows.get(), 1);

    dispatch_window_event(PAGE_LOADING_STOP_EVENT);
    assert_eq!(hides.get(), 2);

    indicator.detach();
    dispatch_window_event(PAGE_LOADING_START_EVENT);
    TimeoutFuture::new(400).await;
    assert_eq!(shows.get(), 1, "detached listeners stay quiet");
}

/// Transport that records sent frames and lets the test drive the
/// connection callbacks by hand.
#[derive(Default)]
struct ManualTransport {
    sent: RefCell<Vec<String>>,
    events: RefCell<Option<TransportEvents>>,
}

impl ManualTransport {
    fn open(&self) {
        let events = self.events.borrow();
        (events.as_ref().unwrap().on_open)();
    }

    fn deliver(&self, text: &str) {
        let events = self.events.borrow();
        (events.as_ref().unwrap().on_frame)(text);
    }
}

impl Transport for ManualTransport {
    fn connect(
        &self,
        _url: &str,
        _fallback_after_ms: u32,
        events: TransportEvents,
    ) -> Result<(), sockview_client::SocketError> {
        *self.events.borrow_mut() = Some(events);
        Ok(())
    }

    fn send(&self, text: &str) -> Result<(), sockview_client::SocketError> {
        self.sent.borrow_mut().push(text.to_string());
        Ok(())
    }
}

#[wasm_bindgen_test]
fn socket_mounts_page_hooks_on_open_and_routes_lifecycle_frames() {
    let el = test_element(300);
    el.set_attribute("data-hook", "ContainerWidth").unwrap();
    el.set_attribute("id", "measured-panel").unwrap();

    let transport = Rc::new(ManualTransport::default());
    let socket = Socket::new(
        "ws://example.test/live",
        Rc::clone(&transport) as Rc<dyn Transport>,
        SocketOptions::default().hooks(HookRegistry::standard()),
    );
    socket.connect().unwrap();
    transport.open();

    assert_eq!(socket.mounted_hooks(), 1);
    let frames: Vec<Frame> = transport
        .sent
        .borrow()
        .iter()
        .map(|text| Frame::decode(text).unwrap())
        .collect();
    assert!(
        frames
            .iter()
            .any(|f| f.event == "update_container_width" && f.payload == json!({ "width": 300 }))
    );

    transport.deliver(r#"{"event":"sockview:destroyed","payload":{"id":"measured-panel"}}"#);
    assert_eq!(socket.mounted_hooks(), 0);
    el.remove();
}
