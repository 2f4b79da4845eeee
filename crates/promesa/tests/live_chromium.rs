//! Browser-backed end-to-end scenarios.
//!
//! These launch a real chromium process, so they are ignored by default.
//! Run them on a machine with chromium installed:
//!
//! ```text
//! cargo test -p promesa --test live_chromium -- --ignored
//! ```

use promesa::mocks;
use promesa::{
    BrowserSettings, DeviceProfile, MockRouter, PromiseCalculatorPage, SessionFactory,
};

fn headless() -> BrowserSettings {
    BrowserSettings::default().with_headless(true)
}

#[tokio::test]
#[ignore = "requires a chromium binary"]
async fn mobile_profile_context_reports_emulated_metrics() {
    promesa::logging::init();
    let settings = headless().with_device_profile(DeviceProfile::Mobile);
    let mut factory = SessionFactory::new(settings);

    // new_context starts the browser lazily
    let mut context = factory.new_context().await.expect("context");
    assert_eq!(context.profile().viewport.width, 375);
    assert_eq!(context.profile().viewport.height, 667);
    assert!(context.profile().is_mobile);
    assert!(context.profile().has_touch);

    let page = context.new_page().await.expect("page");
    let width: u64 = page.eval("window.innerWidth").await.expect("innerWidth");
    let touch: u64 = page
        .eval("navigator.maxTouchPoints")
        .await
        .expect("maxTouchPoints");
    assert_eq!(width, 375);
    assert!(touch > 0);

    page.close().await.expect("page close");
    context.close().await.expect("context close");
    assert!(factory.close().await.is_clean());
}

#[tokio::test]
#[ignore = "requires a chromium binary"]
async fn mocked_health_endpoint_served_without_a_backend() {
    promesa::logging::init();
    let mut factory = SessionFactory::new(headless());
    let mut context = factory.new_context().await.expect("context");
    context
        .set_router(MockRouter::new(mocks::promise_backend_rules()))
        .expect("router attached before pages");

    let page = context.new_page().await.expect("page");

    // Nothing listens on this origin; only the router can answer.
    let status: String = page
        .eval(
            "fetch('http://localhost:3000/health') \
               .then(r => r.json()).then(j => j.status)",
        )
        .await
        .expect("health fetch");
    assert_eq!(status, "healthy");

    let router = context.router().expect("router");
    assert_eq!(router.served_count("health"), 1);

    page.close().await.expect("page close");
    context.close().await.expect("context close");
    assert!(factory.close().await.is_clean());
}

#[tokio::test]
#[ignore = "requires a chromium binary"]
async fn detail_url_served_by_detail_rule_not_list_rule() {
    let mut factory = SessionFactory::new(headless());
    let mut context = factory.new_context().await.expect("context");
    context
        .set_router(MockRouter::new(mocks::promise_backend_rules()))
        .expect("router attached before pages");

    let page = context.new_page().await.expect("page");
    let name: String = page
        .eval(
            "fetch('http://localhost:3000/otp/sales-orders/SAL-ORD-2026-00001') \
               .then(r => r.json()).then(j => j.name)",
        )
        .await
        .expect("detail fetch");
    assert_eq!(name, "SAL-ORD-2026-00001");

    let router = context.router().expect("router");
    assert_eq!(router.served_count("sales-order-detail-00001"), 1);
    assert_eq!(router.served_count("sales-order-list"), 0);

    page.close().await.expect("page close");
    context.close().await.expect("context close");
    assert!(factory.close().await.is_clean());
}

#[tokio::test]
#[ignore = "requires a chromium binary"]
async fn unmatched_request_is_released_to_the_network() {
    let mut factory = SessionFactory::new(headless());
    let mut context = factory.new_context().await.expect("context");
    context
        .set_router(MockRouter::new(mocks::promise_backend_rules()))
        .expect("router attached before pages");

    let page = context.new_page().await.expect("page");

    // No rule matches this URL and nothing listens on the port. The
    // request must still settle (with a network error), never hang in
    // the paused state.
    let settled: bool = page
        .eval(
            "fetch('http://127.0.0.1:59999/static/asset.js') \
               .then(() => true).catch(() => true)",
        )
        .await
        .expect("fetch settles");
    assert!(settled);

    let journal = context.router().expect("router").journal();
    let record = journal
        .iter()
        .find(|r| r.url.contains("/static/asset.js"))
        .expect("pass-through recorded");
    assert!(record.matched.is_none());

    page.close().await.expect("page close");
    context.close().await.expect("context close");
    assert!(factory.close().await.is_clean());
}

#[tokio::test]
#[ignore = "requires a chromium binary"]
async fn live_backend_mode_installs_no_interception() {
    let settings = headless().with_live_backend(true);
    let mut factory = SessionFactory::new(settings);
    let mut context = factory.new_context().await.expect("context");
    let router = mocks::router_for(factory.settings());
    assert!(!router.is_enabled());
    context.set_router(router).expect("router");

    let page = context.new_page().await.expect("page");

    // A URL the mock catalog would serve goes to the real network
    // instead; with no backend listening it settles with an error.
    let settled: bool = page
        .eval(
            "fetch('http://127.0.0.1:59999/otp/promise') \
               .then(() => true).catch(() => true)",
        )
        .await
        .expect("fetch settles");
    assert!(settled);
    assert!(context.router().expect("router").journal().is_empty());

    page.close().await.expect("page close");
    context.close().await.expect("context close");
    assert!(factory.close().await.is_clean());
}

#[tokio::test]
#[ignore = "requires a chromium binary"]
async fn page_object_reads_a_rendered_shell() {
    let mut factory = SessionFactory::new(headless());
    let mut context = factory.new_context().await.expect("context");

    let page = context.new_page().await.expect("page");
    page.goto("data:text/html,<h1>Promise Calculator</h1>")
        .await
        .expect("data url navigation");

    let calculator = PromiseCalculatorPage::new(page);
    calculator.wait_until_ready().await.expect("shell renders");
    assert!(calculator.is_visible("h1").await.expect("probe"));
    assert_eq!(
        calculator.text_of("h1").await.expect("text"),
        "Promise Calculator"
    );

    calculator.into_page().close().await.expect("page close");
    context.close().await.expect("context close");
    assert!(factory.close().await.is_clean());
}
