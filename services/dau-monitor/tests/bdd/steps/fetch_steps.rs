//! BDD step definitions for the fetch feature

use std::time::{Duration, Instant};

use cucumber::{given, then, when};

use dau_monitor::fetcher::{analytics_url, Fetcher, RetryPolicy};

use crate::mock_http::Reply;
use crate::world::DauMonitorWorld;

#[given(expr = "a retry policy of {int} attempts with a backoff unit of {int} ms")]
fn retry_policy(world: &mut DauMonitorWorld, attempts: u32, unit_ms: u64) {
    world.policy = RetryPolicy {
        max_retries: attempts,
        timeout: Duration::from_secs(1),
        backoff_unit: Duration::from_millis(unit_ms),
    };
}

#[given(expr = "site {string} reports {int} unique visitors")]
async fn site_reports(world: &mut DauMonitorWorld, site: String, count: u64) {
    world
        .http
        .script(
            &analytics_url(&site),
            Reply::ok(format!(r#"{{"unique_visitors": {}}}"#, count)),
        )
        .await;
}

#[given(expr = "site {string} reports {int} unique visitors after {int} ms")]
async fn site_reports_slowly(world: &mut DauMonitorWorld, site: String, count: u64, ms: u64) {
    world
        .http
        .script(
            &analytics_url(&site),
            Reply::Respond {
                status: 200,
                body: format!(r#"{{"unique_visitors": {}}}"#, count),
                delay: Duration::from_millis(ms),
            },
        )
        .await;
}

#[given(expr = "site {string} reports an empty analytics object")]
async fn site_reports_empty(world: &mut DauMonitorWorld, site: String) {
    world
        .http
        .script(&analytics_url(&site), Reply::ok("{}"))
        .await;
}

#[given(expr = "site {string} answers with status {int} and body {string}")]
async fn site_answers_status(world: &mut DauMonitorWorld, site: String, status: u16, body: String) {
    world
        .http
        .script(&analytics_url(&site), Reply::status(status, body))
        .await;
}

#[given(expr = "site {string} fails {int} times with status {int}")]
async fn site_fails_times(world: &mut DauMonitorWorld, site: String, times: u32, status: u16) {
    for _ in 0..times {
        world
            .http
            .script(&analytics_url(&site), Reply::status(status, "unavailable"))
            .await;
    }
}

#[given(expr = "site {string} times out on every attempt")]
async fn site_times_out(world: &mut DauMonitorWorld, site: String) {
    world
        .http
        .script(&analytics_url(&site), Reply::Timeout)
        .await;
}

#[given(expr = "site {string} refuses connections")]
async fn site_refuses(world: &mut DauMonitorWorld, site: String) {
    world
        .http
        .script(&analytics_url(&site), Reply::Refused)
        .await;
}

#[when(expr = "site {string} is fetched")]
async fn fetch_site(world: &mut DauMonitorWorld, site: String) {
    let fetcher = Fetcher::new(world.http.clone());
    let started = Instant::now();
    let outcome = fetcher.fetch(&site, &world.policy).await;
    world.fetch_elapsed = Some(started.elapsed());
    world.outcome = Some(outcome);
}

#[then(expr = "the outcome value is {int}")]
fn outcome_value(world: &mut DauMonitorWorld, expected: u64) {
    let outcome = world.outcome.as_ref().expect("no outcome");
    assert_eq!(outcome.value(), Some(expected), "{:?}", outcome);
    assert_eq!(outcome.failure_reason(), None);
}

#[then(expr = "the outcome failure reason is {string}")]
fn outcome_reason_is(world: &mut DauMonitorWorld, expected: String) {
    let outcome = world.outcome.as_ref().expect("no outcome");
    assert_eq!(outcome.value(), None);
    assert_eq!(outcome.failure_reason(), Some(expected.as_str()));
}

#[then(expr = "the outcome failure reason contains {string}")]
fn outcome_reason_contains(world: &mut DauMonitorWorld, expected: String) {
    let outcome = world.outcome.as_ref().expect("no outcome");
    let reason = outcome.failure_reason().expect("outcome succeeded");
    assert!(reason.contains(&expected), "{reason}");
}

#[then(expr = "{int} request(s) was/were made to {string}")]
async fn request_count(world: &mut DauMonitorWorld, expected: usize, site: String) {
    assert_eq!(world.http.get_count(&analytics_url(&site)).await, expected);
}

#[then(expr = "the fetch took at least {int} ms")]
fn fetch_took_at_least(world: &mut DauMonitorWorld, ms: u64) {
    let elapsed = world.fetch_elapsed.expect("nothing fetched");
    assert!(elapsed >= Duration::from_millis(ms), "{elapsed:?}");
}
