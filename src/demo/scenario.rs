//! Demo request sequence against an echo server.

use std::sync::{mpsc, Arc};

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::error::ClientError;
use crate::executor::Outcome;
use crate::request::{Request, Response, TextKind};
use crate::request::body::FORM_CONTENT_TYPE;
use crate::transport::TransportManager;

const BROWSER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.3; WOW64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/50.0.2661.94 Safari/537.36";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    Blocking,
    Async,
}

/// Result of one step of the scenario.
#[derive(Debug)]
pub struct StepResult {
    pub name: &'static str,
    pub outcome: Outcome,
}

impl StepResult {
    pub fn response(&self) -> Option<&Response> {
        self.outcome.response()
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_AGENT));
    headers
}

fn endpoint(target: &str, path: &str) -> String {
    format!("{}{}", target.trim_end_matches('/'), path)
}

/// The steps, in order. Building a step can fail on a bad target URL.
fn steps(target: &str) -> Vec<(&'static str, Result<Request, ClientError>)> {
    let headers = browser_headers();
    let json = serde_json::json!({ "content-type": "json", "method": "post" }).to_string();
    let echo_form = [("content-type", "json"), ("method", "post")];

    vec![
        ("get", Request::get(&endpoint(target, "/"), &[])),
        (
            "search-form",
            Request::post(&endpoint(target, "/search")).map(|r| {
                r.with_headers(Some(&headers), FORM_CONTENT_TYPE)
                    .form(&[("scope", "all"), ("q", "java")])
            }),
        ),
        (
            "post-json",
            Request::post(&endpoint(target, "/post-json")).map(|r| {
                r.with_headers(None, TextKind::Json.default_content_type())
                    .text(json, TextKind::Json)
            }),
        ),
        (
            "post-form",
            Request::post(&endpoint(target, "/post-string"))
                .map(|r| r.with_headers(None, FORM_CONTENT_TYPE).form(&echo_form)),
        ),
        (
            "post-text",
            Request::post(&endpoint(target, "/post-string")).map(|r| {
                r.with_headers(None, TextKind::Plain.default_content_type())
                    .text("hello world!", TextKind::Plain)
            }),
        ),
    ]
}

/// Run the whole sequence with one handle, returning results in step order.
pub fn run(manager: &Arc<TransportManager>, target: &str, mode: Mode) -> Vec<StepResult> {
    let handle = manager.acquire();
    let results = match mode {
        Mode::Blocking => {
            let client = handle.blocking();
            steps(target)
                .into_iter()
                .map(|(name, request)| {
                    let outcome = match request.and_then(|r| client.execute(r)) {
                        Ok(response) => Outcome::Completed(response),
                        Err(e) => Outcome::Failed(e),
                    };
                    StepResult { name, outcome }
                })
                .collect::<Vec<_>>()
        }
        Mode::Async => {
            let client = handle.nonblocking();
            let (tx, rx) = mpsc::channel();
            let steps = steps(target);
            let total = steps.len();

            for (index, (name, request)) in steps.into_iter().enumerate() {
                match request {
                    Ok(request) => {
                        let tx = tx.clone();
                        client.execute_with(request, move |outcome| {
                            let _ = tx.send((index, StepResult { name, outcome }));
                        });
                    }
                    Err(e) => {
                        let _ = tx.send((index, StepResult { name, outcome: Outcome::Failed(e) }));
                    }
                }
            }
            drop(tx);
            tracing::info!(submitted = total, "All requests submitted");

            let mut results: Vec<(usize, StepResult)> = rx.iter().take(total).collect();
            results.sort_by_key(|(index, _)| *index);
            results.into_iter().map(|(_, result)| result).collect()
        }
    };

    for result in &results {
        match &result.outcome {
            Outcome::Completed(response) => {
                tracing::info!(step = result.name, status = response.status().as_u16(), %response, "Step finished")
            }
            Outcome::Failed(e) => tracing::warn!(step = result.name, error = %e, "Step failed"),
            Outcome::Cancelled => tracing::warn!(step = result.name, "Step cancelled"),
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(endpoint("http://h:8080/", "/post-json"), "http://h:8080/post-json");
        assert_eq!(endpoint("http://h:8080", "/"), "http://h:8080/");
    }

    #[test]
    fn steps_follow_demo_order() {
        let names: Vec<_> = steps("http://127.0.0.1:8080").into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["get", "search-form", "post-json", "post-form", "post-text"]);
    }

    #[test]
    fn bad_target_fails_every_step_without_network() {
        let manager = Arc::new(TransportManager::new(crate::config::TransportConfig {
            io_threads: 1,
            ..Default::default()
        }));
        let results = run(&manager, "not a url", Mode::Async);
        assert_eq!(results.len(), 5);
        assert!(results
            .iter()
            .all(|r| matches!(&r.outcome, Outcome::Failed(e) if e.is_client_side())));
        assert_eq!(manager.stats().live_handles, 0);
    }
}
