use chrono::Utc;
use tracing::{debug, instrument, warn};

use crate::{
    TimezoneError, TimezoneResponse,
    model::LookupOptions,
    params::PathParams,
    provider::{GoogleTimezoneProvider, TimezoneProvider},
};

/// Completion listener. Called once with the same outcome the future settles with.
pub type Completion<'a> = Box<dyn FnOnce(Result<&TimezoneResponse, &TimezoneError>) + Send + 'a>;

/// Looks up the time zone for `options` against the Google Time Zone API.
///
/// The outcome settles the returned future and, if given, `on_complete`.
pub async fn lookup(
    options: &LookupOptions,
    on_complete: Option<Completion<'_>>,
) -> Result<TimezoneResponse, TimezoneError> {
    lookup_with(&GoogleTimezoneProvider::new(), options, on_complete).await
}

/// Runs one lookup against `provider` and reports the outcome on both channels:
/// the returned future and, if given, `on_complete`.
///
/// Every failure kind reaches `on_complete`, including a missing `location`
/// (in which case no request is sent).
#[instrument(skip_all)]
pub async fn lookup_with(
    provider: &dyn TimezoneProvider,
    options: &LookupOptions,
    on_complete: Option<Completion<'_>>,
) -> Result<TimezoneResponse, TimezoneError> {
    let result = run(provider, options).await;

    match &result {
        Ok(res) => debug!(time_zone = res.time_zone_id().unwrap_or("<none>"), "Lookup finished"),
        Err(e) => warn!(error = %e, "Lookup failed"),
    }

    if let Some(on_complete) = on_complete {
        on_complete(result.as_ref());
    }

    result
}

async fn run(
    provider: &dyn TimezoneProvider,
    options: &LookupOptions,
) -> Result<TimezoneResponse, TimezoneError> {
    let params = PathParams::collect(options, Utc::now())?;
    provider.fetch(&params).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Endpoint;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    const TORONTO: &str = "43.7182713,-79.3777061";

    #[derive(Debug)]
    enum Reply {
        Json(serde_json::Value),
        BadUrl,
        NotJson(&'static str),
    }

    #[derive(Debug)]
    struct StubProvider {
        reply: Reply,
        calls: AtomicUsize,
        last_params: Mutex<Option<PathParams>>,
    }

    impl StubProvider {
        fn new(reply: Reply) -> Self {
            Self { reply, calls: AtomicUsize::new(0), last_params: Mutex::new(None) }
        }
    }

    #[async_trait]
    impl TimezoneProvider for StubProvider {
        async fn fetch(&self, params: &PathParams) -> Result<TimezoneResponse, TimezoneError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_params.lock().unwrap() = Some(params.clone());

            match &self.reply {
                Reply::Json(value) => Ok(TimezoneResponse::new(value.clone())),
                Reply::BadUrl => Err(url::ParseError::EmptyHost.into()),
                Reply::NotJson(body) => Err(TimezoneError::Parse {
                    status: 200,
                    body: body.to_string(),
                    source: serde_json::from_str::<serde_json::Value>(body).unwrap_err(),
                }),
            }
        }
    }

    /// Records every callback invocation as a short description.
    fn recorder() -> (Arc<Mutex<Vec<String>>>, Completion<'static>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: Completion<'static> =
            Box::new(move |outcome: Result<&TimezoneResponse, &TimezoneError>| {
                let entry = match outcome {
                    Ok(res) => format!("ok:{}", res.time_zone_id().unwrap_or_default()),
                    Err(e) => format!("err:{e}"),
                };
                sink.lock().unwrap().push(entry);
            });
        (seen, callback)
    }

    #[tokio::test]
    async fn success_settles_future_and_callback_once() {
        let provider =
            StubProvider::new(Reply::Json(json!({"status":"OK","timeZoneId":"America/Toronto"})));
        let (seen, callback) = recorder();

        let res = lookup_with(&provider, &LookupOptions::new(TORONTO), Some(callback))
            .await
            .expect("lookup should succeed");

        assert_eq!(res.time_zone_id(), Some("America/Toronto"));
        assert_eq!(*seen.lock().unwrap(), vec!["ok:America/Toronto".to_string()]);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_location_skips_the_request() {
        let provider = StubProvider::new(Reply::Json(json!({})));
        let (seen, callback) = recorder();
        let opts = LookupOptions { key: Some("ABC".into()), ..Default::default() };

        let err = lookup_with(&provider, &opts, Some(callback)).await.unwrap_err();

        assert_eq!(err.missing_field(), Some("location"));
        assert_eq!(*seen.lock().unwrap(), vec!["err:location is required".to_string()]);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn provider_errors_reach_the_callback() {
        let provider = StubProvider::new(Reply::BadUrl);
        let (seen, callback) = recorder();

        let err =
            lookup_with(&provider, &LookupOptions::new(TORONTO), Some(callback)).await.unwrap_err();

        assert!(matches!(err, TimezoneError::InvalidUrl(_)));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].starts_with("err:failed to build request URL"));
    }

    #[tokio::test]
    async fn parse_failures_reach_the_callback() {
        let provider = StubProvider::new(Reply::NotJson("<html>oops</html>"));
        let (seen, callback) = recorder();

        let err =
            lookup_with(&provider, &LookupOptions::new(TORONTO), Some(callback)).await.unwrap_err();

        assert!(matches!(err, TimezoneError::Parse { status: 200, .. }));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].starts_with("err:failed to parse timezone response"));
    }

    #[tokio::test]
    async fn default_lookup_reports_missing_location_to_the_callback() {
        let (seen, callback) = recorder();

        let err = lookup(&LookupOptions::default(), Some(callback)).await.unwrap_err();

        assert_eq!(err.missing_field(), Some("location"));
        assert_eq!(*seen.lock().unwrap(), vec!["err:location is required".to_string()]);
    }

    #[tokio::test]
    async fn transport_failures_reach_the_callback() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        let provider = GoogleTimezoneProvider::with_client(
            Endpoint::new("127.0.0.1", "/maps/api/timezone/json", port, false),
            http,
        );
        let (seen, callback) = recorder();

        let err =
            lookup_with(&provider, &LookupOptions::new(TORONTO), Some(callback)).await.unwrap_err();

        assert!(matches!(err, TimezoneError::Transport(_)));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].starts_with("err:request to timezone service failed"));
    }

    #[tokio::test]
    async fn works_without_a_callback() {
        let provider = StubProvider::new(Reply::Json(json!({"status":"ZERO_RESULTS"})));

        let res = lookup_with(&provider, &LookupOptions::new(TORONTO), None).await.unwrap();
        assert_eq!(res.status(), Some("ZERO_RESULTS"));
    }

    #[tokio::test]
    async fn timestamp_is_defaulted_before_dispatch() {
        let provider = StubProvider::new(Reply::Json(json!({"status":"OK"})));
        let before = Utc::now().timestamp();

        lookup_with(&provider, &LookupOptions::new(TORONTO), None).await.unwrap();

        let params = provider.last_params.lock().unwrap().clone().expect("provider was called");
        let ts: i64 = params.get("timestamp").unwrap().parse().unwrap();
        assert!((ts - before).abs() <= 2);
        assert_eq!(params.names(), vec!["location", "timestamp"]);
    }

    #[tokio::test]
    async fn concurrent_lookups_are_independent() {
        let provider = StubProvider::new(Reply::Json(json!({"status":"OK"})));
        let a = LookupOptions::new("1,1");
        let b = LookupOptions::new("2,2");

        let (ra, rb) =
            tokio::join!(lookup_with(&provider, &a, None), lookup_with(&provider, &b, None));

        assert!(ra.is_ok() && rb.is_ok());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }
}
