//! Starting-timeout recovery: cancel, then resubmit by version.

#[cfg(test)]
mod tests {
    use crate::common::{client, prediction, replicate_config};
    use serde_json::json;
    use toonify::{BufferedSink, ModelReference, RetryOrchestrator, ToonifyError};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_stuck_prediction(server: &MockServer, cancel_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/v1/models/acme/cartoon/predictions"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(prediction(server, "p1", "starting", json!(null))),
            )
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/predictions/p1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(prediction(server, "p1", "starting", json!(null))),
            )
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/predictions/p1/cancel"))
            .respond_with(ResponseTemplate::new(200).set_body_json(prediction(
                server,
                "p1",
                "canceled",
                json!(null),
            )))
            .expect(cancel_calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_timeout_without_retries_cancels_once_and_stops() {
        let server = MockServer::start().await;
        mount_stuck_prediction(&server, 1).await;
        Mock::given(method("POST"))
            .and(path("/v1/predictions"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let config = replicate_config(&server, "acme/cartoon").with_max_retries(0);
        let orchestrator = RetryOrchestrator::new(client(&config), &config);
        let reference = ModelReference::parse("acme/cartoon").unwrap();

        let err = orchestrator
            .run(&reference, &json!({}), &BufferedSink::new())
            .await
            .unwrap_err();

        assert!(err.is_starting_timeout());
        server.verify().await;
    }

    #[tokio::test]
    async fn test_timeout_retries_once_by_version() {
        let server = MockServer::start().await;
        mount_stuck_prediction(&server, 1).await;
        Mock::given(method("GET"))
            .and(path("/v1/models/acme/cartoon/versions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [{"id": "v9"}]})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/predictions"))
            .and(body_partial_json(json!({"version": "v9"})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(prediction(&server, "p2", "starting", json!(null))),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/predictions/p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(prediction(
                &server,
                "p2",
                "succeeded",
                json!(["http://x/img.png"]),
            )))
            .mount(&server)
            .await;

        let config = replicate_config(&server, "acme/cartoon").with_max_retries(1);
        let orchestrator = RetryOrchestrator::new(client(&config), &config);
        let reference = ModelReference::parse("acme/cartoon").unwrap();
        let sink = BufferedSink::new();

        let done = orchestrator.run(&reference, &json!({}), &sink).await.unwrap();

        assert_eq!(done.id, "p2");
        assert_eq!(done.output_url, "http://x/img.png");
        let lines = sink.lines();
        let cancel_at = lines.iter().position(|l| l.starts_with("Canceled prediction")).unwrap();
        let retry_at = lines.iter().position(|l| l.contains("(forced version)")).unwrap();
        assert!(cancel_at < retry_at, "cancel must precede resubmission");
        server.verify().await;
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_timeout() {
        let server = MockServer::start().await;
        mount_stuck_prediction(&server, 2).await;
        Mock::given(method("POST"))
            .and(path("/v1/predictions"))
            .and(body_partial_json(json!({"version": "v3"})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(prediction(&server, "p1", "starting", json!(null))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = replicate_config(&server, "acme/cartoon:v3").with_max_retries(1);
        let orchestrator = RetryOrchestrator::new(client(&config), &config);
        let reference = ModelReference::parse("acme/cartoon:v3").unwrap();

        let err = orchestrator
            .run(&reference, &json!({}), &BufferedSink::new())
            .await
            .unwrap_err();

        assert!(err.is_starting_timeout());
        server.verify().await;
    }

    #[tokio::test]
    async fn test_failed_prediction_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/models/acme/cartoon/predictions"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(prediction(&server, "p1", "starting", json!(null))),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/predictions/p1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(prediction(&server, "p1", "failed", json!(null))),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/predictions/p1/cancel"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let config = replicate_config(&server, "acme/cartoon").with_max_retries(3);
        let orchestrator = RetryOrchestrator::new(client(&config), &config);
        let reference = ModelReference::parse("acme/cartoon").unwrap();

        let err = orchestrator
            .run(&reference, &json!({}), &BufferedSink::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ToonifyError::PredictionFailed(_)));
        server.verify().await;
    }
}
