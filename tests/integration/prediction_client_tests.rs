//! Submission and the by-model → by-version fallback.

#[cfg(test)]
mod tests {
    use crate::common::{client, prediction, replicate_config};
    use serde_json::json;
    use toonify::{BufferedSink, ModelReference, ToonifyError};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_by_model_success_skips_versions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/models/acme/cartoon/predictions"))
            .and(body_partial_json(json!({"input": {"prompt": "hi"}})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(prediction(&server, "p1", "starting", json!(null))),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/predictions"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let config = replicate_config(&server, "acme/cartoon");
        let reference = ModelReference::parse("acme/cartoon").unwrap();
        let sink = BufferedSink::new();
        let created = client(&config)
            .create_prediction(&reference, &json!({"prompt": "hi"}), false, &sink)
            .await
            .unwrap();

        assert_eq!(created.id, "p1");
        server.verify().await;
    }

    #[tokio::test]
    async fn test_404_falls_back_to_latest_version_exactly_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/models/acme/cartoon/predictions"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no default version"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/models/acme/cartoon/versions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "v-latest"},
                {"id": "v-older"}
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/predictions"))
            .and(body_partial_json(json!({"version": "v-latest"})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(prediction(&server, "p2", "starting", json!(null))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = replicate_config(&server, "acme/cartoon");
        let reference = ModelReference::parse("acme/cartoon").unwrap();
        let sink = BufferedSink::new();
        let created = client(&config)
            .create_prediction(&reference, &json!({}), false, &sink)
            .await
            .unwrap();

        assert_eq!(created.id, "p2");
        assert!(sink.lines().iter().any(|l| l.contains("falling back")));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_422_uses_explicit_version_without_listing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/models/acme/cartoon/predictions"))
            .respond_with(ResponseTemplate::new(422))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/models/acme/cartoon/versions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/predictions"))
            .and(body_partial_json(json!({"version": "v3"})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(prediction(&server, "p3", "starting", json!(null))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = replicate_config(&server, "acme/cartoon:v3");
        let reference = ModelReference::parse("acme/cartoon:v3").unwrap();
        let created = client(&config)
            .create_prediction(&reference, &json!({}), false, &BufferedSink::new())
            .await
            .unwrap();

        assert_eq!(created.id, "p3");
        server.verify().await;
    }

    #[tokio::test]
    async fn test_failed_fallback_is_upstream_error_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/models/acme/cartoon/predictions"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/models/acme/cartoon/versions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [{"id": "v1"}]})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/predictions"))
            .respond_with(ResponseTemplate::new(404).set_body_string("version gone"))
            .expect(1)
            .mount(&server)
            .await;

        let config = replicate_config(&server, "acme/cartoon");
        let reference = ModelReference::parse("acme/cartoon").unwrap();
        let err = client(&config)
            .create_prediction(&reference, &json!({}), false, &BufferedSink::new())
            .await
            .unwrap_err();

        match err {
            ToonifyError::UpstreamError(detail) => assert!(detail.contains("version gone")),
            other => panic!("expected upstream error, got {:?}", other),
        }
        server.verify().await;
    }

    #[tokio::test]
    async fn test_other_status_is_fatal_immediately() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/models/acme/cartoon/predictions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/predictions"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let config = replicate_config(&server, "acme/cartoon");
        let reference = ModelReference::parse("acme/cartoon").unwrap();
        let err = client(&config)
            .create_prediction(&reference, &json!({}), false, &BufferedSink::new())
            .await
            .unwrap_err();

        match err {
            ToonifyError::UpstreamError(detail) => assert!(detail.contains("bad token")),
            other => panic!("expected upstream error, got {:?}", other),
        }
        server.verify().await;
    }

    #[tokio::test]
    async fn test_empty_versions_listing_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models/acme/cartoon/versions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .mount(&server)
            .await;

        let config = replicate_config(&server, "acme/cartoon");
        let err = client(&config)
            .resolve_latest_version("acme", "cartoon")
            .await
            .unwrap_err();
        assert!(matches!(err, ToonifyError::UpstreamError(_)));
    }

    #[tokio::test]
    async fn test_cancel_failure_is_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/predictions/p9/cancel"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let config = replicate_config(&server, "acme/cartoon");
        let sink = BufferedSink::new();
        client(&config).cancel("p9", &sink).await;

        assert!(sink.lines().iter().any(|l| l.contains("ignored")));
        server.verify().await;
    }
}
