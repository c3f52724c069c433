use anyhow::Result;
use httpmock::prelude::*;
use product_describer::{
    DescribeError, DescribeJob, DescriptionEngine, GeminiClient, LocalStorage, ModelConfig,
};
use tempfile::TempDir;

const STREAM_PATH: &str = "/models/gemini-test:streamGenerateContent";

fn model_config(server: &MockServer) -> ModelConfig {
    ModelConfig {
        name: "gemini-test".to_string(),
        endpoint: server.base_url(),
        api_key: "integration-key".to_string(),
        timeout_seconds: Some(10),
    }
}

fn sse_body(chunks: &[&str]) -> String {
    chunks
        .iter()
        .map(|text| {
            format!(
                "data: {}\r\n\r\n",
                serde_json::json!({
                    "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
                })
            )
        })
        .collect()
}

fn job(data_file: &str, prompt: &str) -> DescribeJob {
    DescribeJob {
        data_file: data_file.to_string(),
        prompt: prompt.to_string(),
        temperature: 0.4,
        image_url: None,
    }
}

#[test]
fn test_end_to_end_json_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(
        temp_dir.path().join("products.json"),
        r#"[{"id": 1, "name": "Widget"}]"#,
    )?;

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path(STREAM_PATH)
            .query_param("alt", "sse")
            .header("x-goog-api-key", "integration-key")
            .json_body_partial(
                r#"{"contents": [{"role": "user", "parts": [{"text": "[{\"id\": 1, \"name\": \"Widget\"}]Describe this product."}]}]}"#,
            );
        then.status(200)
            .header("Content-Type", "text/event-stream")
            .body(sse_body(&["A widget ", "is great."]));
    });

    let storage = LocalStorage::new(temp_dir.path().to_string_lossy());
    let client = GeminiClient::new(model_config(&server))?;
    let engine = DescriptionEngine::new(storage, client);

    let mut live = Vec::new();
    let result = engine.run(job("products.json", "Describe this product."), |s| {
        live.push(s.to_string())
    })?;

    api_mock.assert();
    assert_eq!(result.segments, vec!["A widget ", "is great."]);
    assert_eq!(live, result.segments);
    assert_eq!(
        result.prompt,
        r#"[{"id": 1, "name": "Widget"}]Describe this product."#
    );
    assert_eq!(result.records.len(), 1);
    Ok(())
}

#[test]
fn test_end_to_end_csv_file() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("Catalog.CSV"),
        "sku,name,price,in_stock\nW-1,Widget,9.99,true\nG-2,Gadget,19.5,false\n",
    )
    .unwrap();

    let server = MockServer::start();
    let expected_prompt = concat!(
        r#"[{"sku": "W-1", "name": "Widget", "price": 9.99, "in_stock": true}, "#,
        r#"{"sku": "G-2", "name": "Gadget", "price": 19.5, "in_stock": false}]"#,
        "Write one line per product."
    );
    let api_mock = server.mock(|when, then| {
        when.method(POST).path(STREAM_PATH).json_body_partial(
            serde_json::json!({"contents": [{"role": "user", "parts": [{"text": expected_prompt}]}]}).to_string(),
        );
        then.status(200)
            .header("Content-Type", "text/event-stream")
            .body(sse_body(&["Widget: handy.\n", "Gadget: clever."]));
    });

    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap());
    let engine = DescriptionEngine::new(storage, GeminiClient::new(model_config(&server)).unwrap());

    let result = engine
        .run(job("Catalog.CSV", "Write one line per product."), |_| {})
        .unwrap();

    api_mock.assert();
    assert_eq!(result.records.len(), 2);
    assert_eq!(result.prompt, expected_prompt);
    assert_eq!(result.text(), "Widget: handy.\nGadget: clever.");
}

#[test]
fn test_numbers_reach_the_model_unchanged() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(
        temp_dir.path().join("p.json"),
        r#"[{"ean": 123456789012345678901234567890, "weight": 1.079907802215119e-66, "tolerance": 1E-5}]"#,
    )?;

    let server = MockServer::start();
    let expected_prompt = concat!(
        r#"[{"ean": 123456789012345678901234567890, "weight": 1.079907802215119e-66, "tolerance": 1e-05}]"#,
        "Describe."
    );
    let api_mock = server.mock(|when, then| {
        when.method(POST).path(STREAM_PATH).json_body_partial(
            serde_json::json!({"contents": [{"role": "user", "parts": [{"text": expected_prompt}]}]}).to_string(),
        );
        then.status(200)
            .header("Content-Type", "text/event-stream")
            .body(sse_body(&["ok"]));
    });

    let storage = LocalStorage::new(temp_dir.path().to_string_lossy());
    let engine = DescriptionEngine::new(storage, GeminiClient::new(model_config(&server))?);

    let result = engine.run(job("p.json", "Describe."), |_| {})?;

    api_mock.assert();
    assert_eq!(result.prompt, expected_prompt);
    Ok(())
}

#[test]
fn test_safety_stop_is_reported_as_failure() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("p.json"), r#"[{"id": 1}]"#).unwrap();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path(STREAM_PATH);
        then.status(200)
            .header("Content-Type", "text/event-stream")
            .body("data: {\"candidates\": [{\"finishReason\": \"SAFETY\"}]}\n\n");
    });

    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap());
    let engine = DescriptionEngine::new(storage, GeminiClient::new(model_config(&server)).unwrap());

    let result = engine.run(job("p.json", "Describe."), |_| {});

    api_mock.assert();
    match result {
        Err(DescribeError::GenerationError { message }) => {
            assert_eq!(message, "generation stopped: SAFETY")
        }
        other => panic!("expected GenerationError, got {:?}", other),
    }
}

#[test]
fn test_unsupported_file_makes_no_request() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("foo.txt"), "id,name\n1,Widget\n").unwrap();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path(STREAM_PATH);
        then.status(200).body(sse_body(&["unused"]));
    });

    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap());
    let engine = DescriptionEngine::new(storage, GeminiClient::new(model_config(&server)).unwrap());

    let result = engine.run(job("foo.txt", "Describe."), |_| {});

    assert!(matches!(result, Err(DescribeError::UnsupportedFormat { .. })));
    api_mock.assert_hits(0);
}

#[test]
fn test_upstream_failure_mid_stream_returns_no_result() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("p.json"), r#"[{"id": 1}]"#).unwrap();

    let server = MockServer::start();
    let body = format!(
        "{}data: {}\n\n",
        sse_body(&["Partial "]),
        serde_json::json!({"error": {"code": 500, "message": "Internal error encountered."}})
    );
    let api_mock = server.mock(|when, then| {
        when.method(POST).path(STREAM_PATH);
        then.status(200)
            .header("Content-Type", "text/event-stream")
            .body(body);
    });

    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap());
    let engine = DescriptionEngine::new(storage, GeminiClient::new(model_config(&server)).unwrap());

    let result = engine.run(job("p.json", "Describe."), |_| {});

    api_mock.assert();
    match result {
        Err(DescribeError::GenerationError { message }) => {
            assert_eq!(message, "Internal error encountered.")
        }
        other => panic!("expected GenerationError, got {:?}", other),
    }
}

#[test]
fn test_out_of_range_temperature_makes_no_request() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("p.json"), r#"[{"id": 1}]"#).unwrap();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path(STREAM_PATH);
        then.status(200).body(sse_body(&["unused"]));
    });

    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap());
    let engine = DescriptionEngine::new(storage, GeminiClient::new(model_config(&server)).unwrap());

    let mut hot = job("p.json", "Describe.");
    hot.temperature = 1.2;
    let result = engine.run(hot, |_| {});

    assert!(matches!(result, Err(DescribeError::InvalidTemperature { .. })));
    api_mock.assert_hits(0);
}

#[test]
fn test_malformed_json_file_is_parse_error() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("p.json"), "[{\"id\": 1,").unwrap();

    let server = MockServer::start();
    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap());
    let engine = DescriptionEngine::new(storage, GeminiClient::new(model_config(&server)).unwrap());

    let result = engine.run(job("p.json", "Describe."), |_| {});
    assert!(matches!(result, Err(DescribeError::ParseError { .. })));
}
