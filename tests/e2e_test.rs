//! End-to-end tests against a running server
//!
//! These tests require:
//! 1. The API server running with a real generation API token
//! 2. The record store reachable (for lead capture and health)
//!
//! Run with: cargo test --test e2e_test -- --ignored --nocapture
//!
//! Set API_BASE_URL to override default (http://localhost:3000)

use std::time::Duration;

use base64::Engine;
use serde_json::{json, Value};
use tokio::time::sleep;

// Smallest valid 1x1 PNG, stood in for a room photo.
const PNG_1X1: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x62, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Get base URL from env or default to localhost
fn get_base_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

fn png_data_url() -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(PNG_1X1)
    )
}

/// Poll the job snapshot endpoint until a terminal status (with timeout)
async fn wait_for_job_completion(
    client: &reqwest::Client,
    base_url: &str,
    job_id: &str,
    timeout_secs: u64,
) -> Result<Value, Box<dyn std::error::Error>> {
    let max_attempts = timeout_secs;

    for attempt in 0..max_attempts {
        let response = client
            .get(format!("{}/api/jobs/{}", base_url, job_id))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(format!("Status check failed: {}", error_text).into());
        }

        let job: Value = response.json().await?;
        match job["status"].as_str() {
            Some("succeeded") | Some("failed") | Some("timed_out") => return Ok(job),
            Some("pending") | Some("submitting") | Some("idle") => {
                if attempt % 10 == 0 && attempt > 0 {
                    println!("  ... still waiting (attempt {}/{})", attempt, max_attempts);
                }
                sleep(Duration::from_secs(1)).await;
            }
            other => {
                return Err(format!("Unknown job status: {:?}", other).into());
            }
        }
    }

    Err(format!("Job did not finish within {} seconds", timeout_secs).into())
}

#[tokio::test]
#[ignore] // Requires running API server
async fn test_e2e_health_check() {
    let base_url = get_base_url();
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", base_url))
        .send()
        .await
        .expect("Health check failed");

    assert!(
        response.status().is_success(),
        "Health check returned non-success status: {}",
        response.status()
    );

    println!("✓ Health check passed");
}

#[tokio::test]
#[ignore] // Requires running API server
async fn test_e2e_funnel_session_round_trip() {
    let base_url = get_base_url();
    let client = reqwest::Client::new();

    // 1. Open a session
    let created: Value = client
        .post(format!("{}/api/funnel", base_url))
        .send()
        .await
        .expect("Failed to create session")
        .json()
        .await
        .expect("Invalid create response");
    let id = created["id"].as_str().expect("No session id").to_string();
    println!("✓ Session created: {}", id);

    // 2. Quiz answers land as partial updates
    let updated: Value = client
        .patch(format!("{}/api/funnel/{}", base_url, id))
        .json(&json!({"zone": "Cozinha", "remodel_date": "Daqui a 1-3 meses"}))
        .send()
        .await
        .expect("Failed to patch session")
        .json()
        .await
        .expect("Invalid patch response");
    assert_eq!(updated["zone"], "Cozinha");

    // 3. Snapshot reflects the update
    let snapshot: Value = client
        .get(format!("{}/api/funnel/{}", base_url, id))
        .send()
        .await
        .expect("Failed to fetch snapshot")
        .json()
        .await
        .expect("Invalid snapshot");
    assert_eq!(snapshot["state"]["zone"], "Cozinha");
    assert_eq!(snapshot["state"]["status"], "idle");

    println!("✓ Session round trip passed");
}

#[tokio::test]
#[ignore] // Requires running API server with a live generation API token
async fn test_e2e_generation_reaches_a_terminal_state() {
    let base_url = get_base_url();
    let client = reqwest::Client::new();

    let created: Value = client
        .post(format!("{}/api/funnel", base_url))
        .send()
        .await
        .expect("Failed to create session")
        .json()
        .await
        .expect("Invalid create response");
    let id = created["id"].as_str().expect("No session id").to_string();

    let response = client
        .post(format!("{}/api/funnel/{}/generate", base_url, id))
        .json(&json!({
            "image": png_data_url(),
            "style": "Moderno",
            "zone": "Sala"
        }))
        .send()
        .await
        .expect("Failed to start generation");

    assert!(
        response.status().is_success(),
        "Generation start returned {}",
        response.status()
    );
    let started: Value = response.json().await.expect("Invalid start response");
    let job_id = started["job_id"].as_str().expect("No job id").to_string();
    println!("✓ Generation started, job_id: {}", job_id);

    // Every path must end in a visible terminal state; with a 1x1 input
    // the model may well fail, which is still a valid outcome here.
    let job = wait_for_job_completion(&client, &base_url, &job_id, 120)
        .await
        .expect("Failed to wait for job completion");

    println!("✓ Job finished with status: {}", job["status"]);
    match job["status"].as_str() {
        Some("succeeded") => assert!(job["result"].as_str().is_some()),
        Some("failed") | Some("timed_out") => assert!(job["error"].as_str().is_some()),
        other => panic!("Not a terminal status: {:?}", other),
    }
}

#[tokio::test]
#[ignore] // Requires running API server and reachable record store
async fn test_e2e_lead_capture() {
    let base_url = get_base_url();
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/leads", base_url))
        .json(&json!({
            "email": "e2e-test@example.com",
            "name": "E2E Test",
            "remodel_date": "Apenas a planear",
            "objective": "Modernização estética"
        }))
        .send()
        .await
        .expect("Failed to submit lead");

    assert!(
        response.status().is_success(),
        "Lead submission returned {}",
        response.status()
    );
    let body: Value = response.json().await.expect("Invalid lead response");
    assert_eq!(body["success"], true);
    assert!(body["id"].as_str().is_some());

    println!("✓ Lead captured: {}", body["id"]);
}
