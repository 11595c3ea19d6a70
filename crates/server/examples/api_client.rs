//! Examples for using the querygate server API
//!
//! Start a server first (`cargo run -p querygate-server`), then
//! `cargo run -p querygate-server --example api_client`.

use reqwest::Client;
use serde_json::json;

const SERVER_URL: &str = "http://localhost:8080";

async fn show(label: &str, request: reqwest::RequestBuilder) -> anyhow::Result<()> {
    println!("{label}:");
    let resp = request.send().await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = Client::new();

    show("1. Health Check", client.get(format!("{SERVER_URL}/health"))).await?;

    show(
        "2. Exact match on start_price",
        client
            .get(format!("{SERVER_URL}/get"))
            .query(&[("key", "start_price"), ("value", "100")]),
    )
    .await?;

    show(
        "3. Regex on title",
        client
            .get(format!("{SERVER_URL}/getRegex"))
            .query(&[("key", "title"), ("value", "^red")]),
    )
    .await?;

    show(
        "4. AI-assisted search over title and description",
        client
            .get(format!("{SERVER_URL}/getAiAssistTitleAndDescription"))
            .query(&[("value", "something warm to wear in winter")]),
    )
    .await?;

    show(
        "5. Passthrough filter",
        client
            .post(format!("{SERVER_URL}/get"))
            .json(&json!({ "start_price": { "$lt": 50 } })),
    )
    .await?;

    show(
        "6. Invalid value (expect 400)",
        client
            .get(format!("{SERVER_URL}/get"))
            .query(&[("key", "start_price"), ("value", "cheap")]),
    )
    .await?;

    show("7. All documents", client.get(format!("{SERVER_URL}/getAll"))).await?;

    Ok(())
}
