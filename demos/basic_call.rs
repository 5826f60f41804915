//! Basic example demonstrating simple GET and POST requests.
//!
//! This example shows how to:
//! - Load the client configuration from `WORDPRESS_*` environment variables
//! - List posts with a GET request
//! - Create a draft with a POST request
//! - Read the status, headers and JSON body of a response
//!
//! Run with:
//!
//! ```text
//! WORDPRESS_ENDPOINT=https://example.com \
//! WORDPRESS_USERNAME=admin \
//! WORDPRESS_PASSWORD="xxxx xxxx xxxx xxxx" \
//! cargo run --example basic_call
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use wordpress_client::metadata::RequestMetadata;
use wordpress_client::{Application, Body, Client, Config, Context};

#[derive(Debug, Deserialize)]
struct Rendered {
    rendered: String,
}

#[derive(Debug, Deserialize)]
struct Post {
    id: u64,
    status: String,
    title: Rendered,
}

#[derive(Debug, Serialize)]
struct NewPost<'a> {
    title: &'a str,
    content: &'a str,
    status: &'a str,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("wordpress_client=debug,basic_call=info")
        .init();

    let app = Application::new("basic-call", "0.1.0", "ops@example.com")?;
    let client = Client::new(Config::from_env(Some(app))?)?;
    println!("User-Agent: {}", client.user_agent());
    println!();

    let ctx = Context::with_timeout(Duration::from_secs(30));

    println!("=== GET Request Example ===");
    let response = client
        .execute(
            &ctx,
            RequestMetadata::new("GET", "/wp-json/wp/v2/posts?per_page=3")
                .with_header("Accept", "application/json"),
            None,
        )
        .await?;

    println!("Status code: {}", response.status);
    println!("Total posts: {:?}", response.header("x-wp-total"));
    println!("Total pages: {:?}", response.header("x-wp-totalpages"));

    if response.is_success() {
        for post in response.json::<Vec<Post>>()? {
            println!("#{} [{}] {}", post.id, post.status, post.title.rendered);
        }
    } else {
        println!("Body: {}", response.text());
    }
    println!();

    println!("=== POST Request Example ===");
    let draft = NewPost {
        title: "Hello from Rust",
        content: "Created through the REST API.",
        status: "draft",
    };
    let body = serde_json::to_vec(&draft)?;

    let response = client
        .execute(
            &ctx,
            RequestMetadata::new("POST", "/wp-json/wp/v2/posts")
                .with_header("Content-Type", "application/json"),
            Some(Body::from(body)),
        )
        .await?;

    println!("Status code: {}", response.status);
    if response.is_success() {
        let post: Post = response.json()?;
        println!("Created draft #{}: {}", post.id, post.title.rendered);
    } else {
        // 4xx and 5xx answers are still responses; WordPress explains them in the body.
        println!("Body: {}", response.text());
    }

    Ok(())
}
