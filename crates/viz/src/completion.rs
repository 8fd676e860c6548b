//! Tour completion signal sent to the backend.

use std::time::Duration;

use journey_core::CompletionNotifier;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends a GET to the completion endpoint on a background thread.
pub struct HttpCompletionNotifier {
    url: String,
}

impl HttpCompletionNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn send_completion(url: &str) -> Result<reqwest::StatusCode, reqwest::Error> {
    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;
    let response = client.get(url).send()?.error_for_status()?;
    Ok(response.status())
}

impl CompletionNotifier for HttpCompletionNotifier {
    fn notify_complete(&mut self) {
        let url = self.url.clone();
        let spawned = std::thread::Builder::new()
            .name("tour-completion".to_string())
            .spawn(move || match send_completion(&url) {
                Ok(status) => tracing::info!("Completion sent to {} ({})", url, status),
                Err(e) => tracing::error!("Completion request to {} failed: {}", url, e),
            });
        if let Err(e) = spawned {
            tracing::error!("Could not start completion request: {}", e);
        }
    }
}
