//! CLI-specific progress handling for routeviz
//!
//! Provides spinner implementation for the command-line interface.
//! Provider requests have no meaningful byte totals, so phases show an
//! elapsed-time spinner rather than a bar.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Creates a spinner for a network phase (routing, elevation, traffic)
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}]")
            .expect("Failed to create spinner style"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Run a fetch phase under a spinner, finishing it either way.
pub async fn with_spinner<T, E, F>(message: &str, future: F) -> Result<T, E>
where
    F: std::future::Future<Output = Result<T, E>>,
{
    let pb = create_spinner(message);
    let result = future.await;
    match &result {
        Ok(_) => pb.finish_and_clear(),
        Err(_) => pb.abandon(),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_spinner_template() {
        let pb = create_spinner("Calculating route");

        // The spinner should be created without panicking with the template
        pb.tick();
        pb.finish();
    }

    #[tokio::test]
    async fn test_with_spinner_passes_result_through() {
        let ok: Result<u32, String> = with_spinner("ok phase", async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err: Result<u32, String> =
            with_spinner("failing phase", async { Err("boom".to_string()) }).await;
        assert_eq!(err.unwrap_err(), "boom");
    }
}
