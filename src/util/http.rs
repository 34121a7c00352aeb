use super::basic::SError;

/// Seam over the http get implementation, so that exchange rate loading
/// can be exercised without a network, and so the standalone binary can
/// choose its client library.
///
/// async_trait is required to be able to instantiate a Box<dyn HttpRequester>
/// of this. This is marked ?Send because we only ever drive it with
/// async_std::task::block_on on the calling thread.
#[async_trait::async_trait(?Send)]
pub trait HttpRequester {
    async fn get(&self, url: &str) -> Result<String, SError>;
}

#[cfg(feature = "http_standalone")]
pub mod standalone {
    use crate::util::basic::SError;

    use super::HttpRequester;

    pub struct StandaloneAppRequester;

    impl StandaloneAppRequester {
        pub fn new_boxed() -> Box<StandaloneAppRequester> {
            Box::new(StandaloneAppRequester{})
        }
    }

    #[async_trait::async_trait(?Send)]
    impl HttpRequester for StandaloneAppRequester {
        async fn get(&self, url: &str) -> Result<String, SError> {
            // Use surf, because it has no dependence on tokio, so
            // we can more simply run this under async_std::block_on
            // rather than the entirety of main needing to use tokio runtime.
            let mut resp = surf::get(url).await
                .map_err(|e| format!("{}", e))?;
            if !resp.status().is_success() {
                return Err(format!("HTTP status {}", resp.status()));
            }
            resp.body_string().await.map_err(|e| format!("{}", e))
        }
    }
}

// Ideally this would be marked as cfg(test), but integration tests
// also need access.
pub mod pub_testlib {
    use std::collections::HashMap;

    use crate::util::basic::SError;

    use super::HttpRequester;

    /// Serves canned bodies keyed by exact url. Unknown urls fail as a
    /// network error would.
    pub struct CannedHttpRequester {
        pub responses: HashMap<String, Result<String, SError>>,
    }

    #[async_trait::async_trait(?Send)]
    impl HttpRequester for CannedHttpRequester {
        async fn get(&self, url: &str) -> Result<String, SError> {
            match self.responses.get(url) {
                Some(r) => r.clone(),
                None => Err(format!("connection refused ({})", url)),
            }
        }
    }
}
