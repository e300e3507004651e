/*!
 * Translation providers.
 *
 * A provider turns one piece of text into its translation. It is the
 * privileged, network-capable side of the system; the engine only sees the
 * `Translator` trait.
 *
 * - `google`: the public `translate_a/single` endpoint
 * - `mock`: scripted translator for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all translation providers
///
/// Implementations must be usable concurrently: several hover lookups may
/// be in flight at once.
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Translate a single text string
    ///
    /// # Arguments
    /// * `text` - The text to translate
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The translation or an error
    async fn translate(&self, text: &str) -> Result<String, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.translate("hello").await.map(|_| ())
    }

    /// Human readable provider name for logs
    fn name(&self) -> &str;
}

pub mod google;
pub mod mock;
