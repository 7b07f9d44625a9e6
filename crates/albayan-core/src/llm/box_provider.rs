//! BoxAnswerProvider -- object-safe dynamic dispatch wrapper for AnswerProvider.
//!
//! 1. Define an object-safe `AnswerProviderDyn` trait with boxed futures
//! 2. Blanket-impl `AnswerProviderDyn` for all `T: AnswerProvider`
//! 3. `BoxAnswerProvider` wraps `Box<dyn AnswerProviderDyn>` and delegates

use futures_util::future::BoxFuture;

use albayan_types::answer::{Answer, AnswerError, AnswerRequest};

use super::provider::AnswerProvider;

/// Object-safe version of [`AnswerProvider`] with boxed futures.
pub trait AnswerProviderDyn: Send + Sync {
    fn name(&self) -> &str;

    fn ask_boxed<'a>(
        &'a self,
        request: &'a AnswerRequest,
    ) -> BoxFuture<'a, Result<Answer, AnswerError>>;
}

impl<T: AnswerProvider> AnswerProviderDyn for T {
    fn name(&self) -> &str {
        AnswerProvider::name(self)
    }

    fn ask_boxed<'a>(
        &'a self,
        request: &'a AnswerRequest,
    ) -> BoxFuture<'a, Result<Answer, AnswerError>> {
        Box::pin(self.ask(request))
    }
}

/// Type-erased answer provider for runtime provider selection.
///
/// `AnswerProvider` uses RPITIT and so cannot be a trait object directly;
/// this wrapper exposes the same methods over an `AnswerProviderDyn` box.
pub struct BoxAnswerProvider {
    inner: Box<dyn AnswerProviderDyn>,
}

impl BoxAnswerProvider {
    /// Wrap a concrete `AnswerProvider` in a type-erased box.
    pub fn new<T: AnswerProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn ask(&self, request: &AnswerRequest) -> Result<Answer, AnswerError> {
        self.inner.ask_boxed(request).await
    }
}
