use async_trait::async_trait;

/// Outbound notification transport. New transports only need to implement this trait.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Stable transport identifier (e.g. `webhook`, `discord`).
    fn id(&self) -> &'static str;

    /// Deliver one formatted message.
    ///
    /// There is no delivery receipt: `Ok` means the transport accepted the
    /// request, nothing more.
    async fn send(&self, content: &str) -> crate::Result<()>;
}

/// Reply handle for a command whose answer is produced asynchronously.
///
/// The caller acknowledges first so the user sees that work started, then
/// completes exactly once. `complete` consumes the handle, so a second
/// completion cannot be expressed.
#[async_trait]
pub trait DeferredReply: Send {
    /// Signal that the command was received and an answer is on its way.
    async fn acknowledge(&mut self) -> crate::Result<()>;

    /// Deliver the final content.
    async fn complete(self: Box<Self>, content: String) -> crate::Result<()>;
}
