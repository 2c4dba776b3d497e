pub mod digest;
pub mod email;

pub use digest::format_digest;
pub use email::EmailNotifier;

/// Delivers one rendered digest to the configured recipient.
#[async_trait::async_trait]
pub trait Notifier {
    async fn notify(&self, subject: &str, html_body: &str) -> anyhow::Result<()>;
    fn name(&self) -> &'static str;
}
