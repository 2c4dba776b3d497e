pub mod mail;
pub mod policy;

pub use mail::MailConfig;
pub use policy::Settings;
