pub mod otp;
pub mod session;
pub mod sms;

pub use session::AuthService;
pub use sms::SmsClient;
