pub mod booking;
pub mod notify;
pub mod slots;
pub mod stats;

pub use booking::BookingService;
pub use notify::PushClient;
pub use slots::SlotService;
pub use stats::StatsService;
