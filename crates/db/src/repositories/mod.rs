//! Stateless repository types, one per table.

mod app_setting_repo;
mod cashback_code_repo;
mod notification_repo;
mod reward_repo;

pub use app_setting_repo::AppSettingRepo;
pub use cashback_code_repo::CashbackCodeRepo;
pub use notification_repo::NotificationRepo;
pub use reward_repo::RewardRepo;
