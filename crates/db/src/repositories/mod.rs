//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` (or an open transaction) as the first argument.

pub mod conversation_repo;
pub mod loyalty_repo;
pub mod project_repo;
pub mod promotion_repo;
pub mod purchase_repo;
pub mod user_repo;
pub mod voucher_repo;

pub use conversation_repo::ConversationRepo;
pub use loyalty_repo::LoyaltyRepo;
pub use project_repo::ProjectRepo;
pub use promotion_repo::PromotionRepo;
pub use purchase_repo::PurchaseRepo;
pub use user_repo::UserRepo;
pub use voucher_repo::VoucherRepo;
