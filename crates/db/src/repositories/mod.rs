//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application.

pub mod anomaly;
pub mod company;
pub mod subscription;
pub mod transaction;
pub mod user;

pub use anomaly::AnomalyRepository;
pub use company::CompanyRepository;
pub use subscription::{
    AiChatOutcome, SubscriptionError, SubscriptionRepository, TrialStart, subscription_of,
};
pub use transaction::TransactionRepository;
pub use user::{UserRepository, normalize_email};
