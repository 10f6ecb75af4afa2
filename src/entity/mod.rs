pub mod broker;
pub mod broker_level;
pub mod commission;
pub mod elite_benefit;
pub mod referral;
pub mod sale;

pub use broker::BrokerRole;
pub use broker_level::LevelTag;
pub use commission::CommissionStatus;
#[allow(unused_imports)]
pub use elite_benefit::{BenefitStatus, BenefitType};
pub use sale::SaleStatus;
