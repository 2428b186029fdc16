pub mod db;
pub mod insights_llm;
pub mod memory;
pub mod mentor;
pub mod spreadsheet;

pub use db::DbAdapter;
pub use insights_llm::OpenAiInsightsAdapter;
pub use memory::InMemoryStore;
pub use mentor::{DesignatedMentorAdapter, RoundRobinMentorAdapter};
pub use spreadsheet::parse_fee_sheet;
