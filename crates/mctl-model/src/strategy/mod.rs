mod retry;
pub use retry::RetryBudget;
