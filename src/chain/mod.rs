//! External chain collaborators: quote simulation, balances, execution

pub mod executor;
pub mod rest;
pub mod traits;

pub use executor::DryRunExecutor;
pub use rest::ChainRestClient;
pub use traits::{
    BalanceProvider, ExecutionOutcome, NoopNotifier, Notifier, QuoteSimulator, SwapExecutor,
    WalletBalances,
};
