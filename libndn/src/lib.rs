pub mod data;
pub mod delayed_call_table;
pub mod entry_id;
pub mod error;
pub mod interest;
pub mod interest_filter;
pub mod interest_filter_table;
pub mod name;
pub mod pending_interest_table;
pub mod registered_prefix_table;
pub mod wire;

pub use data::Data;
pub use entry_id::EntryId;
pub use error::{CallbackError, CallbackOutcome, CallbackResult, NameError, WireError};
pub use interest::Interest;
pub use interest_filter::InterestFilter;
pub use name::{Name, NameComponent};
pub use pending_interest_table::{OnData, OnTimeout, PendingInterest, PendingInterestTable};
