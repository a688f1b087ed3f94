//! Domain row types and session-stored state.

pub mod profile;
pub mod records;
pub mod session;

pub use profile::Profile;
pub use records::{
    Branch, Employee, InventoryItem, NewBranch, NewEmployee, NewInventoryItem, NewSale, Sale,
};
pub use session::{StoredSession, session_keys};
