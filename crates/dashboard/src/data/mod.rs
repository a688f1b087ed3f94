//! Typed repositories over the backend table capability.
//!
//! Each repository borrows the table capability and the access token of
//! the request it serves: row-level security on the backend is evaluated
//! against that token, so repositories never outlive a request.

pub mod branches;
pub mod employees;
pub mod inventory;
pub mod profiles;
pub mod sales;

pub use branches::BranchRepository;
pub use employees::EmployeeRepository;
pub use inventory::InventoryRepository;
pub use profiles::ProfileRepository;
pub use sales::SaleRepository;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::backend::BackendError;

/// Deserialize a backend row into its typed form.
fn decode<T: DeserializeOwned>(value: Value) -> Result<T, BackendError> {
    serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Deserialize a list of backend rows.
fn decode_rows<T: DeserializeOwned>(values: Vec<Value>) -> Result<Vec<T>, BackendError> {
    values.into_iter().map(decode).collect()
}

/// Serialize an insert/patch payload.
///
/// Payload types are plain serialize structs, so this cannot fail in
/// practice; the error arm guards against future non-string map keys.
fn encode<T: serde::Serialize>(payload: &T) -> Result<Value, BackendError> {
    serde_json::to_value(payload).map_err(|e| BackendError::Decode(e.to_string()))
}
