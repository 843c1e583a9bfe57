//! Contract ABI for the rollups front end.
//!
//! - `bindings`: `sol!` declarations of the application, input box, portals
//!   and token standards
//! - `application`: `validateOutput` / `executeOutput` / `wasOutputExecuted`
//!   calldata and revert reason decoding
//! - `decode`: best-effort voucher payload descriptions
//! - `typed_data`: EIP-712 message signed for relay submission

pub mod application;
pub mod bindings;
pub mod decode;
pub mod typed_data;

pub use application::revert_reason;
pub use decode::{decode_voucher_payload, describe_input_payload, format_ether, AssetTransfer};
pub use typed_data::RelayTypedData;
