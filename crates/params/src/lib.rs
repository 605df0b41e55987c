//! This crate contains the parameters every party must agree on for their deposits to verify the
//! same way: the currency deposits are held in and how its amounts are written.

mod default;
pub mod errors;
pub mod escrow;

pub mod prelude {
    //! Re-exports of the parameter types.

    pub use crate::{errors::ParamsError, escrow::EscrowParams};
}
