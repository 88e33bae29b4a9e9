mod customer;
mod loan;
mod money;
mod payment;

pub use customer::*;
pub use loan::*;
pub use money::*;
pub use payment::*;
