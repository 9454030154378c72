mod money;
mod voucher;

pub use money::*;
pub use voucher::*;
