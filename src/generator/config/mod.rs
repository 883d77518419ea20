pub mod filter;
pub mod formats;
pub mod remark;
