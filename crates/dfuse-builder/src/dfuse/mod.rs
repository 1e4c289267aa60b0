pub mod err;
pub mod hl;
pub(crate) mod ll;
