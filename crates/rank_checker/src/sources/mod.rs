mod explorer_impls;
mod source_traits;

pub use source_traits::*;
