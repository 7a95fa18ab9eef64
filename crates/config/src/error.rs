pub use skillknife_common::{Error, Result};

skillknife_common::impl_context!();
