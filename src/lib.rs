pub mod config;
pub mod model;
pub mod overlay;
pub mod scene;
#[doc(hidden)]
pub mod test_support;
