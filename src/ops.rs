#[cfg(feature = "stream")]
pub mod into_stream;
pub mod window_toggle;
