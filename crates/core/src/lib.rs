pub mod caption;
pub mod overlay;
pub mod pipeline;
pub mod shared;
pub mod video;

#[cfg(test)]
pub(crate) mod test_support;
