pub mod ncloud;
pub mod null;
