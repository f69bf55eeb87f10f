pub mod capture;
pub mod detection;
pub mod overlay;
pub mod session;
pub mod shared;
