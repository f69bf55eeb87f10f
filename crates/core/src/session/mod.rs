pub mod detection_loop;
pub mod session_controller;
pub mod session_store;
