pub mod bounding_box;
pub mod constants;
pub mod encoded_frame;
pub mod face_detection;
pub mod frame;
pub mod settings;
