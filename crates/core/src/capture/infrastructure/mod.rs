pub mod jpeg_frame_sampler;
pub mod still_image_camera;
