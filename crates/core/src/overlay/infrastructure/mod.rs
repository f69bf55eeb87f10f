pub mod bitmap_font;
pub mod raster_surface;
