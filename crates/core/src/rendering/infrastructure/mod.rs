pub mod rgba_surface;
