pub mod app;
pub mod camera_controls;
pub mod grid_view;
