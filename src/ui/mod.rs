pub mod camera;
pub mod hud;
pub mod input;
pub mod level_view;
pub mod overlay;
pub mod renderer;
pub mod surface;
