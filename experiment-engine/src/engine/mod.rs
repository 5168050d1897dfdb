pub mod assets;
pub mod camera;
pub mod controls;
pub mod core;
pub mod loading;
pub mod scene;
pub mod simulation;
pub mod systems;
pub mod viewer;
