pub mod albedo;
pub mod ao;
pub mod bdpt;
pub mod debug;
pub mod light_path;
pub mod naive;
pub mod path;
pub mod random_walk;
pub mod sppm;
pub mod vol_path;
