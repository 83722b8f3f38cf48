pub mod fvg;
pub mod orb;
pub mod sessions;
pub mod structure;
pub mod zones;
