pub mod capture;
pub mod ice;
pub mod ice_material;

pub use capture::*;
pub use ice::*;
pub use ice_material::*;
