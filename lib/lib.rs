/// Physical board domain.
pub mod rig;
