pub mod analysis;
pub mod classify;
pub mod decode;
pub mod features;
pub mod framing;
pub mod normalize;
pub mod pitch;
pub mod ratios;
