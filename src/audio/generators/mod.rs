mod ambient;
mod binaural;
mod nature;

pub use ambient::AmbientGenerator;
pub use binaural::{BinauralGenerator, ALPHA_BEAT, BETA_BEAT};
pub use nature::{NatureGenerator, MAX_DROPLETS};
