pub mod observation_reader;

pub use observation_reader::read_observations;
