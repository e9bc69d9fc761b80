// Onset post-processing
// Ordered filter chain over raw onset candidates, plus the amplitude gate

pub mod filters;
pub mod level;

pub use filters::{
    beat_proximity, drop_after, drop_before, refractory, BeatFilterPolicy, Filter, FilterChain,
};
pub use level::AmplitudeGate;
