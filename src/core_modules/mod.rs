pub mod autoencoder;
pub mod block_geometry;
pub mod block_vectorizer;
pub mod metrics;
pub mod reconstructor;
pub mod rect;
pub mod trainer;
pub mod utils;
