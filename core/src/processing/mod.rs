pub mod bank;
pub mod exponential;
pub mod kalman;
pub mod moving_average;
pub mod ring_buffer;

pub use bank::FilterBank;
pub use exponential::ExponentialFilter;
pub use kalman::KalmanFilter;
pub use moving_average::MovingAverageFilter;
pub use ring_buffer::RingBuffer;
