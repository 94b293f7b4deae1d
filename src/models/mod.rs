/// Convolutional text classification
pub mod cnn;
