//! The backend the command line tools train and infer on

use burn::backend::Autodiff;

#[cfg(feature = "tch")]
use burn::backend::{libtorch::LibTorchDevice, LibTorch};

#[cfg(not(feature = "tch"))]
use burn::backend::{ndarray::NdArrayDevice, NdArray};

/// LibTorch on the first CUDA device
#[cfg(feature = "tch")]
pub type Backend = Autodiff<LibTorch>;

/// NdArray on the CPU
#[cfg(not(feature = "tch"))]
pub type Backend = Autodiff<NdArray>;

/// The device for [`Backend`]
#[cfg(feature = "tch")]
pub fn device() -> LibTorchDevice {
    LibTorchDevice::Cuda(0)
}

/// The device for [`Backend`]
#[cfg(not(feature = "tch"))]
pub fn device() -> NdArrayDevice {
    NdArrayDevice::Cpu
}
