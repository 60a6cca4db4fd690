//! Tensor-like leaf values.
//!
//! The report never assumes a concrete numeric runtime; it dispatches on two
//! narrow capability sets, both carried by [`Tensor`]:
//!
//! - tensor-like: concatenation along the leading (batch) axis and in-place
//!   addition, used by cross-step accumulation;
//! - relocatable: moving to a target [`Device`], used by [`Report::to`].
//!
//! [`Report::to`]: crate::Report::to

use ndarray::{concatenate, Array1, ArrayD, Axis, IxDyn};
use serde::{Deserialize, Serialize};

use crate::device::Device;
use crate::error::{ReportError, Result};

/// A dense f32 tensor with device residency and gradient bookkeeping
///
/// # Example
///
/// ```
/// use informe::Tensor;
///
/// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0], true);
/// assert_eq!(t.shape(), &[3]);
/// assert!(t.requires_grad());
/// assert!(!t.detach().requires_grad());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    data: ArrayD<f32>,
    device: Device,
    requires_grad: bool,
}

impl Tensor {
    /// Create a tensor from an ndarray with dynamic shape
    pub fn new(data: ArrayD<f32>, requires_grad: bool) -> Self {
        Self {
            data,
            device: Device::Cpu,
            requires_grad,
        }
    }

    /// Create a 1-d tensor from a vector
    pub fn from_vec(values: Vec<f32>, requires_grad: bool) -> Self {
        Self::new(Array1::from(values).into_dyn(), requires_grad)
    }

    /// Create a zero-filled tensor of the given shape
    pub fn zeros(shape: &[usize], requires_grad: bool) -> Self {
        Self::new(ArrayD::zeros(IxDyn(shape)), requires_grad)
    }

    /// Underlying data
    pub fn data(&self) -> &ArrayD<f32> {
        &self.data
    }

    /// Shape of the tensor
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Total number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the tensor has no elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Device the tensor is resident on
    pub fn device(&self) -> Device {
        self.device
    }

    /// Whether the tensor participates in gradient computation
    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Return a copy decoupled from any upstream gradient graph
    pub fn detach(&self) -> Tensor {
        Tensor {
            data: self.data.clone(),
            device: self.device,
            requires_grad: false,
        }
    }

    /// Move the tensor to a device.
    ///
    /// `non_blocking` is forwarded as a transfer hint only: the request is
    /// issued and the call returns without tracking completion. Callers that
    /// depend on the transfer having finished must synchronize externally.
    pub fn to_device(mut self, device: Device, non_blocking: bool) -> Tensor {
        let _ = non_blocking;
        self.device = device;
        self
    }

    /// Concatenate along the leading (batch) axis, self first.
    ///
    /// Trailing dimensions must agree.
    pub fn cat(&self, other: &Tensor) -> Result<Tensor> {
        let data =
            concatenate(Axis(0), &[self.data.view(), other.data.view()]).map_err(|_| {
                ReportError::ShapeMismatch {
                    expected: self.shape().to_vec(),
                    actual: other.shape().to_vec(),
                }
            })?;
        Ok(Tensor {
            data,
            device: self.device,
            requires_grad: self.requires_grad || other.requires_grad,
        })
    }

    /// Elementwise in-place addition. Shapes must agree exactly.
    pub fn add_assign(&mut self, other: &Tensor) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(ReportError::ShapeMismatch {
                expected: self.shape().to_vec(),
                actual: other.shape().to_vec(),
            });
        }
        self.data += &other.data;
        Ok(())
    }

    /// Broadcast in-place scalar addition
    pub fn add_scalar_assign(&mut self, value: f32) {
        self.data += value;
    }
}
