//! Two-dimensional histogram workspace.

use super::object::DataObject;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use std::any::Any;
use std::sync::Arc;

/// Type tag of [`Workspace2D`].
pub const WORKSPACE_2D: &str = "Workspace2D";

/// Histogram data with shape dimensions, creatable through a factory.
pub trait Workspace: DataObject {
    /// Size the workspace. Existing data is discarded.
    fn initialize(&mut self, n_histograms: usize, x_len: usize, y_len: usize);

    fn n_histograms(&self) -> usize;

    /// Number of y values per histogram.
    fn blocksize(&self) -> usize;

    /// Convert into a shareable data object.
    fn into_data_object(self: Box<Self>) -> Arc<dyn DataObject>;
}

/// Spectra stored as rows of dense arrays, with shared x values.
#[derive(Debug, Clone, Default)]
pub struct Workspace2D {
    x: Array1<f64>,
    y: Array2<f64>,
    e: Array2<f64>,
}

impl Workspace2D {
    /// Zero-filled workspace with point x values `0..y_len`.
    pub fn new(n_histograms: usize, y_len: usize) -> Self {
        let mut ws = Self::default();
        ws.initialize(n_histograms, y_len, y_len);
        ws
    }

    /// Workspace from y data; errors are `sqrt(|y|)`.
    pub fn from_y(y: Array2<f64>) -> Self {
        let e = y.mapv(|v| v.abs().sqrt());
        let x = Array1::from_iter((0..y.ncols()).map(|i| i as f64));
        Self { x, y, e }
    }

    pub fn x(&self) -> &Array1<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array2<f64> {
        &self.y
    }

    pub fn e(&self) -> &Array2<f64> {
        &self.e
    }

    pub fn y_mut(&mut self) -> &mut Array2<f64> {
        &mut self.y
    }

    pub fn e_mut(&mut self) -> &mut Array2<f64> {
        &mut self.e
    }

    /// Mutable y and e together.
    pub fn data_mut(&mut self) -> (&mut Array2<f64>, &mut Array2<f64>) {
        (&mut self.y, &mut self.e)
    }

    pub fn spectrum(&self, index: usize) -> Option<ArrayView1<'_, f64>> {
        (index < self.y.nrows()).then(|| self.y.index_axis(Axis(0), index))
    }

    /// Largest y value, ignoring NaN.
    pub fn max_y(&self) -> Option<f64> {
        self.y
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
    }
}

impl DataObject for Workspace2D {
    fn type_tag(&self) -> &str {
        WORKSPACE_2D
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn memory_size(&self) -> usize {
        (self.x.len() + self.y.len() + self.e.len()) * std::mem::size_of::<f64>()
    }
}

impl Workspace for Workspace2D {
    fn initialize(&mut self, n_histograms: usize, x_len: usize, y_len: usize) {
        self.x = Array1::from_iter((0..x_len).map(|i| i as f64));
        self.y = Array2::zeros((n_histograms, y_len));
        self.e = Array2::zeros((n_histograms, y_len));
    }

    fn n_histograms(&self) -> usize {
        self.y.nrows()
    }

    fn blocksize(&self) -> usize {
        self.y.ncols()
    }

    fn into_data_object(self: Box<Self>) -> Arc<dyn DataObject> {
        Arc::new(*self)
    }
}
