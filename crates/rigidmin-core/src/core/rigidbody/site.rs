use super::error::TopologyError;
use super::rotation::{rotation_matrix, rotation_matrix_derivatives};
use nalgebra::Vector3;
use std::collections::HashSet;

/// A single rigid fragment: its atoms in the body frame plus an optional map
/// from local atom order to rows of the global atomistic array.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    local_coordinates: Vec<Vector3<f64>>,
    atom_indices: Option<Vec<usize>>,
}

impl Site {
    pub fn new(local_coordinates: Vec<Vector3<f64>>) -> Result<Self, TopologyError> {
        if local_coordinates.is_empty() {
            return Err(TopologyError::EmptySite);
        }
        Ok(Self::from_nonempty(local_coordinates))
    }

    /// Builds a site from a flat `[x0, y0, z0, x1, ...]` array.
    pub fn from_flat(coords: &[f64]) -> Result<Self, TopologyError> {
        if coords.len() % 3 != 0 {
            return Err(TopologyError::FlatCoordinateLength { len: coords.len() });
        }
        Self::new(coords.chunks_exact(3).map(Vector3::from_column_slice).collect())
    }

    pub(super) fn from_nonempty(local_coordinates: Vec<Vector3<f64>>) -> Self {
        debug_assert!(!local_coordinates.is_empty());
        Self {
            local_coordinates,
            atom_indices: None,
        }
    }

    pub fn with_atom_indices(mut self, indices: Vec<usize>) -> Result<Self, TopologyError> {
        self.set_atom_indices(indices)?;
        Ok(self)
    }

    /// Sets an explicit placement of this site's atoms in the global atomistic array.
    ///
    /// Only the per-site constraints (length and uniqueness) can be checked here; range and
    /// cross-site overlap are checked when the topology is finalized.
    pub fn set_atom_indices(&mut self, indices: Vec<usize>) -> Result<(), TopologyError> {
        if indices.len() != self.natoms() {
            return Err(TopologyError::AtomIndexCount {
                expected: self.natoms(),
                found: indices.len(),
            });
        }
        let mut seen = HashSet::with_capacity(indices.len());
        if let Some(&index) = indices.iter().find(|&&i| !seen.insert(i)) {
            return Err(TopologyError::DuplicateAtomIndex { index });
        }
        self.atom_indices = Some(indices);
        Ok(())
    }

    #[inline]
    pub fn natoms(&self) -> usize {
        self.local_coordinates.len()
    }

    #[inline]
    pub fn local_coordinates(&self) -> &[Vector3<f64>] {
        &self.local_coordinates
    }

    #[inline]
    pub fn atom_indices(&self) -> Option<&[usize]> {
        self.atom_indices.as_deref()
    }

    /// Returns the explicit indices, assigning `start..start + natoms` first if there are none.
    pub(super) fn atom_indices_or_default(&mut self, start: usize) -> &[usize] {
        let natoms = self.natoms();
        self.atom_indices
            .get_or_insert_with(|| (start..start + natoms).collect())
    }

    /// Atom positions `com + R(p) · x_local`, in local atom order.
    pub fn atomistic_positions(&self, com: &Vector3<f64>, p: &Vector3<f64>) -> Vec<Vector3<f64>> {
        let r = rotation_matrix(p);
        self.local_coordinates
            .iter()
            .map(|x| com + r * x)
            .collect()
    }

    /// Contracts per-atom gradients (in local atom order) to this site's six rigid-body
    /// gradient components `[∂E/∂c, ∂E/∂p]`.
    pub fn rigid_gradient(&self, p: &Vector3<f64>, atom_gradients: &[Vector3<f64>]) -> [f64; 6] {
        debug_assert_eq!(atom_gradients.len(), self.natoms());
        let (_, dr) = rotation_matrix_derivatives(p);

        let mut g_com = Vector3::zeros();
        let mut g_rot = Vector3::zeros();
        for (x, g) in self.local_coordinates.iter().zip(atom_gradients) {
            g_com += g;
            for k in 0..3 {
                g_rot[k] += g.dot(&(dr[k] * x));
            }
        }
        [g_com.x, g_com.y, g_com.z, g_rot.x, g_rot.y, g_rot.z]
    }
}
