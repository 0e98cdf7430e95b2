use super::error::TopologyError;
use super::site::Site;
use nalgebra::Vector3;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Which implementation evaluates the per-site transforms.
///
/// Both paths produce bit-identical results: the per-site work is the same arithmetic,
/// and the scatter into the atomistic array is always performed serially.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformPath {
    Reference,
    Parallel,
}

/// Accumulates sites before the topology is frozen.
#[derive(Debug, Default, Clone)]
pub struct RigidBodyTopologyBuilder {
    sites: Vec<Site>,
}

impl RigidBodyTopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_site(mut self, site: Site) -> Self {
        self.sites.push(site);
        self
    }

    pub fn add_sites<I>(mut self, sites: I) -> Self
    where
        I: IntoIterator<Item = Site>,
    {
        self.sites.extend(sites);
        self
    }

    pub fn nsites(&self) -> usize {
        self.sites.len()
    }

    /// Locks the site list and the atom-index assignment.
    ///
    /// Sites without explicit indices receive `offset..offset + natoms`, where `offset` is the
    /// number of atoms in all preceding sites. The result must claim every row of the
    /// atomistic array exactly once. Since the total number of claimed indices equals the
    /// number of atoms, rejecting out-of-range and repeated indices is sufficient for that.
    #[instrument(skip_all, name = "finalize_topology", fields(nsites = self.sites.len()))]
    pub fn finalize_setup(self, use_accelerated_path: bool) -> Result<RigidBodyTopology, TopologyError> {
        let mut sites = self.sites;
        if sites.is_empty() {
            return Err(TopologyError::Empty);
        }

        let total_atoms: usize = sites.iter().map(Site::natoms).sum();
        let mut owner: Vec<Option<usize>> = vec![None; total_atoms];
        let mut permutation = Vec::with_capacity(total_atoms);
        let mut offsets = Vec::with_capacity(sites.len());

        let mut running = 0;
        for (site_idx, site) in sites.iter_mut().enumerate() {
            let natoms = site.natoms();
            offsets.push(permutation.len());

            for &index in site.atom_indices_or_default(running) {
                let slot = owner.get_mut(index).ok_or(TopologyError::IndexOutOfRange {
                    site: site_idx,
                    index,
                    total_atoms,
                })?;
                if let Some(first_site) = *slot {
                    return Err(TopologyError::OverlappingAtomIndex {
                        index,
                        first_site,
                        second_site: site_idx,
                    });
                }
                *slot = Some(site_idx);
                permutation.push(index);
            }
            running += natoms;
        }

        let path = if !use_accelerated_path {
            TransformPath::Reference
        } else if cfg!(feature = "parallel") {
            TransformPath::Parallel
        } else {
            debug!("Accelerated transform requested but the `parallel` feature is disabled; using the reference path.");
            TransformPath::Reference
        };

        debug!(
            "Finalized rigid-body topology: {} sites, {} atoms, {:?} transform path.",
            sites.len(),
            total_atoms,
            path
        );

        Ok(RigidBodyTopology {
            sites,
            permutation,
            offsets,
            total_atoms,
            path,
        })
    }
}

/// A finalized, immutable collection of rigid sites.
#[derive(Debug, Clone)]
pub struct RigidBodyTopology {
    sites: Vec<Site>,
    // Concatenation of every site's atom indices, in site order.
    permutation: Vec<usize>,
    offsets: Vec<usize>,
    total_atoms: usize,
    path: TransformPath,
}

impl RigidBodyTopology {
    #[inline]
    pub fn nsites(&self) -> usize {
        self.sites.len()
    }

    #[inline]
    pub fn total_atoms(&self) -> usize {
        self.total_atoms
    }

    #[inline]
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    #[inline]
    pub fn path(&self) -> TransformPath {
        self.path
    }

    /// Length of a rigid-body coordinate vector for this topology.
    #[inline]
    pub fn rigid_len(&self) -> usize {
        6 * self.sites.len()
    }

    /// Length of an atomistic coordinate vector for this topology.
    #[inline]
    pub fn atomistic_len(&self) -> usize {
        3 * self.total_atoms
    }

    /// Every site's atom indices concatenated in site order.
    ///
    /// Entry `k` is the atomistic row of the `k`-th atom in site-major order, so
    /// `atomistic[perm[k]]` equals row `k` of the same structure under the default
    /// contiguous assignment.
    pub fn atom_indices(&self) -> &[usize] {
        &self.permutation
    }

    pub fn site_atom_indices(&self, site: usize) -> &[usize] {
        let start = self.offsets[site];
        &self.permutation[start..start + self.sites[site].natoms()]
    }

    pub fn to_atomistic(&self, rigid_coords: &[f64]) -> Result<Vec<f64>, TopologyError> {
        self.check_rigid_len(rigid_coords)?;

        let positions = self.map_sites(|j| {
            let (com, p) = split_site_coords(rigid_coords, j);
            self.sites[j].atomistic_positions(&com, &p)
        });

        let mut atomistic = vec![0.0; self.atomistic_len()];
        for (j, site_positions) in positions.iter().enumerate() {
            for (&row, x) in self.site_atom_indices(j).iter().zip(site_positions) {
                atomistic[3 * row..3 * row + 3].copy_from_slice(x.as_slice());
            }
        }
        Ok(atomistic)
    }

    pub fn transform_gradient(
        &self,
        rigid_coords: &[f64],
        atomistic_gradient: &[f64],
    ) -> Result<Vec<f64>, TopologyError> {
        self.check_rigid_len(rigid_coords)?;
        if atomistic_gradient.len() != self.atomistic_len() {
            return Err(TopologyError::GradientLength {
                expected: self.atomistic_len(),
                found: atomistic_gradient.len(),
            });
        }

        let per_site = self.map_sites(|j| {
            let (_, p) = split_site_coords(rigid_coords, j);
            let gathered: Vec<Vector3<f64>> = self
                .site_atom_indices(j)
                .iter()
                .map(|&row| Vector3::from_column_slice(&atomistic_gradient[3 * row..3 * row + 3]))
                .collect();
            self.sites[j].rigid_gradient(&p, &gathered)
        });

        Ok(per_site.into_iter().flatten().collect())
    }

    fn check_rigid_len(&self, rigid_coords: &[f64]) -> Result<(), TopologyError> {
        if rigid_coords.len() != self.rigid_len() {
            return Err(TopologyError::CoordinateLength {
                expected: self.rigid_len(),
                found: rigid_coords.len(),
            });
        }
        Ok(())
    }

    fn map_sites<T, F>(&self, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Send + Sync,
    {
        match self.path {
            #[cfg(feature = "parallel")]
            TransformPath::Parallel => (0..self.sites.len()).into_par_iter().map(f).collect(),
            _ => (0..self.sites.len()).map(f).collect(),
        }
    }
}

fn split_site_coords(rigid_coords: &[f64], site: usize) -> (Vector3<f64>, Vector3<f64>) {
    let chunk = &rigid_coords[6 * site..6 * site + 6];
    (
        Vector3::from_column_slice(&chunk[..3]),
        Vector3::from_column_slice(&chunk[3..]),
    )
}
