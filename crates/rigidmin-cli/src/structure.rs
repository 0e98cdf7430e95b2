use crate::error::{CliError, Result};
use rand::Rng;
use std::f64::consts::PI;
use std::io::Write;

/// Smallest allowed distance between the centers of two molecules in a random cluster.
/// Two OTP molecules this far apart cannot bring any pair of beads closer than about 0.87σ.
pub const MIN_COM_SEPARATION: f64 = 2.2;

const MAX_PLACEMENT_ATTEMPTS: usize = 10_000;

/// Draws a random starting configuration of `nrigid` molecules in rigid-body coordinates.
///
/// Centers are placed uniformly in a cube whose volume grows with `nrigid`, rejecting any
/// center closer than [`MIN_COM_SEPARATION`] to one already placed. Orientations are uniform
/// random axes with angles in `[0, π)`.
pub fn random_cluster<R: Rng + ?Sized>(nrigid: usize, rng: &mut R) -> Result<Vec<f64>> {
    let half_box = 2.0 * (nrigid as f64).cbrt();
    let mut centers: Vec<[f64; 3]> = Vec::with_capacity(nrigid);

    for site in 0..nrigid {
        let center = (0..MAX_PLACEMENT_ATTEMPTS)
            .map(|_| {
                [
                    rng.gen_range(-half_box..half_box),
                    rng.gen_range(-half_box..half_box),
                    rng.gen_range(-half_box..half_box),
                ]
            })
            .find(|candidate| {
                centers
                    .iter()
                    .all(|c| distance(c, candidate) >= MIN_COM_SEPARATION)
            })
            .ok_or_else(|| {
                CliError::Argument(format!(
                    "Could not place molecule {} of {} without overlaps.",
                    site + 1,
                    nrigid
                ))
            })?;
        centers.push(center);
    }

    let mut coords = Vec::with_capacity(6 * nrigid);
    coords.extend(centers.iter().flatten());
    for _ in 0..nrigid {
        let axis = random_unit_vector(rng);
        let angle = rng.gen_range(0.0..PI);
        coords.extend(axis.iter().map(|a| a * angle));
    }
    Ok(coords)
}

fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> [f64; 3] {
    loop {
        let v = [
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        ];
        let n2: f64 = v.iter().map(|x| x * x).sum();
        if n2 > 1e-6 && n2 <= 1.0 {
            let n = n2.sqrt();
            return [v[0] / n, v[1] / n, v[2] / n];
        }
    }
}

fn distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Writes flat atomistic coordinates as an XYZ frame, labelling every atom `element`.
pub fn write_xyz<W: Write>(
    writer: &mut W,
    atomistic: &[f64],
    element: &str,
    comment: &str,
) -> std::io::Result<()> {
    writeln!(writer, "{}", atomistic.len() / 3)?;
    writeln!(writer, "{}", comment)?;
    for atom in atomistic.chunks_exact(3) {
        writeln!(
            writer,
            "{:<2} {:>14.8} {:>14.8} {:>14.8}",
            element, atom[0], atom[1], atom[2]
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn random_cluster_has_six_coordinates_per_molecule() {
        let coords = random_cluster(7, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(coords.len(), 42);
        assert!(coords.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn random_cluster_keeps_centers_apart() {
        let n = 12;
        let coords = random_cluster(n, &mut StdRng::seed_from_u64(5)).unwrap();
        let centers: Vec<[f64; 3]> = coords[..3 * n]
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        for i in 0..n {
            for j in i + 1..n {
                assert!(distance(&centers[i], &centers[j]) >= MIN_COM_SEPARATION);
            }
        }
    }

    #[test]
    fn rotation_vectors_have_angles_below_pi() {
        let n = 20;
        let coords = random_cluster(n, &mut StdRng::seed_from_u64(9)).unwrap();
        for p in coords[3 * n..].chunks_exact(3) {
            let angle = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            assert!(angle < PI + 1e-12);
        }
    }

    #[test]
    fn same_seed_gives_same_cluster() {
        let a = random_cluster(4, &mut StdRng::seed_from_u64(123)).unwrap();
        let b = random_cluster(4, &mut StdRng::seed_from_u64(123)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn write_xyz_emits_header_and_one_line_per_atom() {
        let mut out = Vec::new();
        write_xyz(&mut out, &[0.0, 1.0, 2.0, -1.5, 0.25, 3.0], "LJ", "E = -1.0").unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "2");
        assert_eq!(lines[1], "E = -1.0");
        assert!(lines[3].starts_with("LJ"));
        let fields: Vec<f64> = lines[3]
            .split_whitespace()
            .skip(1)
            .map(|f| f.parse().unwrap())
            .collect();
        assert_eq!(fields, vec![-1.5, 0.25, 3.0]);
    }
}
