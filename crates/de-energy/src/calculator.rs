//! Difference energy between two runs.
//!
//! For each compared point the energy density is
//! `0.5 * (du^2 + dv^2)` (kinetic) or `0.5 * (du^2 + dv^2 + kappa * dT^2)`
//! (total), where `du = U1 - U2` and so on.
//!
//! Wind components are not destaggered. Every field is cut to the common
//! overlap of all participating variables, so a staggered `U` loses its
//! last x column and a staggered `V` its last y row. The half-cell offset
//! between wind points is a known approximation of the integrated value.

use de_core::constants::KAPPA;
use de_core::{Real, closest_index};
use de_grid::{GridAccessor, vars};
use ndarray::{Array2, Array3, ArrayView2, ArrayView4, Axis, Zip, s};
use tracing::debug;

use crate::mode::{EnergyKind, IntegrationMode, VerticalBounds};
use crate::{EnergyError, EnergyResult};

/// Value computed for one time step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepValue {
    Scalar(Real),
    Field(Array2<Real>),
}

/// Fail unless both runs have exactly the same time axis.
pub fn ensure_matching_times<A, B>(first: &A, second: &B) -> EnergyResult<()>
where
    A: GridAccessor + ?Sized,
    B: GridAccessor + ?Sized,
{
    let t1 = first.time_axis();
    let t2 = second.time_axis();
    if t1 == t2 {
        return Ok(());
    }

    let detail = if t1.len() != t2.len() {
        format!("{} vs {} time steps", t1.len(), t2.len())
    } else {
        let idx = t1.iter().zip(t2).position(|(a, b)| a != b).unwrap_or(0);
        format!("step {} is {} vs {}", idx, t1[idx], t2[idx])
    };
    Err(EnergyError::TimeMismatch {
        file1: first.id().to_string(),
        file2: second.id().to_string(),
        detail,
    })
}

/// One variable from both runs.
struct FieldPair<'a> {
    first: ArrayView4<'a, Real>,
    second: ArrayView4<'a, Real>,
}

fn field_pair<'a, A, B>(first: &'a A, second: &'a B, name: &str) -> EnergyResult<FieldPair<'a>>
where
    A: GridAccessor + ?Sized,
    B: GridAccessor + ?Sized,
{
    let a = first.variable(name)?;
    let b = second.variable(name)?;
    if a.shape() != b.shape() {
        return Err(EnergyError::ShapeMismatch {
            name: name.to_string(),
            first: a.shape().to_vec(),
            second: b.shape().to_vec(),
        });
    }
    Ok(FieldPair {
        first: a,
        second: b,
    })
}

/// Common (level, y, x) extent of the given fields.
fn common_extent<'a, 'b: 'a>(
    fields: impl IntoIterator<Item = &'a ArrayView4<'b, Real>>,
) -> (usize, usize, usize) {
    fields.into_iter().fold(
        (usize::MAX, usize::MAX, usize::MAX),
        |(nz, ny, nx), f| {
            let sh = f.shape();
            (nz.min(sh[1]), ny.min(sh[2]), nx.min(sh[3]))
        },
    )
}

fn check_time(t: usize, field: &ArrayView4<'_, Real>) -> EnergyResult<()> {
    let len = field.len_of(Axis(0));
    if t >= len {
        return Err(EnergyError::TimeIndexOutOfRange { index: t, len });
    }
    Ok(())
}

fn add_squared_diff(
    acc: &mut Array2<Real>,
    a: ArrayView2<'_, Real>,
    b: ArrayView2<'_, Real>,
    weight: Real,
) {
    Zip::from(acc).and(a).and(b).for_each(|acc, &a, &b| {
        let d = a - b;
        *acc += weight * d * d;
    });
}

fn squared_diff_3d(
    pair: &FieldPair<'_>,
    t: usize,
    (nz, ny, nx): (usize, usize, usize),
) -> Array3<Real> {
    let a = pair.first.slice(s![t, ..nz, ..ny, ..nx]);
    let b = pair.second.slice(s![t, ..nz, ..ny, ..nx]);
    let mut out = Array3::zeros((nz, ny, nx));
    Zip::from(&mut out).and(a).and(b).for_each(|o, &a, &b| {
        let d = a - b;
        *o = d * d;
    });
    out
}

/// Computes difference kinetic or total energy between two runs.
#[derive(Debug, Clone, Copy)]
pub struct DiffEnergyCalculator {
    kappa: Real,
}

impl Default for DiffEnergyCalculator {
    fn default() -> Self {
        Self { kappa: KAPPA }
    }
}

impl DiffEnergyCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the temperature weight of total energy.
    pub fn with_kappa(kappa: Real) -> Self {
        Self { kappa }
    }

    /// Whole-domain sum for each time index; output aligns with `time_indices`.
    pub fn compute_xyz<A, B>(
        &self,
        first: &A,
        second: &B,
        time_indices: &[usize],
        energy: EnergyKind,
    ) -> EnergyResult<Vec<Real>>
    where
        A: GridAccessor + ?Sized,
        B: GridAccessor + ?Sized,
    {
        let u = field_pair(first, second, vars::U)?;
        let v = field_pair(first, second, vars::V)?;
        let temp = match energy {
            EnergyKind::Kinetic => None,
            EnergyKind::Total => Some(field_pair(first, second, vars::T)?),
        };

        let mut views = vec![&u.first, &v.first];
        if let Some(t) = &temp {
            views.push(&t.first);
        }
        let (nz, ny, nx) = common_extent(views);

        let mut series = Vec::with_capacity(time_indices.len());
        for (n, &t) in time_indices.iter().enumerate() {
            check_time(t, &u.first)?;
            check_time(t, &v.first)?;
            if let Some(temp) = &temp {
                check_time(t, &temp.first)?;
            }

            // Walk x explicitly, sum each (level, y) plane in one pass.
            let mut total = 0.0;
            let mut plane = Array2::<Real>::zeros((nz, ny));
            for i in 0..nx {
                plane.fill(0.0);
                add_squared_diff(
                    &mut plane,
                    u.first.slice(s![t, ..nz, ..ny, i]),
                    u.second.slice(s![t, ..nz, ..ny, i]),
                    1.0,
                );
                add_squared_diff(
                    &mut plane,
                    v.first.slice(s![t, ..nz, ..ny, i]),
                    v.second.slice(s![t, ..nz, ..ny, i]),
                    1.0,
                );
                if let Some(temp) = &temp {
                    add_squared_diff(
                        &mut plane,
                        temp.first.slice(s![t, ..nz, ..ny, i]),
                        temp.second.slice(s![t, ..nz, ..ny, i]),
                        self.kappa,
                    );
                }
                total += 0.5 * plane.sum();
            }

            debug!(
                step = n,
                steps = time_indices.len(),
                time_index = t,
                value = total,
                "{} over domain",
                energy.abbreviation()
            );
            series.push(total);
        }
        Ok(series)
    }

    /// Vertical sum at every grid point between the pressure bounds.
    ///
    /// The pressure column (`P + PB`) comes from the first run. The lower
    /// bound starts at the level closest to it; the upper bound ends at
    /// the level closest to it, inclusive. A missing bound leaves that end
    /// of the column untrimmed. An inverted range sums to zero.
    pub fn compute_z<A, B>(
        &self,
        first: &A,
        second: &B,
        t: usize,
        energy: EnergyKind,
        bounds: VerticalBounds,
    ) -> EnergyResult<Array2<Real>>
    where
        A: GridAccessor + ?Sized,
        B: GridAccessor + ?Sized,
    {
        let u = field_pair(first, second, vars::U)?;
        let v = field_pair(first, second, vars::V)?;
        let temp = match energy {
            EnergyKind::Kinetic => None,
            EnergyKind::Total => Some(field_pair(first, second, vars::T)?),
        };
        let pressure_fields = if bounds.is_unbounded() {
            None
        } else {
            Some((first.variable(vars::P)?, first.variable(vars::PB)?))
        };

        let mut views = vec![&u.first, &v.first];
        if let Some(temp) = &temp {
            views.push(&temp.first);
        }
        if let Some((p, pb)) = &pressure_fields {
            views.push(p);
            views.push(pb);
        }
        let extent = common_extent(views);
        let (nz, ny, nx) = extent;
        check_time(t, &u.first)?;
        check_time(t, &v.first)?;
        if let Some(temp) = &temp {
            check_time(t, &temp.first)?;
        }

        let mut energy_density = squared_diff_3d(&u, t, extent);
        energy_density += &squared_diff_3d(&v, t, extent);
        if let Some(temp) = &temp {
            energy_density.scaled_add(self.kappa, &squared_diff_3d(temp, t, extent));
        }

        let pressure = match &pressure_fields {
            Some((p, pb)) => {
                check_time(t, p)?;
                check_time(t, pb)?;
                let p = p.slice(s![t, ..nz, ..ny, ..nx]);
                let pb = pb.slice(s![t, ..nz, ..ny, ..nx]);
                Some(&p + &pb)
            }
            None => None,
        };
        let lower_pa = bounds.lower_pa();
        let upper_pa = bounds.upper_pa();

        let mut out = Array2::<Real>::zeros((ny, nx));
        for j in 0..ny {
            for i in 0..nx {
                let (low, high) = match &pressure {
                    Some(p) => {
                        let column = p.slice(s![.., j, i]);
                        let find = |target: Real| {
                            closest_index(column.iter(), target)
                                .ok_or(EnergyError::NoValidPressure { y: j, x: i })
                        };
                        let low = match lower_pa {
                            Some(target) => find(target)?,
                            None => 0,
                        };
                        let high = match upper_pa {
                            Some(target) => find(target)? + 1,
                            None => nz,
                        };
                        (low, high.min(nz))
                    }
                    None => (0, nz),
                };

                if low < high {
                    out[[j, i]] = 0.5 * energy_density.slice(s![low..high, j, i]).sum();
                }
            }
        }

        debug!(
            time_index = t,
            lower_hpa = ?bounds.lower_hpa,
            upper_hpa = ?bounds.upper_hpa,
            "{} column field computed",
            energy.abbreviation()
        );
        Ok(out)
    }

    /// Compute one time step in the requested mode.
    pub fn compute<A, B>(
        &self,
        mode: IntegrationMode,
        first: &A,
        second: &B,
        t: usize,
        energy: EnergyKind,
        bounds: VerticalBounds,
    ) -> EnergyResult<StepValue>
    where
        A: GridAccessor + ?Sized,
        B: GridAccessor + ?Sized,
    {
        match mode {
            IntegrationMode::SumXyz => {
                let series = self.compute_xyz(first, second, &[t], energy)?;
                Ok(StepValue::Scalar(series[0]))
            }
            IntegrationMode::SumZ => Ok(StepValue::Field(
                self.compute_z(first, second, t, energy, bounds)?,
            )),
        }
    }
}
