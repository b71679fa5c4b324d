//! Error growth aggregation over loaded results.

use std::path::Path;

use de_core::{PairId, Real, Timestamp};
use de_results::{EnergyValues, ResultMapping, ResultRecord};
use ndarray::Array2;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};

/// Key of the single group produced when no sensitivity keys are given.
pub const ALL_MEMBERS: &str = "allmembers";

/// One pair's series inside a group.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberSeries {
    pub pair: PairId,
    pub label: String,
    pub values: Vec<Real>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupGrowth {
    pub key: String,
    pub members: Vec<MemberSeries>,
    pub average: Vec<Real>,
}

/// Error growth of a whole mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthReport {
    pub times: Vec<Timestamp>,
    /// True when the groups come from sensitivity keys.
    pub grouped: bool,
    pub groups: Vec<GroupGrowth>,
    /// Average of all pairs (ungrouped) or of the group averages (grouped).
    pub overall: Vec<Real>,
}

/// Collapse each stored value to one number: scalars pass through,
/// fields are summed over all elements.
pub fn reduce_series(values: &EnergyValues) -> Vec<Real> {
    match values {
        EnergyValues::Scalars(v) => v.clone(),
        EnergyValues::Fields(fields) => fields.iter().map(|f| f.sum()).collect(),
    }
}

/// Elementwise mean of a stack of equal-length series.
pub fn average<S: AsRef<[Real]>>(series: &[S]) -> AppResult<Vec<Real>> {
    let first = series
        .first()
        .ok_or_else(|| AppError::InvalidInput("Cannot average an empty stack".to_string()))?
        .as_ref();
    let len = first.len();
    if let Some(bad) = series.iter().find(|s| s.as_ref().len() != len) {
        return Err(AppError::InvalidInput(format!(
            "Series lengths differ: {} vs {}",
            len,
            bad.as_ref().len()
        )));
    }

    let n = series.len() as Real;
    let mut out = vec![0.0; len];
    for s in series {
        for (acc, v) in out.iter_mut().zip(s.as_ref()) {
            *acc += v;
        }
    }
    for acc in &mut out {
        *acc /= n;
    }
    Ok(out)
}

/// Name of the directory holding `file`, or the file itself when it has none.
fn member_label(file: &str) -> String {
    Path::new(file)
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string())
}

/// The file of a pair that does not carry `key`. `None` unless exactly one does.
fn other_file<'a>(record: &'a ResultRecord, key: &str) -> Option<&'a str> {
    match (record.file1.contains(key), record.file2.contains(key)) {
        (true, false) => Some(record.file2.as_str()),
        (false, true) => Some(record.file1.as_str()),
        _ => None,
    }
}

/// Group and average the error growth of every pair.
///
/// With sensitivity keys, a pair belongs to a key's group when exactly one
/// of its files contains the key; it is labelled by the directory of the
/// other file. Groups without members are skipped. Without keys, every
/// pair forms one group.
pub fn aggregate(mapping: &ResultMapping, sensitivity: Option<&[String]>) -> AppResult<GrowthReport> {
    let times = mapping
        .times()
        .ok_or_else(|| AppError::InvalidInput("Result mapping holds no pairs".to_string()))?
        .to_vec();

    let keys = sensitivity.filter(|keys| !keys.is_empty());
    let Some(keys) = keys else {
        let members: Vec<MemberSeries> = mapping
            .iter()
            .map(|(pair, record)| MemberSeries {
                pair: *pair,
                label: format!(
                    "{} / {}",
                    member_label(&record.file1),
                    member_label(&record.file2)
                ),
                values: reduce_series(&record.values),
            })
            .collect();
        let overall = average(&members.iter().map(|m| &m.values[..]).collect::<Vec<_>>())?;
        return Ok(GrowthReport {
            times,
            grouped: false,
            groups: vec![GroupGrowth {
                key: ALL_MEMBERS.to_string(),
                members,
                average: overall.clone(),
            }],
            overall,
        });
    };

    let mut groups = Vec::new();
    for key in keys {
        let members: Vec<MemberSeries> = mapping
            .iter()
            .filter_map(|(pair, record)| {
                other_file(record, key).map(|other| MemberSeries {
                    pair: *pair,
                    label: member_label(other),
                    values: reduce_series(&record.values),
                })
            })
            .collect();

        if members.is_empty() {
            warn!(key = %key, "No pair matches sensitivity key, skipping group");
            continue;
        }

        let group_average = average(&members.iter().map(|m| &m.values[..]).collect::<Vec<_>>())?;
        debug!(key = %key, members = members.len(), "Averaged sensitivity group");
        groups.push(GroupGrowth {
            key: key.clone(),
            members,
            average: group_average,
        });
    }

    if groups.is_empty() {
        return Err(AppError::InvalidInput(
            "No pair matches any sensitivity key".to_string(),
        ));
    }

    let overall = average(&groups.iter().map(|g| &g.average[..]).collect::<Vec<_>>())?;
    Ok(GrowthReport {
        times,
        grouped: true,
        groups,
        overall,
    })
}

/// Mean across pairs of the column field stored for `time`.
pub fn field_average_at(mapping: &ResultMapping, time: &Timestamp) -> AppResult<Array2<Real>> {
    let mut sum: Option<Array2<Real>> = None;
    for (pair, record) in mapping.iter() {
        let field = match &record.values {
            EnergyValues::Fields(_) => record.field_at(time).ok_or_else(|| {
                AppError::InvalidInput(format!("Pair {} has no field at {}", pair, time))
            })?,
            EnergyValues::Scalars(_) => {
                return Err(AppError::InvalidInput(format!(
                    "Pair {} holds domain sums, not column fields",
                    pair
                )));
            }
        };

        sum = Some(match sum.take() {
            None => field.clone(),
            Some(acc) if acc.dim() == field.dim() => acc + field,
            Some(acc) => {
                return Err(AppError::InvalidInput(format!(
                    "Field shape {:?} of pair {} differs from {:?}",
                    field.dim(),
                    pair,
                    acc.dim()
                )));
            }
        });
    }

    let sum = sum.ok_or_else(|| AppError::InvalidInput("Result mapping holds no pairs".to_string()))?;
    Ok(sum / mapping.len() as Real)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn average_of_copies_is_identity(
            series in prop::collection::vec(-1.0e6_f64..1.0e6_f64, 1..16),
            copies in 1usize..6,
        ) {
            let stack = vec![series.clone(); copies];
            let avg = average(&stack).unwrap();
            for (a, s) in avg.iter().zip(&series) {
                prop_assert!((a - s).abs() <= 1e-9 * s.abs().max(1.0));
            }
        }
    }
}
